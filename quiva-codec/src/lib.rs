//! # quiva-codec
//!
//! The quiva codec: statistics collection, canonical Huffman coding with
//! an escape-to-literal mechanism, run-length secondary encoding of the
//! deletion-QV and substitution-QV streams, a 2-bit DNA packer for the
//! deletion-tag stream, and the binary framing that ties them together.
//!
//! [`encode_file`] and [`decode_file`] are the whole-file entry points;
//! everything else is exposed for callers (notably `quiva-cli`) that want
//! finer control, e.g. streaming records one at a time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coding;
pub mod header;
pub mod huffman;
pub mod record;
pub mod runlen;
pub mod scan;
pub mod scheme;
pub mod state;
pub mod twobit;

pub use coding::QVcoding;
pub use record::Record;
pub use state::CodecState;

use quiva_core::error::Result;
use std::io::{BufRead, Write};

/// Compress a whole quiva text file into its binary format.
///
/// Buffers the parsed records in memory (one physical read of `input`)
/// so the scanner's first pass and the per-record encode's second pass
/// can both run over the same data without re-reading the source.
pub fn encode_file<R: BufRead, W: Write>(mut input: R, mut output: W, lossy: bool) -> Result<()> {
    let mut records = Vec::new();
    while let Some(rec) = record::read_text_record(&mut input)? {
        records.push(rec);
    }

    let mut scanner = scan::Scanner::new();
    for rec in &records {
        scanner.observe(rec);
    }
    let stats = scanner.finish();
    let schemes = scheme::build_schemes(&stats, lossy);

    let prefix = records
        .first()
        .map(|r| r.header.prefix.clone())
        .unwrap_or_default();
    let coding = coding::QVcoding::new(schemes, stats.del_char, stats.sub_char, prefix);

    coding::write_coding(&mut output, &coding)?;

    let mut state = state::CodecState::new();
    let mut last_well = 0u32;
    for rec in &records {
        state.reserve_for_record_len(rec.rlen());
        record::encode_record(&mut output, rec, &coding, &mut last_well, lossy, &mut state)?;
    }
    Ok(())
}

/// Decompress a whole binary file back into quiva text.
pub fn decode_file<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<()> {
    let coding = coding::read_coding(&mut input)?;
    let mut state = state::CodecState::new();
    let mut last_well = 0u32;

    loop {
        if input.fill_buf()?.is_empty() {
            break;
        }
        let rec = record::decode_record(&mut input, &coding, '@', &mut last_well, &mut state)?;
        record::write_text_record(&mut output, &rec)?;
    }
    Ok(())
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::coding::QVcoding;
    pub use crate::record::Record;
    pub use crate::state::CodecState;
    pub use crate::{decode_file, encode_file};
}
