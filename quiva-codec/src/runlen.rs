//! Run-length secondary encoding for the two low-entropy streams
//! (deletion-QV, substitution-QV).
//!
//! A vector dominated by a single "run character" `c` is rewritten as the
//! alternating sequence `run0, sym0, run1, sym1, ...`. Runs are Huffman
//! coded against a table built from a histogram over the whole `[0,255]`
//! domain (counts `>= 255` collapse to symbol 255, which always shares the
//! generic Huffman escape code — see `huffman.rs` — so the encoder need
//! only ever call [`HScheme::encode_value`]/[`HScheme::decode_value`] with
//! `literal_bits = 16` to get the true run length back out). Non-run
//! symbols are coded against a separate table with `literal_bits = 8`.

use crate::huffman::HScheme;
use quiva_core::bitio::{BitReader, BitWriter};
use quiva_core::error::{QvError, Result};
use std::io::{Read, Write};

/// Run-length literal width: run tables recover the true count (up to
/// 65535) as a 16-bit literal, wider than the 8-bit default used for plain
/// byte streams.
pub const RUN_LITERAL_BITS: u8 = 16;
/// Literal width used for the alternating non-run symbol stream.
pub const SYM_LITERAL_BITS: u8 = 8;

/// Walk `data`, accumulating a histogram of run lengths of `run_char` (runs
/// `>= 255` bucket into bin 255) into `run_hist`, and a histogram of the
/// bytes that interrupt each run into `sym_hist`.
pub fn accumulate_histograms(
    data: &[u8],
    run_char: u8,
    run_hist: &mut [u32; 256],
    sym_hist: &mut [u32; 256],
) {
    let mut i = 0;
    let n = data.len();
    while i < n {
        let mut count: u32 = 0;
        while i < n && data[i] == run_char {
            count += 1;
            i += 1;
        }
        run_hist[count.min(255) as usize] += 1;
        if i < n {
            sym_hist[data[i] as usize] += 1;
            i += 1;
        }
    }
}

/// Run-encode `data` (a deletion-QV or substitution-QV vector) into the
/// current record's bit stream.
pub fn encode<W: Write>(
    writer: &mut BitWriter<W>,
    data: &[u8],
    run_char: u8,
    run_scheme: &HScheme,
    sym_scheme: &HScheme,
) -> Result<()> {
    let mut i = 0;
    let n = data.len();
    while i < n {
        let mut count: u32 = 0;
        while i < n && data[i] == run_char {
            count += 1;
            i += 1;
        }
        run_scheme.encode_value(writer, count, RUN_LITERAL_BITS)?;
        if i < n {
            sym_scheme.encode_value(writer, data[i] as u32, SYM_LITERAL_BITS)?;
            i += 1;
        }
    }
    Ok(())
}

/// Decode a run-length-coded vector of length `rlen`, appending to `out`
/// (which is cleared first).
pub fn decode<R: Read>(
    reader: &mut BitReader<R>,
    rlen: usize,
    run_char: u8,
    run_scheme: &HScheme,
    sym_scheme: &HScheme,
    out: &mut Vec<u8>,
) -> Result<()> {
    out.clear();
    while out.len() < rlen {
        let count = run_scheme.decode_value(reader, RUN_LITERAL_BITS)? as usize;
        if out.len() + count > rlen {
            return Err(QvError::corrupted_table(
                "run length decoded beyond record length",
            ));
        }
        out.resize(out.len() + count, run_char);
        if out.len() == rlen {
            break;
        }
        let sym = sym_scheme.decode_value(reader, SYM_LITERAL_BITS)? as u8;
        out.push(sym);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::HScheme;
    use std::io::Cursor;

    #[test]
    fn test_roundtrip_basic_runs() {
        let data = b"\x05\x05\x05\x05\x10\x05\x05\x20\x05".to_vec();
        let run_char = 5u8;

        let mut run_hist = [0u32; 256];
        let mut sym_hist = [0u32; 256];
        accumulate_histograms(&data, run_char, &mut run_hist, &mut sym_hist);

        let run_scheme = HScheme::build(&run_hist, None);
        let sym_scheme = HScheme::build(&sym_hist, None);

        let mut out = Vec::new();
        {
            let mut w = BitWriter::new(&mut out);
            encode(&mut w, &data, run_char, &run_scheme, &sym_scheme).unwrap();
            w.flush().unwrap();
        }

        let mut r = BitReader::new(Cursor::new(&out), false);
        let mut decoded = Vec::new();
        decode(
            &mut r,
            data.len(),
            run_char,
            &run_scheme,
            &sym_scheme,
            &mut decoded,
        )
        .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_roundtrip_long_run_escape() {
        let mut data = vec![9u8; 400];
        data.push(200);
        data.extend(vec![9u8; 10]);

        let run_char = 9u8;
        let mut run_hist = [0u32; 256];
        let mut sym_hist = [0u32; 256];
        accumulate_histograms(&data, run_char, &mut run_hist, &mut sym_hist);

        let run_scheme = HScheme::build(&run_hist, None);
        let sym_scheme = HScheme::build(&sym_hist, None);

        let mut out = Vec::new();
        {
            let mut w = BitWriter::new(&mut out);
            encode(&mut w, &data, run_char, &run_scheme, &sym_scheme).unwrap();
            w.flush().unwrap();
        }

        let mut r = BitReader::new(Cursor::new(&out), false);
        let mut decoded = Vec::new();
        decode(
            &mut r,
            data.len(),
            run_char,
            &run_scheme,
            &sym_scheme,
            &mut decoded,
        )
        .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_all_run_char_no_trailing_symbol() {
        let data = vec![3u8; 7];
        let run_char = 3u8;
        let mut run_hist = [0u32; 256];
        let mut sym_hist = [0u32; 256];
        accumulate_histograms(&data, run_char, &mut run_hist, &mut sym_hist);

        let run_scheme = HScheme::build(&run_hist, None);
        let sym_scheme = HScheme::build(&sym_hist, None);

        let mut out = Vec::new();
        {
            let mut w = BitWriter::new(&mut out);
            encode(&mut w, &data, run_char, &run_scheme, &sym_scheme).unwrap();
            w.flush().unwrap();
        }
        let mut r = BitReader::new(Cursor::new(&out), false);
        let mut decoded = Vec::new();
        decode(
            &mut r,
            data.len(),
            run_char,
            &run_scheme,
            &sym_scheme,
            &mut decoded,
        )
        .unwrap();
        assert_eq!(decoded, data);
    }
}
