//! The quiva record: header plus five parallel per-base vectors, and its
//! text/binary (de)serialization.

use crate::coding::QVcoding;
use crate::header::{self, ParsedHeader};
use crate::huffman::HScheme;
use crate::runlen;
use crate::scheme::{bucket_pair, bucket_quad};
use crate::state::CodecState;
use crate::twobit;
use quiva_core::bitio::{BitReader, BitWriter};
use quiva_core::error::{QvError, Result};
use std::io::{BufRead, Read, Write};

/// One quiva record: a header plus the five equal-length per-base vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Parsed header line.
    pub header: ParsedHeader,
    /// Deletion-QV bytes, one per base.
    pub del_qv: Vec<u8>,
    /// Deletion-tag bytes (A/C/G/T/N), one per base.
    pub del_tag: Vec<u8>,
    /// Insertion-QV bytes.
    pub ins_qv: Vec<u8>,
    /// Merge-QV bytes.
    pub mrg_qv: Vec<u8>,
    /// Substitution-QV bytes.
    pub sub_qv: Vec<u8>,
}

impl Record {
    /// Record length: the common length of the five vectors.
    pub fn rlen(&self) -> usize {
        self.del_qv.len()
    }
}

/// Read one six-line text record. Returns `Ok(None)` at a clean EOF (no
/// more header lines), or an error on a truncated/malformed record.
///
/// The header line is read byte-wise and interpreted as UTF-8 (it is
/// always plain ASCII by construction); the five QV/tag lines are read
/// byte-wise and kept as raw bytes without any UTF-8 assumption, since
/// QV values range over the full `0..=255` byte domain.
pub fn read_text_record<R: BufRead>(reader: &mut R) -> Result<Option<Record>> {
    let mut header_buf = Vec::new();
    let n = reader.read_until(b'\n', &mut header_buf)?;
    if n == 0 {
        return Ok(None);
    }
    let header_line = std::str::from_utf8(&header_buf)
        .map_err(|_| QvError::malformed_header("<non-UTF-8 header line>", "invalid UTF-8"))?;
    let header = header::parse_header_line(header_line)?;
    let expected = (header.end - header.begin) as usize;

    let del_qv = read_stream_line(reader, "deletion-QV", expected)?;
    let del_tag = read_stream_line(reader, "deletion-tag", expected)?;
    let ins_qv = read_stream_line(reader, "insertion-QV", expected)?;
    let mrg_qv = read_stream_line(reader, "merge-QV", expected)?;
    let sub_qv = read_stream_line(reader, "substitution-QV", expected)?;

    Ok(Some(Record {
        header,
        del_qv,
        del_tag,
        ins_qv,
        mrg_qv,
        sub_qv,
    }))
}

fn read_stream_line<R: BufRead>(
    reader: &mut R,
    stream: &'static str,
    expected: usize,
) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line)?;
    if n == 0 {
        return Err(QvError::unexpected_eof(format!(
            "expected {stream} line"
        )));
    }
    while line.last() == Some(&b'\n') || line.last() == Some(&b'\r') {
        line.pop();
    }
    if line.len() != expected {
        return Err(QvError::line_length_mismatch(stream, expected, line.len()));
    }
    Ok(line)
}

/// Write one record back out as six text lines.
pub fn write_text_record<W: Write>(writer: &mut W, record: &Record) -> Result<()> {
    writer.write_all(header::format_header_line(&record.header).as_bytes())?;
    write_line(writer, &record.del_qv)?;
    write_line(writer, &record.del_tag)?;
    write_line(writer, &record.ins_qv)?;
    write_line(writer, &record.mrg_qv)?;
    write_line(writer, &record.sub_qv)?;
    Ok(())
}

fn write_line<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Encode one record's binary payload. The header's `well/begin/end/qv`
/// fields are written first, then the five vectors' Huffman/RLE payloads
/// inside a single bit stream.
pub fn encode_record<W: Write>(
    writer: &mut W,
    record: &Record,
    coding: &QVcoding,
    last_well: &mut u32,
    lossy: bool,
    state: &mut CodecState,
) -> Result<()> {
    header::encode_record_fields(writer, &record.header, last_well)?;

    let mut bw = BitWriter::new(writer);

    match coding.del_char {
        Some(dc) => {
            runlen::encode(
                &mut bw,
                &record.del_qv,
                dc,
                coding.del_run_scheme.as_ref().expect("del_run_scheme present when del_char is set"),
                &coding.del_scheme,
            )?;
            state.compacted_tag.clear();
            for (qv, tag) in record.del_qv.iter().zip(record.del_tag.iter()) {
                if *qv != dc {
                    state.compacted_tag.push(*tag);
                }
            }
            let packed = twobit::pack(&state.compacted_tag);
            write_packed_tag(&mut bw, &packed)?;
        }
        None => {
            encode_plain(&mut bw, &record.del_qv, &coding.del_scheme)?;
            let packed = twobit::pack(&record.del_tag);
            write_packed_tag(&mut bw, &packed)?;
        }
    }

    state.ins_qv.clear();
    state.ins_qv.extend_from_slice(&record.ins_qv);
    state.mrg_qv.clear();
    state.mrg_qv.extend_from_slice(&record.mrg_qv);
    if lossy {
        for b in state.ins_qv.iter_mut() {
            *b = bucket_pair(*b);
        }
        for b in state.mrg_qv.iter_mut() {
            *b = bucket_quad(*b);
        }
    }
    encode_plain(&mut bw, &state.ins_qv, &coding.ins_scheme)?;
    encode_plain(&mut bw, &state.mrg_qv, &coding.mrg_scheme)?;

    match coding.sub_char {
        Some(sc) => runlen::encode(
            &mut bw,
            &record.sub_qv,
            sc,
            coding.sub_run_scheme.as_ref().expect("sub_run_scheme present when sub_char is set"),
            &coding.sub_scheme,
        )?,
        None => encode_plain(&mut bw, &record.sub_qv, &coding.sub_scheme)?,
    }

    bw.flush()?;
    Ok(())
}

/// Decode one record's binary payload, mirroring [`encode_record`].
/// `marker`/`prefix` come from the file-level coding; `rlen` is recovered
/// from the header fields read here.
pub fn decode_record<R: Read>(
    reader: &mut R,
    coding: &QVcoding,
    marker: char,
    last_well: &mut u32,
    state: &mut CodecState,
) -> Result<Record> {
    let header = header::decode_record_fields(reader, coding.flip, marker, &coding.prefix, last_well)?;
    let rlen = (header.end - header.begin) as usize;

    let mut br = BitReader::new(reader, coding.flip);

    let (del_qv, del_tag) = match coding.del_char {
        Some(dc) => {
            let run_scheme = coding
                .del_run_scheme
                .as_ref()
                .expect("del_run_scheme present when del_char is set");
            runlen::decode(&mut br, rlen, dc, run_scheme, &coding.del_scheme, &mut state.del_qv)?;
            let clen = state.del_qv.iter().filter(|&&b| b != dc).count();
            let packed = read_packed_tag(&mut br, clen)?;
            let compacted = twobit::unpack(&packed, clen);
            let mut tag = Vec::with_capacity(rlen);
            let mut ci = 0;
            for &qv in state.del_qv.iter() {
                if qv == dc {
                    tag.push(b'N');
                } else {
                    tag.push(compacted[ci]);
                    ci += 1;
                }
            }
            (state.del_qv.clone(), tag)
        }
        None => {
            let del_qv = decode_plain(&mut br, rlen, &coding.del_scheme)?;
            let packed = read_packed_tag(&mut br, rlen)?;
            let tag = twobit::unpack(&packed, rlen);
            (del_qv, tag)
        }
    };

    let ins_qv = decode_plain(&mut br, rlen, &coding.ins_scheme)?;
    let mrg_qv = decode_plain(&mut br, rlen, &coding.mrg_scheme)?;

    let sub_qv = match coding.sub_char {
        Some(sc) => {
            let run_scheme = coding
                .sub_run_scheme
                .as_ref()
                .expect("sub_run_scheme present when sub_char is set");
            let mut out = Vec::new();
            runlen::decode(&mut br, rlen, sc, run_scheme, &coding.sub_scheme, &mut out)?;
            out
        }
        None => decode_plain(&mut br, rlen, &coding.sub_scheme)?,
    };

    // A well-formed record's final lookahead hits true EOF at most once (one
    // synthetic all-zero word); anything more means the payload was cut off
    // before all five streams were fully decoded, and everything decoded
    // past that point is fabricated from zero bits rather than real data.
    if br.synthetic_bits() > 32 {
        return Err(QvError::unexpected_eof(format!(
            "record payload for well {}",
            header.well
        )));
    }

    Ok(Record {
        header,
        del_qv,
        del_tag,
        ins_qv,
        mrg_qv,
        sub_qv,
    })
}

fn encode_plain<W: Write>(bw: &mut BitWriter<W>, data: &[u8], scheme: &HScheme) -> Result<()> {
    for &b in data {
        scheme.encode_value(bw, b as u32, 8)?;
    }
    Ok(())
}

fn decode_plain<R: Read>(br: &mut BitReader<R>, rlen: usize, scheme: &HScheme) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(rlen);
    for _ in 0..rlen {
        out.push(scheme.decode_value(br, 8)? as u8);
    }
    Ok(out)
}

fn write_packed_tag<W: Write>(bw: &mut BitWriter<W>, packed: &[u8]) -> Result<()> {
    for &byte in packed {
        bw.emit(byte as u32, 8)?;
    }
    Ok(())
}

fn read_packed_tag<R: Read>(br: &mut BitReader<R>, clen: usize) -> Result<Vec<u8>> {
    let nbytes = clen.div_ceil(4);
    let mut out = Vec::with_capacity(nbytes);
    for _ in 0..nbytes {
        out.push(br.read(8)? as u8);
    }
    Ok(out)
}
