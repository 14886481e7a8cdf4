//! Per-record header framing: the text form's
//! `[@>]<prefix>/<well>/<begin>_<end> RQ=0.<qv>` line, and the compressed
//! form's well-delta byte run plus plain 16-bit `begin`/`end`/`qv` fields.
//!
//! The read-name prefix is shared by every record in a file and is stored
//! exactly once, at file start; only the numeric fields vary record to
//! record.

use quiva_core::bitio::{read_u16_ne, read_u32_ne, write_u16_ne, write_u32_ne};
use quiva_core::error::{QvError, Result};
use std::io::{Read, Write};

/// One record's parsed text header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    /// `@` for a quiva record, `>` for the DNA companion stream.
    pub marker: char,
    /// The read-name prefix, shared across the whole file.
    pub prefix: String,
    /// PacBio well (hole) number.
    pub well: u32,
    /// Subread start offset.
    pub begin: u16,
    /// Subread end offset.
    pub end: u16,
    /// Read quality, as the two-digit fraction after `RQ=0.`.
    pub qv: u16,
}

/// Parse one text header line of the form
/// `[@>]<prefix>/<well>/<begin>_<end> RQ=0.<qv>`.
pub fn parse_header_line(line: &str) -> Result<ParsedHeader> {
    let line = line.trim_end_matches(['\n', '\r']);
    let mut chars = line.chars();
    let marker = chars
        .next()
        .ok_or_else(|| QvError::malformed_header(line, "empty header line"))?;
    if marker != '@' && marker != '>' {
        return Err(QvError::malformed_header(
            line,
            "header must start with '@' or '>'",
        ));
    }
    let rest = chars.as_str();

    let slash1 = rest
        .find('/')
        .ok_or_else(|| QvError::malformed_header(line, "missing '/' after prefix"))?;
    let prefix = rest[..slash1].to_string();
    let after_prefix = &rest[slash1 + 1..];

    let slash2 = after_prefix
        .find('/')
        .ok_or_else(|| QvError::malformed_header(line, "missing '/' after well number"))?;
    let well: u32 = after_prefix[..slash2]
        .parse()
        .map_err(|_| QvError::malformed_header(line, "well number is not a valid integer"))?;
    let after_well = &after_prefix[slash2 + 1..];

    let underscore = after_well
        .find('_')
        .ok_or_else(|| QvError::malformed_header(line, "missing '_' between begin and end"))?;
    let begin: u16 = after_well[..underscore]
        .parse()
        .map_err(|_| QvError::malformed_header(line, "begin offset is not a valid integer"))?;
    let after_begin = &after_well[underscore + 1..];

    let space = after_begin
        .find(' ')
        .ok_or_else(|| QvError::malformed_header(line, "missing space before RQ field"))?;
    let end: u16 = after_begin[..space]
        .parse()
        .map_err(|_| QvError::malformed_header(line, "end offset is not a valid integer"))?;
    let rq_field = &after_begin[space + 1..];

    const RQ_PREFIX: &str = "RQ=0.";
    let qv_str = rq_field
        .strip_prefix(RQ_PREFIX)
        .ok_or_else(|| QvError::malformed_header(line, "missing 'RQ=0.' field"))?;
    let qv: u16 = qv_str
        .parse()
        .map_err(|_| QvError::malformed_header(line, "RQ fraction is not a valid integer"))?;

    if end < begin {
        return Err(QvError::invalid_record(well as i64, begin as i64, end as i64));
    }

    Ok(ParsedHeader {
        marker,
        prefix,
        well,
        begin,
        end,
        qv,
    })
}

/// Format a header back into its text form, e.g. for a decompressed file.
pub fn format_header_line(header: &ParsedHeader) -> String {
    format!(
        "{}{}/{}/{}_{} RQ=0.{}\n",
        header.marker, header.prefix, header.well, header.begin, header.end, header.qv
    )
}

/// Write the shared read-name prefix once, at file start: a native-endian
/// 32-bit length followed by the raw bytes.
pub fn write_prefix<W: Write>(w: &mut W, prefix: &str) -> Result<()> {
    write_u32_ne(w, prefix.len() as u32)?;
    w.write_all(prefix.as_bytes())?;
    Ok(())
}

/// Read the shared read-name prefix written by [`write_prefix`].
pub fn read_prefix<R: Read>(r: &mut R, flip: bool) -> Result<String> {
    let len = read_u32_ne(r, flip)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)
        .map_err(|_| QvError::unexpected_eof("read-name prefix"))?;
    String::from_utf8(buf).map_err(|_| QvError::corrupted_table("prefix is not valid UTF-8"))
}

/// Encode one record's `well/begin/end/qv` fields. The well number is
/// delta-coded against `*last_well` as a run of `0xff` bytes (each worth
/// +255) followed by a final byte holding the remainder, so that monotone
/// well sequences cost roughly one byte each.
pub fn encode_record_fields<W: Write>(
    w: &mut W,
    header: &ParsedHeader,
    last_well: &mut u32,
) -> Result<()> {
    let mut delta = header.well - *last_well;
    while delta >= 0xff {
        w.write_all(&[0xffu8])?;
        delta -= 0xff;
    }
    w.write_all(&[delta as u8])?;
    *last_well = header.well;

    write_u16_ne(w, header.begin)?;
    write_u16_ne(w, header.end)?;
    write_u16_ne(w, header.qv)?;
    Ok(())
}

/// Decode one record's `well/begin/end/qv` fields, mirroring
/// [`encode_record_fields`]. `marker` and `prefix` are supplied by the
/// caller since they are not re-serialized per record.
pub fn decode_record_fields<R: Read>(
    r: &mut R,
    flip: bool,
    marker: char,
    prefix: &str,
    last_well: &mut u32,
) -> Result<ParsedHeader> {
    let mut well = *last_well;
    loop {
        let mut b = [0u8; 1];
        r.read_exact(&mut b)
            .map_err(|_| QvError::unexpected_eof("well delta byte"))?;
        if b[0] == 0xff {
            well += 0xff;
        } else {
            well += b[0] as u32;
            break;
        }
    }
    *last_well = well;

    let begin = read_u16_ne(r, flip)?;
    let end = read_u16_ne(r, flip)?;
    let qv = read_u16_ne(r, flip)?;

    if end < begin {
        return Err(QvError::invalid_record(well as i64, begin as i64, end as i64));
    }

    Ok(ParsedHeader {
        marker,
        prefix: prefix.to_string(),
        well,
        begin,
        end,
        qv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_header_line_basic() {
        let h = parse_header_line("@m140905_042212_sidney_c100564852550000001823085912221377_s1_p0/14/0_250 RQ=0.85\n").unwrap();
        assert_eq!(h.marker, '@');
        assert_eq!(
            h.prefix,
            "m140905_042212_sidney_c100564852550000001823085912221377_s1_p0"
        );
        assert_eq!(h.well, 14);
        assert_eq!(h.begin, 0);
        assert_eq!(h.end, 250);
        assert_eq!(h.qv, 85);
    }

    #[test]
    fn test_parse_rejects_end_before_begin() {
        let err = parse_header_line("@x/1/100_50 RQ=0.80").unwrap_err();
        assert!(matches!(err, QvError::InvalidRecord { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_marker() {
        let err = parse_header_line("#x/1/0_50 RQ=0.80").unwrap_err();
        assert!(matches!(err, QvError::MalformedHeader { .. }));
    }

    #[test]
    fn test_format_roundtrips_through_parse() {
        let h = ParsedHeader {
            marker: '@',
            prefix: "readname".to_string(),
            well: 42,
            begin: 10,
            end: 310,
            qv: 90,
        };
        let line = format_header_line(&h);
        let parsed = parse_header_line(&line).unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn test_prefix_roundtrip() {
        let mut buf = Vec::new();
        write_prefix(&mut buf, "some_movie_name").unwrap();
        let mut cur = Cursor::new(buf);
        let prefix = read_prefix(&mut cur, false).unwrap();
        assert_eq!(prefix, "some_movie_name");
    }

    #[test]
    fn test_well_delta_large_jump() {
        let mut buf = Vec::new();
        let mut last_well = 0u32;
        let h = ParsedHeader {
            marker: '@',
            prefix: "p".to_string(),
            well: 600,
            begin: 0,
            end: 5,
            qv: 80,
        };
        encode_record_fields(&mut buf, &h, &mut last_well).unwrap();
        assert_eq!(last_well, 600);
        // 600 = 255 + 255 + 90, so two 0xff bytes then a 90 byte.
        assert_eq!(&buf[..3], &[0xff, 0xff, 90]);

        let mut cur = Cursor::new(buf);
        let mut last_well2 = 0u32;
        let decoded = decode_record_fields(&mut cur, false, '@', "p", &mut last_well2).unwrap();
        assert_eq!(decoded.well, 600);
        assert_eq!(decoded.begin, 0);
        assert_eq!(decoded.end, 5);
        assert_eq!(decoded.qv, 80);
    }

    #[test]
    fn test_well_delta_sequence_roundtrip() {
        let wells = [3u32, 3, 4, 10, 10, 11, 2000];
        let mut buf = Vec::new();
        let mut last_well = 0u32;
        for &well in &wells {
            let h = ParsedHeader {
                marker: '@',
                prefix: "p".to_string(),
                well,
                begin: 0,
                end: 1,
                qv: 75,
            };
            encode_record_fields(&mut buf, &h, &mut last_well).unwrap();
        }

        let mut cur = Cursor::new(buf);
        let mut last_well2 = 0u32;
        for &well in &wells {
            let decoded =
                decode_record_fields(&mut cur, false, '@', "p", &mut last_well2).unwrap();
            assert_eq!(decoded.well, well);
        }
    }
}
