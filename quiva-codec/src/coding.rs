//! The `QVcoding` file-header object and its binary serialization.

use crate::header::{read_prefix, write_prefix};
use crate::huffman::{CodeEntry, HScheme, NSYM, SchemeKind};
use crate::scheme::SchemeSet;
use quiva_core::bitio::{ENDIAN_WITNESS, read_u16_ne, write_u16_ne};
use quiva_core::error::{QvError, Result};
use std::io::{Read, Write};

/// Sentinel written in place of a real run character when the stream has
/// none (256 meaning not used).
const NO_RUN_CHAR: u16 = 256;

/// The compressed file's header object: the six code tables, the two run
/// characters, the endian-flip flag, and the shared read-name prefix.
///
/// Built once during the first pass (encode) or read once at file open
/// (decode), then held read-only for the rest of the file.
#[derive(Debug, Clone)]
pub struct QVcoding {
    /// Deletion-QV table.
    pub del_scheme: HScheme,
    /// Deletion run-length table, present iff `del_char` is set.
    pub del_run_scheme: Option<HScheme>,
    /// Insertion-QV table.
    pub ins_scheme: HScheme,
    /// Merge-QV table.
    pub mrg_scheme: HScheme,
    /// Substitution-QV table.
    pub sub_scheme: HScheme,
    /// Substitution run-length table, present iff `sub_char` is set.
    pub sub_run_scheme: Option<HScheme>,
    /// Deletion run character, if any.
    pub del_char: Option<u8>,
    /// Substitution run character, if any.
    pub sub_char: Option<u8>,
    /// Shared read-name prefix for every record in the file.
    pub prefix: String,
    /// Set when the stored endian witness did not match the host's; every
    /// multi-byte field read from the file (including code words) is
    /// byteswapped.
    pub flip: bool,
}

impl QVcoding {
    /// Assemble a `QVcoding` from a built [`SchemeSet`] plus the run
    /// characters chosen by the scanner and the file's shared prefix.
    /// `flip` is always `false` for a coding about to be written.
    pub fn new(schemes: SchemeSet, del_char: Option<u8>, sub_char: Option<u8>, prefix: String) -> Self {
        QVcoding {
            del_scheme: schemes.del_scheme,
            del_run_scheme: schemes.del_run_scheme,
            ins_scheme: schemes.ins_scheme,
            mrg_scheme: schemes.mrg_scheme,
            sub_scheme: schemes.sub_scheme,
            sub_run_scheme: schemes.sub_run_scheme,
            del_char,
            sub_char,
            prefix,
            flip: false,
        }
    }
}

/// Write the full file-header region: endian witness, run-character
/// fields, prefix, and the (conditional) six code tables.
pub fn write_coding<W: Write>(w: &mut W, coding: &QVcoding) -> Result<()> {
    write_u16_ne(w, ENDIAN_WITNESS)?;
    write_u16_ne(w, coding.del_char.map(u16::from).unwrap_or(NO_RUN_CHAR))?;
    write_u16_ne(w, coding.sub_char.map(u16::from).unwrap_or(NO_RUN_CHAR))?;
    write_prefix(w, &coding.prefix)?;

    write_scheme(w, &coding.del_scheme)?;
    if let Some(scheme) = &coding.del_run_scheme {
        write_scheme(w, scheme)?;
    }
    write_scheme(w, &coding.ins_scheme)?;
    write_scheme(w, &coding.mrg_scheme)?;
    write_scheme(w, &coding.sub_scheme)?;
    if let Some(scheme) = &coding.sub_run_scheme {
        write_scheme(w, scheme)?;
    }
    Ok(())
}

/// Read the full file-header region written by [`write_coding`],
/// resolving the endian-flip flag from the witness field.
pub fn read_coding<R: Read>(r: &mut R) -> Result<QVcoding> {
    let mut witness_buf = [0u8; 2];
    r.read_exact(&mut witness_buf)
        .map_err(|_| QvError::unexpected_eof("endian witness"))?;
    let raw = u16::from_ne_bytes(witness_buf);
    let flip = if raw == ENDIAN_WITNESS {
        false
    } else if raw.swap_bytes() == ENDIAN_WITNESS {
        true
    } else {
        return Err(QvError::corrupted_table("endian witness matches neither byte order"));
    };

    let del_char_raw = read_u16_ne(r, flip)?;
    let sub_char_raw = read_u16_ne(r, flip)?;
    let del_char = (del_char_raw != NO_RUN_CHAR).then_some(del_char_raw as u8);
    let sub_char = (sub_char_raw != NO_RUN_CHAR).then_some(sub_char_raw as u8);

    let prefix = read_prefix(r, flip)?;

    let del_scheme = read_scheme(r, flip)?;
    let del_run_scheme = del_char.is_some().then(|| read_scheme(r, flip)).transpose()?;
    let ins_scheme = read_scheme(r, flip)?;
    let mrg_scheme = read_scheme(r, flip)?;
    let sub_scheme = read_scheme(r, flip)?;
    let sub_run_scheme = sub_char.is_some().then(|| read_scheme(r, flip)).transpose()?;

    Ok(QVcoding {
        del_scheme,
        del_run_scheme,
        ins_scheme,
        mrg_scheme,
        sub_scheme,
        sub_run_scheme,
        del_char,
        sub_char,
        prefix,
        flip,
    })
}

/// Write one code table: a type byte, then 256 `(len, code?)` pairs.
fn write_scheme<W: Write>(w: &mut W, scheme: &HScheme) -> Result<()> {
    let type_byte: u8 = match scheme.kind() {
        SchemeKind::Plain => 0,
        SchemeKind::Long => 1,
        SchemeKind::Escaped { .. } => 2,
    };
    w.write_all(&[type_byte])?;
    for entry in scheme.codes() {
        w.write_all(&[entry.len])?;
        if entry.len > 0 {
            w.write_all(&entry.code.to_ne_bytes())?;
        }
    }
    Ok(())
}

/// Read one code table written by [`write_scheme`].
fn read_scheme<R: Read>(r: &mut R, flip: bool) -> Result<HScheme> {
    let mut type_byte = [0u8; 1];
    r.read_exact(&mut type_byte)
        .map_err(|_| QvError::unexpected_eof("scheme type byte"))?;

    let mut codes = [CodeEntry::default(); NSYM];
    for entry in codes.iter_mut() {
        let mut len_buf = [0u8; 1];
        r.read_exact(&mut len_buf)
            .map_err(|_| QvError::unexpected_eof("code length byte"))?;
        let len = len_buf[0];
        if len > 0 {
            let mut code_buf = [0u8; 4];
            r.read_exact(&mut code_buf)
                .map_err(|_| QvError::unexpected_eof("code word"))?;
            let mut code = u32::from_ne_bytes(code_buf);
            if flip {
                code = code.swap_bytes();
            }
            *entry = CodeEntry { code, len };
        }
    }

    let kind = match type_byte[0] {
        0 => SchemeKind::Plain,
        2 => SchemeKind::Escaped {
            escape_code: codes[255].code,
            escape_len: codes[255].len,
        },
        other => {
            return Err(QvError::corrupted_table(format!(
                "unsupported scheme type byte {other}"
            )));
        }
    };

    Ok(HScheme::from_codes(kind, codes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hist_from(bytes: &[u8]) -> [u32; NSYM] {
        let mut h = [0u32; NSYM];
        for &b in bytes {
            h[b as usize] += 1;
        }
        h
    }

    #[test]
    fn test_scheme_roundtrip_plain() {
        let hist = hist_from(b"hello world, hello again");
        let scheme = HScheme::build(&hist, None);
        let mut buf = Vec::new();
        write_scheme(&mut buf, &scheme).unwrap();
        let mut cur = Cursor::new(buf);
        let back = read_scheme(&mut cur, false).unwrap();
        assert_eq!(back.codes(), scheme.codes());
    }

    #[test]
    fn test_scheme_roundtrip_escaped() {
        let hist = hist_from(&[255u8; 3]);
        let scheme = HScheme::build(&hist, None);
        assert!(matches!(scheme.kind(), SchemeKind::Escaped { .. }));
        let mut buf = Vec::new();
        write_scheme(&mut buf, &scheme).unwrap();
        let mut cur = Cursor::new(buf);
        let back = read_scheme(&mut cur, false).unwrap();
        assert!(matches!(back.kind(), SchemeKind::Escaped { .. }));
        assert_eq!(back.codes(), scheme.codes());
    }

    #[test]
    fn test_coding_roundtrip_no_run_chars() {
        let schemes = SchemeSet {
            del_scheme: HScheme::build(&hist_from(b"abcabcabc"), None),
            del_run_scheme: None,
            ins_scheme: HScheme::build(&hist_from(b"defdefdef"), None),
            mrg_scheme: HScheme::build(&hist_from(b"ghighighi"), None),
            sub_scheme: HScheme::build(&hist_from(b"jkljkljkl"), None),
            sub_run_scheme: None,
        };
        let coding = QVcoding::new(schemes, None, None, "movie_prefix".to_string());

        let mut buf = Vec::new();
        write_coding(&mut buf, &coding).unwrap();
        let mut cur = Cursor::new(buf);
        let back = read_coding(&mut cur).unwrap();

        assert_eq!(back.del_char, None);
        assert_eq!(back.sub_char, None);
        assert_eq!(back.prefix, "movie_prefix");
        assert!(!back.flip);
        assert!(back.del_run_scheme.is_none());
        assert!(back.sub_run_scheme.is_none());
    }

    #[test]
    fn test_coding_roundtrip_with_run_chars() {
        let schemes = SchemeSet {
            del_scheme: HScheme::build(&hist_from(b"abcabcabc"), None),
            del_run_scheme: Some(HScheme::build(&hist_from(&[1, 2, 3, 1, 2]), None)),
            ins_scheme: HScheme::build(&hist_from(b"defdefdef"), None),
            mrg_scheme: HScheme::build(&hist_from(b"ghighighi"), None),
            sub_scheme: HScheme::build(&hist_from(b"jkljkljkl"), None),
            sub_run_scheme: Some(HScheme::build(&hist_from(&[4, 5, 6, 4, 5]), None)),
        };
        let coding = QVcoding::new(schemes, Some(5), Some(9), "movie".to_string());

        let mut buf = Vec::new();
        write_coding(&mut buf, &coding).unwrap();
        let mut cur = Cursor::new(buf);
        let back = read_coding(&mut cur).unwrap();

        assert_eq!(back.del_char, Some(5));
        assert_eq!(back.sub_char, Some(9));
        assert!(back.del_run_scheme.is_some());
        assert!(back.sub_run_scheme.is_some());
    }

    #[test]
    fn test_read_coding_rejects_bad_witness() {
        let mut buf = Vec::new();
        write_u16_ne(&mut buf, 0x1234).unwrap();
        let mut cur = Cursor::new(buf);
        let err = read_coding(&mut cur).unwrap_err();
        assert!(matches!(err, QvError::CorruptedTable { .. }));
    }
}
