//! Error types for quiva codec operations.
//!
//! This module provides a single error type covering every fatal condition
//! the codec can encounter: malformed input text, I/O failures, and
//! corrupted compressed streams. Every error is fatal to the file currently
//! being processed; there is no per-record retry.

use std::io;
use thiserror::Error;

/// The error type for quiva codec operations.
#[derive(Debug, Error)]
pub enum QvError {
    /// I/O error from the underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A header line could not be parsed (missing `/`, unparseable fields).
    #[error("malformed header {header:?}: {reason}")]
    MalformedHeader {
        /// The offending header line.
        header: String,
        /// Why it could not be parsed.
        reason: String,
    },

    /// The five QV/tag vectors of a record did not all have the same length.
    #[error("{stream} line length {found} does not match record length {expected}")]
    LineLengthMismatch {
        /// Which of the five streams disagreed.
        stream: &'static str,
        /// The length established by the first vector read.
        expected: usize,
        /// The length of the offending vector.
        found: usize,
    },

    /// The input ended in the middle of a record.
    #[error("unexpected end of file: {context}")]
    UnexpectedEof {
        /// What was being read when input ran out.
        context: String,
    },

    /// A header's `begin`/`end` fields are inconsistent (`end < begin`).
    #[error("invalid record at well {well}: end ({end}) < begin ({begin})")]
    InvalidRecord {
        /// The record's well number.
        well: i64,
        /// The record's begin offset.
        begin: i64,
        /// The record's end offset.
        end: i64,
    },

    /// A Huffman code could not be resolved while decoding (corrupt stream).
    #[error("invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where decoding failed.
        bit_position: u64,
    },

    /// A serialized code table failed a basic sanity check on read.
    #[error("corrupted code table: {message}")]
    CorruptedTable {
        /// Description of what was wrong.
        message: String,
    },
}

/// Result type alias for quiva codec operations.
pub type Result<T> = std::result::Result<T, QvError>;

impl QvError {
    /// Create a malformed-header error.
    pub fn malformed_header(header: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            header: header.into(),
            reason: reason.into(),
        }
    }

    /// Create a line-length-mismatch error.
    pub fn line_length_mismatch(stream: &'static str, expected: usize, found: usize) -> Self {
        Self::LineLengthMismatch {
            stream,
            expected,
            found,
        }
    }

    /// Create an unexpected-EOF error.
    pub fn unexpected_eof(context: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            context: context.into(),
        }
    }

    /// Create an invalid-record error.
    pub fn invalid_record(well: i64, begin: i64, end: i64) -> Self {
        Self::InvalidRecord { well, begin, end }
    }

    /// Create an invalid-Huffman-code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create a corrupted-table error.
    pub fn corrupted_table(message: impl Into<String>) -> Self {
        Self::CorruptedTable {
            message: message.into(),
        }
    }
}
