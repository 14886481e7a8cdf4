//! # quiva-core
//!
//! Bit-level I/O and error types shared by the quiva codec.
//!
//! This crate provides the fundamental building blocks used by
//! `quiva-codec`:
//!
//! - [`bitio`]: MSB-first bit-level I/O for variable-length Huffman/RLE
//!   codes, plus endian-aware helpers for the plain 16/32-bit fields that
//!   sit outside the bit-packed payloads.
//! - [`error`]: The `QvError` error type.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ quiva-cli                                                │
//! │     compress/decompress subcommands, file naming        │
//! ├─────────────────────────────────────────────────────────┤
//! │ quiva-codec                                              │
//! │     Huffman builder/codec, run-length codec, 2-bit       │
//! │     packer, header framer, scanner, scheme assembler,    │
//! │     record encoder/decoder, coding serializer            │
//! ├─────────────────────────────────────────────────────────┤
//! │ quiva-core (this crate)                                  │
//! │     BitReader/BitWriter, endian helpers, error type       │
//! └─────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitio;
pub mod error;

pub use bitio::{BitReader, BitWriter, ENDIAN_WITNESS};
pub use error::{QvError, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitio::{BitReader, BitWriter};
    pub use crate::error::{QvError, Result};
}
