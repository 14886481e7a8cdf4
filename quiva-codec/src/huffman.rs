//! Canonical Huffman code tables with a 16-bit length cap and an
//! escape-to-literal mechanism.
//!
//! An [`HScheme`] is built once from a 256-bin histogram and is immutable
//! thereafter (`QVcoding` owns six of these, read-only for the life of a
//! file). Every code is capped at [`MAX_CODE_LEN`] bits so a decoder can
//! always resolve a symbol from a single 16-bit lookahead.

use quiva_core::bitio::{BitReader, BitWriter};
use quiva_core::error::{QvError, Result};
use std::io::{Read, Write};

/// Number of distinct symbol values (a byte's worth).
pub const NSYM: usize = 256;

/// Sentinel symbol always reserved for escape duty.
pub const ESCAPE_SYMBOL: u8 = 255;

/// Maximum code length a built table is allowed to produce.
pub const MAX_CODE_LEN: u8 = 16;

/// A single symbol's code: `len == 0` means the symbol is unused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeEntry {
    /// The code word, right-justified.
    pub code: u32,
    /// Bit length of the code (0 if the symbol does not occur).
    pub len: u8,
}

/// The classification of a built table.
///
/// `Long` is a transient signal produced mid-construction (some code
/// exceeded the 16-bit cap) and is always rebuilt into `Escaped` before a
/// table is returned from [`build`] — it is kept as an enum member (rather
/// than collapsing to a boolean) purely so the serialized `type` byte's
/// three historical values (0/1/2) are representable, and so a decoder
/// reading a corrupt file that claims `type == 1` can be rejected rather
/// than silently misinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    /// Every used symbol fits in `<= MAX_CODE_LEN` bits; no escape.
    Plain,
    /// Transient only — never present in a finished [`HScheme`].
    Long,
    /// Symbol 255 plus every overflowing symbol share `escape_code`.
    Escaped {
        /// The shared escape code word.
        escape_code: u32,
        /// The shared escape code length.
        escape_len: u8,
    },
}

#[derive(Debug, Clone, Copy)]
struct LookupEntry {
    symbol: u8,
    len: u8,
}

/// A built, immutable Huffman code table for one stream.
#[derive(Debug, Clone)]
pub struct HScheme {
    kind: SchemeKind,
    codes: [CodeEntry; NSYM],
    lookup: Box<[LookupEntry]>,
}

enum NodeKind {
    Leaf(u8),
    /// Leaf representing the whole collapsed escape group.
    EscapeLeaf,
    Internal(usize, usize),
}

struct Node {
    count: u64,
    kind: NodeKind,
}

impl HScheme {
    /// Build a table from `hist`, optionally reusing `reference`'s overflow
    /// set the way a second assembler pass does.
    pub fn build(hist: &[u32; NSYM], reference: Option<&HScheme>) -> HScheme {
        let trial = build_tree(hist, None);
        let overflow = trial.iter().any(|e| e.len > MAX_CODE_LEN);

        // Symbol 255 is always reserved as the escape marker once escapes
        // are in use; a histogram containing it alone therefore still
        // forces an escape rebuild even if its own natural code would
        // have fit.
        let needs_escape = overflow || hist[ESCAPE_SYMBOL as usize] > 0;

        if !needs_escape {
            return HScheme::from_codes(SchemeKind::Plain, trial);
        }

        let mut collapse = [false; NSYM];
        collapse[ESCAPE_SYMBOL as usize] = true;
        for (s, e) in trial.iter().enumerate() {
            if e.len > MAX_CODE_LEN {
                collapse[s] = true;
            }
        }
        if let Some(r) = reference {
            for s in 0..NSYM {
                if r.codes[s].len > MAX_CODE_LEN {
                    collapse[s] = true;
                }
            }
        }

        let mut rebuilt = build_tree(hist, Some(&collapse));
        let escape = rebuilt[ESCAPE_SYMBOL as usize];
        for (s, collapsed) in collapse.iter().enumerate() {
            if *collapsed {
                rebuilt[s] = escape;
            }
        }
        HScheme::from_codes(
            SchemeKind::Escaped {
                escape_code: escape.code,
                escape_len: escape.len,
            },
            rebuilt,
        )
    }

    /// Construct a table directly from a code-length/word assignment (used
    /// when deserializing a stored table in `coding.rs`).
    pub fn from_codes(kind: SchemeKind, codes: [CodeEntry; NSYM]) -> HScheme {
        let mut lookup = vec![LookupEntry { symbol: 0, len: 0 }; 1 << 16].into_boxed_slice();

        let is_escape_code = |e: &CodeEntry| {
            matches!(kind, SchemeKind::Escaped { escape_code, escape_len }
                if e.code == escape_code && e.len == escape_len)
        };

        for (s, entry) in codes.iter().enumerate() {
            if entry.len == 0 {
                continue;
            }
            let symbol = if is_escape_code(entry) {
                ESCAPE_SYMBOL
            } else {
                s as u8
            };
            let shift = 16 - entry.len as u32;
            let base = (entry.code as usize) << shift;
            let span = 1usize << shift;
            for slot in lookup.iter_mut().skip(base).take(span) {
                *slot = LookupEntry {
                    symbol,
                    len: entry.len,
                };
            }
        }

        HScheme {
            kind,
            codes,
            lookup,
        }
    }

    /// The table's classification.
    pub fn kind(&self) -> SchemeKind {
        self.kind
    }

    /// Per-symbol code table, for serialization.
    pub fn codes(&self) -> &[CodeEntry; NSYM] {
        &self.codes
    }

    fn is_escape(&self, entry: CodeEntry) -> bool {
        matches!(self.kind, SchemeKind::Escaped { escape_code, escape_len }
            if entry.code == escape_code && entry.len == escape_len)
    }

    /// Encode one symbol, emitting an `literal_bits`-wide raw literal after
    /// the code if (and only if) this symbol shares the table's escape code.
    pub fn encode_value<W: Write>(
        &self,
        writer: &mut BitWriter<W>,
        value: u32,
        literal_bits: u8,
    ) -> Result<()> {
        let symbol = value.min(ESCAPE_SYMBOL as u32) as u8;
        let entry = self.codes[symbol as usize];
        debug_assert!(entry.len > 0, "symbol not present in the histogram used to build this table");
        writer.emit(entry.code, entry.len)?;
        if self.is_escape(entry) {
            writer.emit(value, literal_bits)?;
        }
        Ok(())
    }

    /// Decode one value: a code lookup, then (if escaped) a raw literal.
    pub fn decode_value<R: Read>(
        &self,
        reader: &mut BitReader<R>,
        literal_bits: u8,
    ) -> Result<u32> {
        let window = reader.peek(16)?;
        let entry = self.lookup[window as usize];
        if entry.len == 0 {
            return Err(QvError::invalid_huffman(reader.bit_position()));
        }
        reader.skip(entry.len)?;

        if entry.symbol == ESCAPE_SYMBOL && matches!(self.kind, SchemeKind::Escaped { .. }) {
            reader.read(literal_bits)
        } else {
            Ok(entry.symbol as u32)
        }
    }
}

/// Build a Huffman tree over `hist`, optionally collapsing the symbols
/// flagged in `collapse` into a single escape leaf, and return per-symbol
/// `(code, len)` assignments. Equal-count nodes are broken by insertion
/// order: the entry inserted earlier wins.
fn build_tree(hist: &[u32; NSYM], collapse: Option<&[bool; NSYM]>) -> [CodeEntry; NSYM] {
    let mut nodes: Vec<Node> = Vec::new();
    // (count, insertion_index, node_index), ascending order = earlier wins.
    let mut heap: std::collections::BinaryHeap<std::cmp::Reverse<(u64, u64, usize)>> =
        std::collections::BinaryHeap::new();
    let mut next_insertion: u64 = 0;

    let mut escape_count: u64 = 0;
    let mut escape_seen = false;

    for (s, &count) in hist.iter().enumerate() {
        let collapsed = collapse.map(|c| c[s]).unwrap_or(false);
        if collapsed {
            escape_count += count as u64;
            escape_seen = true;
            continue;
        }
        if count == 0 {
            continue;
        }
        let idx = nodes.len();
        nodes.push(Node {
            count: count as u64,
            kind: NodeKind::Leaf(s as u8),
        });
        heap.push(std::cmp::Reverse((count as u64, next_insertion, idx)));
        next_insertion += 1;
    }

    if escape_seen {
        let idx = nodes.len();
        nodes.push(Node {
            count: escape_count,
            kind: NodeKind::EscapeLeaf,
        });
        heap.push(std::cmp::Reverse((escape_count, next_insertion, idx)));
        next_insertion += 1;
    }

    let mut codes = [CodeEntry::default(); NSYM];

    if nodes.is_empty() {
        return codes;
    }

    if nodes.len() == 1 {
        assign_single(&nodes[0].kind, &mut codes, 0, 1);
        return codes;
    }

    while heap.len() > 1 {
        let std::cmp::Reverse((c1, _, i1)) = heap.pop().unwrap();
        let std::cmp::Reverse((c2, _, i2)) = heap.pop().unwrap();
        let idx = nodes.len();
        nodes.push(Node {
            count: c1 + c2,
            kind: NodeKind::Internal(i1, i2),
        });
        heap.push(std::cmp::Reverse((c1 + c2, next_insertion, idx)));
        next_insertion += 1;
    }

    let std::cmp::Reverse((_, _, root)) = heap.pop().unwrap();
    assign_codes(&nodes, root, 0, 0, &mut codes);
    codes
}

fn assign_single(kind: &NodeKind, codes: &mut [CodeEntry; NSYM], code: u32, len: u8) {
    match kind {
        NodeKind::Leaf(s) => codes[*s as usize] = CodeEntry { code, len },
        NodeKind::EscapeLeaf => codes[ESCAPE_SYMBOL as usize] = CodeEntry { code, len },
        NodeKind::Internal(..) => unreachable!("single-node tree cannot be internal"),
    }
}

fn assign_codes(nodes: &[Node], idx: usize, code: u32, len: u8, codes: &mut [CodeEntry; NSYM]) {
    match nodes[idx].kind {
        NodeKind::Leaf(s) => codes[s as usize] = CodeEntry { code, len },
        NodeKind::EscapeLeaf => codes[ESCAPE_SYMBOL as usize] = CodeEntry { code, len },
        NodeKind::Internal(left, right) => {
            assign_codes(nodes, left, code << 1, len + 1, codes);
            assign_codes(nodes, right, (code << 1) | 1, len + 1, codes);
        }
    }
}
