//! Owned per-file scratch buffers.
//!
//! The reference implementation keeps a handful of file-scope static
//! buffers for the current record's decoded vectors and grows them as
//! needed. Here that scratch space is an explicit, owned `CodecState`
//! threaded through every record instead, so nothing about the codec's
//! output can depend on process-global state.

/// Scratch buffers reused across every record of a file.
///
/// Buffers grow by 1.2x plus a constant headroom rather than to the exact
/// size needed, so repeated records near the same length don't reallocate
/// every time.
#[derive(Debug, Default)]
pub struct CodecState {
    /// Decoded deletion-QV vector for the record currently in flight.
    pub del_qv: Vec<u8>,
    /// Compacted deletion-tag vector (positions surviving run-compaction).
    pub compacted_tag: Vec<u8>,
    /// Insertion-QV vector, post lossy-bucketing if applicable.
    pub ins_qv: Vec<u8>,
    /// Merge-QV vector, post lossy-bucketing if applicable.
    pub mrg_qv: Vec<u8>,
}

const GROWTH_FACTOR: f64 = 1.2;
const GROWTH_CONSTANT: usize = 64;

impl CodecState {
    /// Create an empty scratch state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure every buffer has at least `min_capacity` spare capacity,
    /// growing by the 1.2x + constant rule rather than to the exact size.
    pub fn reserve_for_record_len(&mut self, min_capacity: usize) {
        grow(&mut self.del_qv, min_capacity);
        grow(&mut self.compacted_tag, min_capacity);
        grow(&mut self.ins_qv, min_capacity);
        grow(&mut self.mrg_qv, min_capacity);
    }
}

fn grow(buf: &mut Vec<u8>, min_capacity: usize) {
    if buf.capacity() >= min_capacity {
        return;
    }
    let target = ((buf.capacity() as f64 * GROWTH_FACTOR) as usize + GROWTH_CONSTANT).max(min_capacity);
    buf.reserve(target - buf.len());
}
