//! Builds the six per-file code tables from accumulated scan statistics,
//! applying optional lossy bucketing first.

use crate::huffman::HScheme;
use crate::scan::ScanStats;

/// The six tables a [`crate::coding::QVcoding`] owns, before the run
/// characters and prefix are attached.
pub struct SchemeSet {
    /// Deletion-QV table (plain table, or the non-run symbol table when
    /// `del_char` is set).
    pub del_scheme: HScheme,
    /// Deletion run-length table, present iff `del_char` is set.
    pub del_run_scheme: Option<HScheme>,
    /// Insertion-QV table.
    pub ins_scheme: HScheme,
    /// Merge-QV table.
    pub mrg_scheme: HScheme,
    /// Substitution-QV table (plain, or non-run symbol table).
    pub sub_scheme: HScheme,
    /// Substitution run-length table, present iff `sub_char` is set.
    pub sub_run_scheme: Option<HScheme>,
}

/// Build all six tables from `stats`. `lossy` folds the insertion/merge
/// histograms into buckets before their tables are built.
pub fn build_schemes(stats: &ScanStats, lossy: bool) -> SchemeSet {
    let mut del_hist = stats.del_hist;
    if let Some(dc) = stats.del_char {
        del_hist[dc as usize] = 0;
    }
    let del_scheme = HScheme::build(&del_hist, None);
    let del_run_scheme = stats
        .del_char
        .map(|_| HScheme::build(&stats.del_run_hist, None));

    let mut ins_hist = stats.ins_hist;
    let mut mrg_hist = stats.mrg_hist;
    if lossy {
        fold_pairs(&mut ins_hist);
        fold_quads(&mut mrg_hist);
    }
    let ins_scheme = HScheme::build(&ins_hist, None);
    let mrg_scheme = HScheme::build(&mrg_hist, None);

    let mut sub_hist = stats.sub_hist;
    if let Some(sc) = stats.sub_char {
        sub_hist[sc as usize] = 0;
    }
    let sub_scheme = HScheme::build(&sub_hist, None);
    let sub_run_scheme = stats
        .sub_char
        .map(|_| HScheme::build(&stats.sub_run_hist, None));

    SchemeSet {
        del_scheme,
        del_run_scheme,
        ins_scheme,
        mrg_scheme,
        sub_scheme,
        sub_run_scheme,
    }
}

/// Fold insertion-QV buckets of 2: `h[2k] += h[2k+1]; h[2k+1] = 0`.
fn fold_pairs(h: &mut [u32; 256]) {
    for k in 0..128 {
        h[2 * k] += h[2 * k + 1];
        h[2 * k + 1] = 0;
    }
}

/// Fold merge-QV buckets of 4: `h[4k] += h[4k+1..4k+4]`.
fn fold_quads(h: &mut [u32; 256]) {
    for k in 0..64 {
        let base = 4 * k;
        h[base] += h[base + 1] + h[base + 2] + h[base + 3];
        h[base + 1] = 0;
        h[base + 2] = 0;
        h[base + 3] = 0;
    }
}

/// Apply the same bucketing to a data byte that [`fold_pairs`] applies to
/// its histogram: zero the low bit.
pub fn bucket_pair(b: u8) -> u8 {
    b & !1
}

/// Apply the same bucketing to a data byte that [`fold_quads`] applies to
/// its histogram: zero the low two bits.
pub fn bucket_quad(b: u8) -> u8 {
    b & !3
}
