//! Command implementations for `quiva-cli`: thin wrappers around
//! `quiva_codec::encode_file`/`decode_file` that own argument parsing,
//! file naming, and source-file deletion — kept out of the codec crate
//! itself.

use indicatif::{ProgressBar, ProgressStyle};
use quiva_core::error::{QvError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Suffix a compressed quiva file carries on disk.
const COMPRESSED_EXT: &str = "qvz";
/// Suffix a source quiva text file carries on disk.
const SOURCE_EXT: &str = "quiva";

/// Create a progress bar with standard styling, hidden when `enable` is
/// false.
fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Replace `path`'s extension with `ext`, preserving its directory and stem.
fn with_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// Compress each `.quiva` file in `files` to a sibling `.qvz` file.
///
/// Every input is attempted even if an earlier one failed (matching the
/// reference tool's per-file loop); the first error encountered is
/// returned to the caller after all files have been tried, so `main` can
/// still report and exit 1 without aborting the rest of the batch.
pub fn cmd_compress(files: &[PathBuf], verbose: bool, keep_source: bool, lossy: bool) -> Result<()> {
    let pb = create_progress_bar(files.len() as u64, verbose && files.len() > 1);
    let mut first_err = None;

    for path in files {
        if verbose {
            eprintln!("Processing '{}' ...", path.display());
        }
        match compress_one(path, lossy) {
            Ok(()) => {
                if !keep_source {
                    if let Err(e) = std::fs::remove_file(path) {
                        eprintln!("quiva-cli: {}: {}", path.display(), e);
                    }
                }
                if verbose {
                    eprintln!("Done");
                }
            }
            Err(e) => {
                eprintln!("quiva-cli: {}: {}", path.display(), e);
                first_err.get_or_insert(e);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn compress_one(path: &Path, lossy: bool) -> Result<()> {
    let input = BufReader::new(File::open(path)?);
    let out_path = with_extension(path, COMPRESSED_EXT);
    let output = BufWriter::new(File::create(&out_path)?);
    quiva_codec::encode_file(input, output, lossy)
}

/// Decompress each `.qvz` file in `files` to a sibling `.quiva` file.
pub fn cmd_decompress(files: &[PathBuf], verbose: bool, keep_source: bool) -> Result<()> {
    let pb = create_progress_bar(files.len() as u64, verbose && files.len() > 1);
    let mut first_err = None;

    for path in files {
        if verbose {
            eprintln!("Processing '{}' ...", path.display());
        }
        match decompress_one(path) {
            Ok(()) => {
                if !keep_source {
                    if let Err(e) = std::fs::remove_file(path) {
                        eprintln!("quiva-cli: {}: {}", path.display(), e);
                    }
                }
                if verbose {
                    eprintln!("Done");
                }
            }
            Err(e) => {
                eprintln!("quiva-cli: {}: {}", path.display(), e);
                first_err.get_or_insert(e);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn decompress_one(path: &Path) -> Result<()> {
    let input = BufReader::new(File::open(path)?);
    let out_path = with_extension(path, SOURCE_EXT);
    let output = BufWriter::new(File::create(&out_path)?);
    quiva_codec::decode_file(input, output)
}

/// Map a fatal [`QvError`] to the process exit status the CLI reports.
pub fn exit_code_for(_err: &QvError) -> i32 {
    1
}
