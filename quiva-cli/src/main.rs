//! quiva-cli - command-line front end for the quiva codec.
//!
//! A thin wrapper around `quiva_codec::encode_file`/`decode_file`:
//! argument parsing, `.quiva`/`.qvz` file naming, and source-file
//! deletion. All codec logic lives in `quiva-codec`.

mod commands;

use clap::{Parser, Subcommand};
use commands::{cmd_compress, cmd_decompress};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quiva-cli")]
#[command(author, version, about = "Compressor/decompressor for PacBio quiva quality-value streams")]
#[command(long_about = "
quiva-cli compresses and decompresses PacBio .quiva files: per-base
deletion/insertion/merge/substitution quality-value streams plus a
deletion-tag sequence, coded with adaptive Huffman tables and run-length
secondary encoding.

Examples:
  quiva-cli compress reads.quiva
  quiva-cli compress --lossy --keep-source reads.quiva
  quiva-cli decompress reads.qvz
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress one or more .quiva files into .qvz
    #[command(alias = "c")]
    Compress {
        /// Input .quiva files
        files: Vec<PathBuf>,

        /// Show per-file progress
        #[arg(short, long)]
        verbose: bool,

        /// Keep the source .quiva file instead of deleting it
        #[arg(short, long)]
        keep_source: bool,

        /// Apply lossy bucketing to insertion-QV and merge-QV streams
        #[arg(short, long)]
        lossy: bool,
    },

    /// Decompress one or more .qvz files back into .quiva
    #[command(alias = "d")]
    Decompress {
        /// Input .qvz files
        files: Vec<PathBuf>,

        /// Show per-file progress
        #[arg(short, long)]
        verbose: bool,

        /// Keep the source .qvz file instead of deleting it
        #[arg(short, long)]
        keep_source: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress {
            files,
            verbose,
            keep_source,
            lossy,
        } => cmd_compress(&files, verbose, keep_source, lossy),
        Commands::Decompress {
            files,
            verbose,
            keep_source,
        } => cmd_decompress(&files, verbose, keep_source),
    };

    if let Err(e) = result {
        eprintln!("quiva-cli: {e}");
        std::process::exit(commands::exit_code_for(&e));
    }
}
