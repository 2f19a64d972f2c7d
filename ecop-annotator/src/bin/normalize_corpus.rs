//! Corpus file name normalization utility
//!
//! **Usage:**
//! ```bash
//! normalize-corpus [--dry-run] <CORPUS_DIR>
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use ecop_annotator::env_filter_or;
use ecop_annotator::normalize::normalize_corpus;

/// Rename corpus text files to their normalized names
#[derive(Parser, Debug)]
#[command(name = "normalize-corpus")]
#[command(about = "Rename corpus .txt files to accent-free, lowercase, hyphenated names")]
#[command(version)]
struct Args {
    /// Only report what would be renamed
    #[arg(long)]
    dry_run: bool,

    /// Corpus root (one directory per author)
    corpus_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter_or("info"))
        .init();

    let args = Args::parse();

    let summary = normalize_corpus(&args.corpus_dir, args.dry_run)
        .with_context(|| format!("Failed to normalize {}", args.corpus_dir.display()))?;

    info!(
        "{} text files scanned, {} {}, {} skipped",
        summary.scanned,
        summary.renamed.len(),
        if args.dry_run { "to rename" } else { "renamed" },
        summary.skipped.len()
    );
    Ok(())
}
