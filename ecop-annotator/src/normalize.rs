//! Corpus file name normalization
//!
//! Renames `*.txt` files under the corpus so their names match
//! [`normalize_filename`], which is the first path the text loader tries.

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use ecop_common::poem_id::normalize_filename;
use ecop_common::{Error, Result};

/// A single planned rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of a normalization pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeSummary {
    /// `.txt` files visited
    pub scanned: usize,
    /// Renames performed (or planned, in a dry run)
    pub renamed: Vec<Rename>,
    /// Renames skipped because the target already exists
    pub skipped: Vec<Rename>,
}

/// Find every `.txt` file whose name is not yet normalized
pub fn plan_renames(corpus_dir: &Path) -> Result<(usize, Vec<Rename>)> {
    if !corpus_dir.is_dir() {
        return Err(Error::NotFound(format!(
            "Corpus directory {} does not exist",
            corpus_dir.display()
        )));
    }

    let mut scanned = 0;
    let mut plan = Vec::new();

    for entry in WalkDir::new(corpus_dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error accessing entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            warn!("Skipping non UTF-8 file name: {}", entry.path().display());
            continue;
        };
        if !name.ends_with(".txt") {
            continue;
        }

        scanned += 1;
        let normalized = normalize_filename(name);
        if normalized != name {
            plan.push(Rename {
                from: entry.path().to_path_buf(),
                to: entry.path().with_file_name(normalized),
            });
        }
    }

    Ok((scanned, plan))
}

/// Normalize the corpus in place
///
/// With `dry_run` the renames are only logged. A rename whose target
/// already exists is skipped so no poem is overwritten.
pub fn normalize_corpus(corpus_dir: &Path, dry_run: bool) -> Result<NormalizeSummary> {
    let (scanned, plan) = plan_renames(corpus_dir)?;
    let mut summary = NormalizeSummary {
        scanned,
        ..Default::default()
    };

    for rename in plan {
        if rename.to.exists() {
            warn!(
                "Not renaming {}: {} already exists",
                rename.from.display(),
                rename.to.display()
            );
            summary.skipped.push(rename);
            continue;
        }

        if dry_run {
            info!("Would rename {} -> {}", rename.from.display(), rename.to.display());
        } else {
            std::fs::rename(&rename.from, &rename.to)?;
            info!("Renamed {} -> {}", rename.from.display(), rename.to.display());
        }
        summary.renamed.push(rename);
    }

    Ok(summary)
}
