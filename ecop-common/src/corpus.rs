//! Poem text resolution
//!
//! Texts live under `corpus/<author>/<title>.txt`. File names were normalized
//! on disk (see `normalize-corpus`), so the normalized original title is tried
//! first and the raw original title second. Nothing is cached: every view
//! re-reads the file.

use std::path::PathBuf;
use tracing::debug;

use crate::catalog::TitleMapping;
use crate::poem_id::{normalize_filename, PoemId};
use crate::{Error, Result};

/// A resolved poem ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoemText {
    pub original_title: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PoemCorpus {
    corpus_dir: PathBuf,
}

impl PoemCorpus {
    pub fn new(corpus_dir: PathBuf) -> Self {
        Self { corpus_dir }
    }

    /// Candidate file paths for a poem with the given original title
    pub fn candidate_paths(&self, poem: &PoemId, original_title: &str) -> Vec<PathBuf> {
        let author_dir = self.corpus_dir.join(poem.author());
        let normalized = author_dir.join(normalize_filename(&format!("{}.txt", original_title)));
        let raw = author_dir.join(format!("{}.txt", original_title));

        if normalized == raw {
            vec![normalized]
        } else {
            vec![normalized, raw]
        }
    }

    /// Resolve the display title and full text of `poem`
    ///
    /// Fails with `NotFound` when the title mapping has no entry or no
    /// candidate file can be read.
    pub async fn resolve_text(&self, titles: &TitleMapping, poem: &PoemId) -> Result<PoemText> {
        let original_title = titles
            .original_title(poem)
            .ok_or_else(|| Error::NotFound(format!("Poem {} is not in the title mapping", poem)))?;

        for path in self.candidate_paths(poem, original_title) {
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    return Ok(PoemText {
                        original_title: original_title.to_string(),
                        text,
                    })
                }
                Err(e) => debug!("Poem {}: {} unreadable: {}", poem, path.display(), e),
            }
        }

        Err(Error::NotFound(format!("Text for poem {} could not be loaded", poem)))
    }
}
