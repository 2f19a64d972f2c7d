//! Title mapping: formatted file name -> original display title

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::poem_id::{normalize_filename, PoemId};
use crate::{Error, Result};

const ORIGINAL_COLUMN: &str = "original_title";
const FORMATTED_COLUMN: &str = "formatted_title";
const TEXT_SUFFIX: &str = ".txt";

/// Bidirectional-enough lookup from formatted title to original title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleMapping {
    by_formatted: HashMap<String, String>,
}

impl TitleMapping {
    /// Parse a CSV with `original_title` and `formatted_title` header columns
    ///
    /// Keys are normalized and lose a trailing `.txt`; the first row wins on
    /// duplicate keys.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::Config(format!("Title mapping has no '{}' column", name)))
        };
        let original_idx = column(ORIGINAL_COLUMN)?;
        let formatted_idx = column(FORMATTED_COLUMN)?;

        let mut by_formatted = HashMap::new();
        for record in csv.records() {
            let record = record?;
            let (Some(original), Some(formatted)) =
                (record.get(original_idx), record.get(formatted_idx))
            else {
                continue;
            };

            let key = strip_text_suffix(&normalize_filename(formatted.trim())).to_string();
            let original = strip_text_suffix(original.trim()).to_string();
            if key.is_empty() || original.is_empty() {
                continue;
            }
            by_formatted.entry(key).or_insert(original);
        }

        Ok(Self { by_formatted })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Original title for a formatted title (with or without `.txt`)
    pub fn lookup(&self, formatted_title: &str) -> Option<&str> {
        let key = normalize_filename(formatted_title);
        self.by_formatted
            .get(strip_text_suffix(&key))
            .map(String::as_str)
    }

    /// Original title for a poem identifier
    pub fn original_title(&self, poem: &PoemId) -> Option<&str> {
        self.lookup(poem.title())
    }

    pub fn contains(&self, poem: &PoemId) -> bool {
        self.original_title(poem).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_formatted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_formatted.is_empty()
    }
}

fn strip_text_suffix(name: &str) -> &str {
    name.strip_suffix(TEXT_SUFFIX).unwrap_or(name)
}
