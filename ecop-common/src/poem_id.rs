//! Canonical poem identifier
//!
//! Every table in the data root joins on the same key: `author-slug/title-slug.ext`.
//! `PoemId` is parsed once (at load time or from a URL) and carried around as a
//! value, so the slug/URL/display conversions live in one place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unicode_normalization::UnicodeNormalization;

use crate::{Error, Result};

/// Separator used in URL slugs in place of `/`
pub const URL_SEPARATOR: &str = "__";

/// Extension carried by identifiers in the shipped data tables
pub const DEFAULT_EXTENSION: &str = "pt";

/// Poem identifier of the form `author-slug/title-slug.ext`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoemId {
    author: String,
    title: String,
    extension: String,
}

impl PoemId {
    /// Parse `author/title.ext`
    ///
    /// Exactly one `/` is allowed, both components must be non-empty and the
    /// file component must carry an extension.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (author, file) = raw
            .split_once('/')
            .ok_or_else(|| Error::InvalidInput(format!("Poem identifier without '/': {:?}", raw)))?;

        if author.is_empty() || file.contains('/') {
            return Err(Error::InvalidInput(format!(
                "Malformed poem identifier: {:?}",
                raw
            )));
        }

        let (title, extension) = file.rsplit_once('.').ok_or_else(|| {
            Error::InvalidInput(format!("Poem identifier without extension: {:?}", raw))
        })?;

        if title.is_empty() || extension.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Malformed poem identifier: {:?}",
                raw
            )));
        }

        Ok(Self {
            author: author.to_string(),
            title: title.to_string(),
            extension: extension.to_string(),
        })
    }

    /// Rebuild an identifier from its URL slug (`author__title`)
    pub fn from_url_slug(slug: &str, extension: &str) -> Result<Self> {
        let (author, title) = slug
            .split_once(URL_SEPARATOR)
            .ok_or_else(|| Error::InvalidInput(format!("Malformed poem URL: {:?}", slug)))?;

        if author.is_empty() || title.is_empty() || author.contains('/') || title.contains('/') {
            return Err(Error::InvalidInput(format!("Malformed poem URL: {:?}", slug)));
        }

        Ok(Self {
            author: author.to_string(),
            title: title.to_string(),
            extension: extension.to_string(),
        })
    }

    /// Author slug (first path component)
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Title slug without extension
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// URL form: `author__title`, extension dropped
    pub fn url_slug(&self) -> String {
        format!("{}{}{}", self.author, URL_SEPARATOR, self.title)
    }

    /// Author for display ("jorge-luis-borges" -> "Jorge Luis Borges")
    pub fn display_author(&self) -> String {
        title_case(&self.author.replace('-', " "))
    }

    /// Title for display, derived from the slug rather than the title mapping
    pub fn display_title(&self) -> String {
        title_case(&self.title.replace('-', " "))
    }
}

impl fmt::Display for PoemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.author, self.title, self.extension)
    }
}

impl FromStr for PoemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PoemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PoemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Normalize a file name the way the corpus files are stored on disk
///
/// NFKD decomposition, non-ASCII code points dropped (strips accents),
/// whitespace runs collapsed to a single `-`, lowercased.
pub fn normalize_filename(name: &str) -> String {
    let ascii: String = name.nfkd().filter(|c| c.is_ascii()).collect();

    let mut normalized = String::with_capacity(ascii.len());
    let mut in_whitespace = false;
    for c in ascii.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push('-');
            }
            in_whitespace = true;
        } else {
            normalized.push(c.to_ascii_lowercase());
            in_whitespace = false;
        }
    }
    normalized
}

/// Capitalize the first letter of every word, lowercase the rest
///
/// A word starts at any letter that follows a non-letter.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}
