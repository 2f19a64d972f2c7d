//! Precomputed similarity table: poem -> ordered neighbors

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::poem_id::PoemId;
use crate::Result;

/// Maximum neighbors read per row (columns 2-11)
pub const MAX_NEIGHBORS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarityTable {
    rows: HashMap<PoemId, Vec<PoemId>>,
}

impl SimilarityTable {
    /// Parse a CSV whose first column is the poem key and whose next ten
    /// columns are its neighbors, best first
    ///
    /// The header row is skipped. Unparseable keys drop the row; unparseable
    /// or empty neighbor cells are skipped. The first row wins on duplicates.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut rows = HashMap::new();
        for record in csv.records() {
            let record = record?;
            let Some(raw_key) = record.get(0) else {
                continue;
            };
            if raw_key.trim().is_empty() {
                continue;
            }

            let key = match PoemId::parse(raw_key) {
                Ok(key) => key,
                Err(e) => {
                    warn!("Similarity table: skipping row: {}", e);
                    continue;
                }
            };

            let neighbors = record
                .iter()
                .skip(1)
                .take(MAX_NEIGHBORS)
                .filter(|cell| !cell.trim().is_empty())
                .filter_map(|cell| match PoemId::parse(cell) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!("Similarity table: row {}: skipping neighbor: {}", key, e);
                        None
                    }
                })
                .collect();

            rows.entry(key).or_insert(neighbors);
        }

        Ok(Self { rows })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Neighbors of `poem`; empty when the table has no row for it
    pub fn neighbors(&self, poem: &PoemId) -> &[PoemId] {
        self.rows.get(poem).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = (&PoemId, &[PoemId])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
