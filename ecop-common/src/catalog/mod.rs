//! Static catalog tables loaded once at startup
//!
//! - `users.json`: credentials and assignments
//! - `original_to_formatted_titles.csv`: title mapping
//! - `similarity_matrix.csv` / `similarity_random.csv`: neighbor tables
//!
//! Loading never fails: a missing or malformed table is logged and replaced
//! by an empty one so the service keeps serving.

mod similarity;
mod titles;
mod users;

pub use similarity::{SimilarityTable, MAX_NEIGHBORS};
pub use titles::TitleMapping;
pub use users::{User, UserDirectory};

use std::path::Path;
use tracing::{error, info, warn};

use crate::config::DataPaths;
use crate::poem_id::PoemId;
use crate::{Error, Result};

/// Read-only catalog shared by every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub users: UserDirectory,
    pub titles: TitleMapping,
    pub similarity: SimilarityTable,
    pub random_similarity: SimilarityTable,
}

/// Data-quality findings from [`Catalog::validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogReport {
    /// Assigned poems missing from the title mapping
    pub unresolved_assignments: usize,
    /// Similarity keys or neighbors missing from the title mapping
    pub unresolved_neighbors: usize,
    /// Rows listing their own key as a neighbor
    pub self_references: usize,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl Catalog {
    /// Load every table under the data root
    pub fn load(paths: &DataPaths) -> Self {
        let catalog = Self {
            users: load_table(&paths.users_path(), UserDirectory::load),
            titles: load_table(&paths.titles_path(), TitleMapping::load),
            similarity: load_table(&paths.similarity_path(), SimilarityTable::load),
            random_similarity: load_table(&paths.random_similarity_path(), SimilarityTable::load),
        };

        info!(
            "Catalog loaded: {} users, {} titles, {} similarity rows, {} random similarity rows",
            catalog.users.len(),
            catalog.titles.len(),
            catalog.similarity.len(),
            catalog.random_similarity.len()
        );

        catalog
    }

    /// Check every identifier the service may need to resolve
    ///
    /// Findings are logged, never fixed: the tables are served unchanged.
    pub fn validate(&self) -> CatalogReport {
        let mut report = CatalogReport::default();

        for user in self.users.iter() {
            for poem in &user.assigned_poems {
                if !self.titles.contains(poem) {
                    warn!("User {}: assigned poem {} has no title mapping", user.username, poem);
                    report.unresolved_assignments += 1;
                }
            }
        }

        for table in [&self.similarity, &self.random_similarity] {
            for (key, neighbors) in table.rows() {
                if !self.titles.contains(key) {
                    warn!("Similarity row {} has no title mapping", key);
                    report.unresolved_neighbors += 1;
                }
                for neighbor in neighbors {
                    if neighbor == key {
                        warn!("Similarity row {} recommends itself", key);
                        report.self_references += 1;
                    }
                    if !self.titles.contains(neighbor) {
                        warn!("Similarity row {}: neighbor {} has no title mapping", key, neighbor);
                        report.unresolved_neighbors += 1;
                    }
                }
            }
        }

        if report.is_clean() {
            info!("Catalog validation passed");
        } else {
            warn!("Catalog validation found issues: {:?}", report);
        }

        report
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Check a username/password pair
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&User> {
        self.users
            .get(username)
            .filter(|user| user.password_matches(password))
    }

    /// Assigned poems in order; unknown users have none
    pub fn assigned_poems(&self, username: &str) -> &[PoemId] {
        self.users
            .get(username)
            .map(|u| u.assigned_poems.as_slice())
            .unwrap_or(&[])
    }

    /// Neighbors of `poem` from the primary or the randomized table
    pub fn neighbors(&self, poem: &PoemId, use_randomized: bool) -> &[PoemId] {
        if use_randomized {
            self.random_similarity.neighbors(poem)
        } else {
            self.similarity.neighbors(poem)
        }
    }

    pub fn original_title(&self, poem: &PoemId) -> Option<&str> {
        self.titles.original_title(poem)
    }
}

fn load_table<T: Default>(path: &Path, load: fn(&Path) -> Result<T>) -> T {
    match load(path) {
        Ok(table) => table,
        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            error!("{} file not found", path.display());
            T::default()
        }
        Err(e) => {
            error!("Failed to load {}: {}", path.display(), e);
            T::default()
        }
    }
}
