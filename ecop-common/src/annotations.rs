//! Append-only annotation store
//!
//! Each storage partition is a JSON array file: one file per user in the
//! default layout, or a single file shared by everyone. Appends are a
//! read-modify-write of the whole file, so every partition has its own async
//! mutex and at most one writer at a time. The new contents are written to a
//! temporary sibling and renamed over the old file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::config::DataPaths;
use crate::poem_id::PoemId;
use crate::{Error, Result};

const USER_FILE: &str = "annotations.json";

/// Labels keyed by neighbor, in the order the neighbors were recommended
pub type Labels = IndexMap<PoemId, String>;

/// One completed annotation: every neighbor of `poem` labelled by `user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub user: String,
    pub poem: PoemId,
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_at: Option<DateTime<Utc>>,
}

impl Annotation {
    pub fn new(user: impl Into<String>, poem: PoemId, labels: Labels) -> Self {
        Self {
            user: user.into(),
            poem,
            labels,
            annotated_at: Some(Utc::now()),
        }
    }
}

/// How annotation records are partitioned on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLayout {
    /// `annotations/<user>/annotations.json`
    #[default]
    PerUser,
    /// A single `annotations.json` for every user
    Shared,
}

pub struct AnnotationStore {
    layout: AnnotationLayout,
    annotations_dir: PathBuf,
    shared_path: PathBuf,
    partition_locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl AnnotationStore {
    pub fn new(paths: &DataPaths, layout: AnnotationLayout) -> Self {
        Self {
            layout,
            annotations_dir: paths.annotations_dir(),
            shared_path: paths.shared_annotations_path(),
            partition_locks: Mutex::new(HashMap::new()),
        }
    }

    /// File holding `username`'s records
    pub fn partition_path(&self, username: &str) -> Result<PathBuf> {
        validate_username(username)?;
        Ok(match self.layout {
            AnnotationLayout::PerUser => self.annotations_dir.join(username).join(USER_FILE),
            AnnotationLayout::Shared => self.shared_path.clone(),
        })
    }

    /// All records of `username`, oldest first
    pub async fn load(&self, username: &str) -> Result<Vec<Annotation>> {
        let path = self.partition_path(username)?;
        let records = read_partition(&path).await?;
        Ok(match self.layout {
            AnnotationLayout::PerUser => records,
            AnnotationLayout::Shared => records.into_iter().filter(|a| a.user == username).collect(),
        })
    }

    /// Poems `username` has already annotated
    pub async fn annotated_poems(&self, username: &str) -> Result<HashSet<PoemId>> {
        Ok(self
            .load(username)
            .await?
            .into_iter()
            .map(|a| a.poem)
            .collect())
    }

    /// Append one record and persist it before returning
    ///
    /// Existing records are written back untouched. The record is saved only
    /// if this returns `Ok`.
    pub async fn append(&self, annotation: Annotation) -> Result<()> {
        let path = self.partition_path(&annotation.user)?;
        let lock = self.lock_for(&path);
        let _guard = lock.lock().await;

        let mut records = read_partition(&path).await?;
        records.push(annotation);
        write_partition(&path, &records).await?;

        if let Some(last) = records.last() {
            info!(
                "Saved annotation of {} by {} ({} labels, {} records in {})",
                last.poem,
                last.user,
                last.labels.len(),
                records.len(),
                path.display()
            );
        }
        Ok(())
    }

    fn lock_for(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        // Poisoning only happens if a holder panicked; the map is still usable
        let mut locks = self
            .partition_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// Usernames become path components in the per-user layout
fn validate_username(username: &str) -> Result<()> {
    let invalid = username.is_empty()
        || username == "."
        || username == ".."
        || username.contains(['/', '\\', '\0']);
    if invalid {
        return Err(Error::InvalidInput(format!(
            "Username {:?} cannot be used as a storage partition",
            username
        )));
    }
    Ok(())
}

async fn read_partition(path: &Path) -> Result<Vec<Annotation>> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No annotations yet at {}", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_partition(path: &Path, records: &[Annotation]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &buf).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
