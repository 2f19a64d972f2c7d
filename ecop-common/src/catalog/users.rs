//! User directory: credentials and poem assignments

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::poem_id::PoemId;
use crate::Result;

/// An annotator account
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    password: String,
    pub assigned_poems: Vec<PoemId>,
    pub use_random_recommendations: bool,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        assigned_poems: Vec<PoemId>,
        use_random_recommendations: bool,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            assigned_poems,
            use_random_recommendations,
        }
    }

    /// Plaintext comparison, as stored in `users.json`
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

// Keeps passwords out of logs
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("assigned_poems", &self.assigned_poems)
            .field("use_random_recommendations", &self.use_random_recommendations)
            .finish()
    }
}

/// On-disk shape of one `users.json` entry
#[derive(Debug, Deserialize)]
struct UserRecord {
    password: String,
    #[serde(default)]
    assigned_poems: Vec<String>,
    #[serde(default)]
    use_random_recommendations: bool,
}

/// All known users, keyed by username
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.username.clone(), u)).collect(),
        }
    }

    /// Parse a JSON object `username -> {password, assigned_poems, use_random_recommendations}`
    ///
    /// Assigned identifiers that do not parse are dropped with a warning so one
    /// bad entry does not lock the annotator out.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let records: HashMap<String, UserRecord> = serde_json::from_reader(reader)?;

        let users = records.into_iter().map(|(username, record)| {
            let assigned_poems = record
                .assigned_poems
                .iter()
                .filter_map(|raw| match PoemId::parse(raw) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!("User {}: skipping assigned poem: {}", username, e);
                        None
                    }
                })
                .collect();

            User {
                username,
                password: record.password,
                assigned_poems,
                use_random_recommendations: record.use_random_recommendations,
            }
        });

        Ok(Self::from_users(users))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
