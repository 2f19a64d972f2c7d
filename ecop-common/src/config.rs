//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! compiled defaults are used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::annotations::AnnotationLayout;
use crate::poem_id::DEFAULT_EXTENSION;
use crate::{Error, Result};

/// Environment variable overriding the data root folder
pub const ROOT_FOLDER_ENV: &str = "ECOP_ROOT_FOLDER";

/// Default TOML file name looked up under the user config directory
pub const CONFIG_FILE_NAME: &str = "ecop-annotator.toml";

pub const USERS_FILE: &str = "users.json";
pub const TITLES_FILE: &str = "original_to_formatted_titles.csv";
pub const SIMILARITY_FILE: &str = "similarity_matrix.csv";
pub const RANDOM_SIMILARITY_FILE: &str = "similarity_random.csv";
pub const CORPUS_DIR: &str = "corpus";
pub const ANNOTATIONS_DIR: &str = "annotations";
pub const SHARED_ANNOTATIONS_FILE: &str = "annotations.json";

/// OS-dependent default data root (`<data dir>/ecop`)
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ecop"))
        .unwrap_or_else(|| PathBuf::from("./ecop_data"))
}

/// Default location of the TOML config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ecop").join(CONFIG_FILE_NAME))
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5730
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poem_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_session_ttl_minutes() -> u64 {
    12 * 60
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Data root holding the tables, the corpus and the annotations
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Secret used to derive CSRF tokens; generated per process when absent
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Extension appended when rebuilding identifiers from URLs
    #[serde(default = "default_poem_extension")]
    pub poem_extension: String,

    #[serde(default)]
    pub annotation_layout: AnnotationLayout,

    /// Idle time after which a login session expires
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_address: default_bind_address(),
            port: default_port(),
            secret_key: None,
            poem_extension: default_poem_extension(),
            annotation_layout: AnnotationLayout::default(),
            session_ttl_minutes: default_session_ttl_minutes(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    Ok(toml::from_str(&content)?)
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
    /// A config file was given or found but could not be used
    Fallback { path: PathBuf, reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    /// Log where the configuration came from
    ///
    /// Call once the tracing subscriber is installed.
    pub fn log_source(&self) {
        match &self.source {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => info!("No config file found, using compiled defaults"),
            ConfigSource::Fallback { path, reason } => {
                warn!("Ignoring config {}: {} (using compiled defaults)", path.display(), reason)
            }
        }
    }
}

/// Load the TOML config, falling back to defaults
///
/// Without an explicit path the default location is tried; its absence is
/// not an error. An explicit path that cannot be read or parsed falls back too.
pub fn load_toml_config_or_default(explicit: Option<&Path>) -> LoadedConfig {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                return LoadedConfig {
                    config: TomlConfig::default(),
                    source: ConfigSource::Defaults,
                }
            }
        },
    };

    match load_toml_config(&path) {
        Ok(config) => LoadedConfig {
            config,
            source: ConfigSource::File(path),
        },
        Err(e) => LoadedConfig {
            config: TomlConfig::default(),
            source: ConfigSource::Fallback {
                path,
                reason: e.to_string(),
            },
        },
    }
}

/// Resolves the data root folder
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self {
            cli_arg: None,
            toml_value: None,
        }
    }

    /// Value given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Value found in the TOML config
    pub fn with_toml_value(mut self, path: Option<PathBuf>) -> Self {
        self.toml_value = path;
        self
    }

    /// Resolve following CLI > ENV > TOML > compiled default
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        default_root_folder()
    }
}

impl Default for RootFolderResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// File layout under the data root
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn users_path(&self) -> PathBuf {
        self.root.join(USERS_FILE)
    }

    pub fn titles_path(&self) -> PathBuf {
        self.root.join(TITLES_FILE)
    }

    pub fn similarity_path(&self) -> PathBuf {
        self.root.join(SIMILARITY_FILE)
    }

    pub fn random_similarity_path(&self) -> PathBuf {
        self.root.join(RANDOM_SIMILARITY_FILE)
    }

    pub fn corpus_dir(&self) -> PathBuf {
        self.root.join(CORPUS_DIR)
    }

    pub fn annotations_dir(&self) -> PathBuf {
        self.root.join(ANNOTATIONS_DIR)
    }

    pub fn shared_annotations_path(&self) -> PathBuf {
        self.root.join(SHARED_ANNOTATIONS_FILE)
    }

    /// Create the root and annotations directories if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.annotations_dir())?;
        Ok(())
    }
}
