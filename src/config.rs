//! Pipeline configuration
//!
//! Values come from an optional YAML file; command-line flags override
//! them. Every field has a default except the input CSV, which is only
//! needed when loading.

use crate::storage::JoinMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No input CSV configured")]
    MissingCsvPath,
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input CSV file
    pub csv_path: Option<PathBuf>,
    /// SQLite database file
    pub db_path: PathBuf,
    /// Delete the database file before loading
    pub fresh_db: bool,
    /// How the joined table is built
    pub join_mode: JoinMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            db_path: default_db_path(),
            fresh_db: false,
            join_mode: JoinMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a YAML config file; absent fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn csv_path(&self) -> Result<&Path, ConfigError> {
        self.csv_path.as_deref().ok_or(ConfigError::MissingCsvPath)
    }
}

/// Get the default database path (~/.local/share/cohorts/cohorts.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("cohorts").join("cohorts.db")
}
