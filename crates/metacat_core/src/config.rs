//! Catalog configuration.
//!
//! Configuration is a small JSON document:
//!
//! ```json
//! { "db_path": "/data/catalog.sqlite3", "busy_timeout_ms": 5000,
//!   "log_level": "info", "log_dir": "/var/log/metacat" }
//! ```
//!
//! Every key is optional; without `db_path` the catalog lives in memory.
//! Unknown keys are rejected.

use crate::engine::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// SQLite catalog file; `None` opens an in-memory catalog.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// How long a writer waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Log level; the build-mode default applies when absent.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when absent.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_level: None,
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    /// Configuration for a catalog file with default settings.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(db_path.into()),
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(raw: &str) -> CatalogResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| CatalogError::Config(format!("invalid catalog config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    ///
    /// A relative `db_path` is resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            CatalogError::Config(format!("failed to read `{}`: {err}", path.display()))
        })?;
        let mut config = Self::from_json_str(&raw)?;
        if let (Some(db_path), Some(parent)) = (config.db_path.as_mut(), path.parent()) {
            if db_path.is_relative() {
                *db_path = parent.join(&*db_path);
            }
        }
        Ok(config)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    fn validate(&self) -> CatalogResult<()> {
        if let Some(db_path) = &self.db_path {
            if db_path.as_os_str().is_empty() {
                return Err(CatalogError::Config("db_path cannot be empty".to_string()));
            }
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(CatalogError::Config(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CatalogConfig;
    use std::time::Duration;

    #[test]
    fn minimal_document_takes_defaults() {
        let config = CatalogConfig::from_json_str(r#"{"db_path": "/tmp/catalog.sqlite3"}"#).unwrap();
        assert_eq!(config, CatalogConfig::new("/tmp/catalog.sqlite3"));
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn empty_document_means_in_memory_catalog() {
        let config = CatalogConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert!(config.db_path.is_none());
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CatalogConfig::from_json_str(r#"{"db_path": "a.db", "dbpath": "b.db"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("dbpath"));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CatalogConfig::from_json_str(r#"{"db_path": "a.db", "log_dir": "logs"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn empty_db_path_is_rejected() {
        assert!(CatalogConfig::from_json_str(r#"{"db_path": ""}"#).is_err());
    }
}
