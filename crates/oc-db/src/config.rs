use std::path::{Path, PathBuf};

use oc_store::{FileStoreConfig, SyncMode};
use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// Database configuration, usually read from a TOML file.
///
/// ```toml
/// data_path = "/var/lib/openclimate/oc.log"
/// sync_mode = "every_write"
/// compact_on_open = true
/// ```
///
/// Without a `data_path` the database lives in memory only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    pub sync_mode: SyncMode,
    pub compact_on_open: bool,
}

impl DbConfig {
    /// A configuration for an in-memory database.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A configuration for a file-backed database at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> DbResult<Self> {
        toml::from_str(s).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> DbResult<String> {
        toml::to_string(self).map_err(|e| DbError::Config(e.to_string()))
    }

    pub(crate) fn file_store_config(&self) -> FileStoreConfig {
        FileStoreConfig {
            sync_mode: self.sync_mode,
            compact_on_open: self.compact_on_open,
        }
    }
}
