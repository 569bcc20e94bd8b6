//! TOML settings
//!
//! ```toml
//! [storage]
//! root = "/data/dicom"
//! registry = "registry.json"   # relative to root
//! mode = "copy"                 # copy | move | in-place
//!
//! [import]
//! max_parallel = 4
//!
//! [server]
//! bind = "127.0.0.1:8000"
//! page_size = 100
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use crate::error::{DcmIndexError, Result};
use crate::store::{Storage, StorageMode};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub root: PathBuf,
    pub registry: PathBuf,
    pub mode: StorageMode,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dicom-data"),
            registry: PathBuf::from("registry.json"),
            mode: StorageMode::Copy,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Header reader threads; 0 lets rayon decide
    pub max_parallel: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub page_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub import: ImportSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads a settings file; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.page_size == 0 || self.server.page_size > MAX_PAGE_SIZE {
            return Err(DcmIndexError::ConfigError(format!(
                "server.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|_| {
            DcmIndexError::ConfigError(format!("invalid server.bind '{}'", self.server.bind))
        })
    }

    /// Registry snapshot location; relative paths are under the storage root
    pub fn registry_path(&self) -> PathBuf {
        if self.storage.registry.is_absolute() {
            self.storage.registry.clone()
        } else {
            self.storage.root.join(&self.storage.registry)
        }
    }

    pub fn storage(&self) -> Storage {
        Storage::new(self.storage.root.clone(), self.storage.mode)
    }
}
