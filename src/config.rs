//! Runtime configuration from `mailseal.toml`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::delivery::DeliveryConfig;
use crate::error::{Error, Result};
use crate::transport::smtp::SmtpConfig;

/// Top-level configuration. Every section has working defaults, so a
/// missing file is not an error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub delivery: DeliveryConfig,
    pub smtp: SmtpConfig,
    pub store: StoreConfig,
}

/// Identity store location, the `[store]` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// The configured directory, or the platform config directory.
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let dirs = ProjectDirs::from("dev", "mailseal", "mailseal")
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
        Ok(dirs.config_dir().join("identities"))
    }
}

impl Config {
    /// Load `mailseal.toml` from the given path or the current directory.
    /// Returns defaults when the file does not exist. Unknown cipher names
    /// are rejected here, at load time, never at send time.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = match config_path {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from("mailseal.toml"),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::from_file(&path)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }
}
