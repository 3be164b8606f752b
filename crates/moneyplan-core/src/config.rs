//! Settings file
//!
//! Settings are resolved in two layers:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/moneyplan/config.toml)
//! 2. Built-in defaults for anything the file leaves out (or if there is no file)
//!
//! Command-line flags are applied on top by the CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::db::DatabaseOptions;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
    /// How long a writer waits for the database lock
    pub busy_timeout_ms: u64,
    /// Maximum pooled connections
    pub pool_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("moneyplan.db"),
            log_level: "info".to_string(),
            busy_timeout_ms: 5000,
            pool_size: 10,
        }
    }
}

impl Settings {
    /// Load settings from `path`, the default location, or built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        match candidate {
            Some(p) if p.exists() => {
                debug!("Loading settings from {}", p.display());
                let content = fs::read_to_string(&p)?;
                Self::parse(&content)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Parse a TOML settings document
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        if settings.pool_size == 0 {
            return Err(Error::InvalidData(
                "pool_size must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn database_options(&self) -> DatabaseOptions {
        DatabaseOptions {
            pool_size: self.pool_size,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

/// Default settings location in the platform data dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("moneyplan").join("config.toml"))
}
