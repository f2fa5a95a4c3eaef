//! Host configuration
//!
//! Geometry of the volumes mounted at boot and the starting directory,
//! loaded from TOML:
//!
//! ```toml
//! cwd = "/flash"
//!
//! [flash]
//! total_sectors = 2048
//! sectors_per_cluster = 8
//!
//! [[mounts]]
//! path = "/sd"
//! readonly = true
//! geometry = { total_sectors = 65536, sectors_per_cluster = 64 }
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::fs::FatGeometry;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// An extra volume mounted after the internal flash.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MountConfig {
    pub path: String,
    #[serde(default)]
    pub geometry: FatGeometry,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OsConfig {
    /// Directory to change into after mounting
    pub cwd: String,
    /// Internal flash volume, mounted at `/flash`
    pub flash: FatGeometry,
    pub mounts: Vec<MountConfig>,
}

impl Default for OsConfig {
    fn default() -> Self {
        Self {
            cwd: "/flash".to_string(),
            flash: FatGeometry::default(),
            mounts: Vec::new(),
        }
    }
}

impl OsConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
