//! Configuration types for Folio.
//!
//! This module provides the [`Config`] struct which stores user
//! preferences. Configuration is persisted as TOML (typically at
//! `~/.config/folio/config.toml` on Unix systems).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `Config` is a data structure that represents the parts of Folio that
/// the user can configure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory the document store keeps its data in.
    pub data_dir: PathBuf,
}

impl Config {
    /// Create a config with the given data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Path of the config file, if a config directory can be determined.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("folio").join("config.toml"))
    }

    /// Default location of the document store.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
    }

    /// Load the config from the default location, falling back to the
    /// default data directory when no config file exists yet.
    pub fn load_or_default() -> Result<Self> {
        use crate::error::FolioError;

        let Some(path) = Self::config_path() else {
            return Err(FolioError::NoConfigDir);
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::new(Self::default_data_dir()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the config to the default location, creating parent
    /// directories as needed.
    pub fn save(&self) -> Result<()> {
        use crate::error::FolioError;

        let Some(path) = Self::config_path() else {
            return Err(FolioError::NoConfigDir);
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_round_trip() {
        let config = Config::new(PathBuf::from("/tmp/folio-data"));
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
    }
}
