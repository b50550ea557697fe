//! Global configuration management
//!
//! Reads user-level defaults from `config.toml` in the config directory.
//! Values here sit below the ecosystem root's `eco.toml` and the command line.

use crate::error::ConfigError;
use crate::infra::dirs::EcoDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Global configuration for ecoctl
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// Default build options
    #[serde(default)]
    pub build: BuildDefaults,
}

/// Default build options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BuildDefaults {
    /// Default number of parallel jobs
    pub jobs: Option<usize>,

    /// Stop after the first failing wave by default
    pub fail_fast: Option<bool>,

    /// Build command for projects that declare none
    pub command: Option<Vec<String>>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// contains invalid TOML.
    pub fn load(dirs: &EcoDirs) -> Result<Self, ConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}
