//! Platform-specific directory management
//!
//! Provides the platform config directory holding the global `config.toml`.
//! Follows XDG Base Directory Specification on Linux and standard locations on macOS.
//!
//! The `ECOCTL_CONFIG_DIR` environment variable overrides the default.

use std::env;
use std::path::PathBuf;

/// Environment variable name for the config directory override
pub const ENV_CONFIG_DIR: &str = "ECOCTL_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "ecoctl";

/// Global config file name
const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// Platform-specific directory provider for ecoctl
#[derive(Debug, Clone)]
pub struct EcoDirs {
    config_dir: PathBuf,
}

impl EcoDirs {
    /// Create a new `EcoDirs` instance
    ///
    /// Checks the environment variable first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Use an explicit config directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the config directory path
    ///
    /// - Linux: `$XDG_CONFIG_HOME/ecoctl` or `~/.config/ecoctl`
    /// - macOS: `~/Library/Application Support/ecoctl`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Get the global config file path
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(GLOBAL_CONFIG_FILE)
    }

    fn resolve_config_dir() -> PathBuf {
        if let Some(path) = env::var_os(ENV_CONFIG_DIR).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for EcoDirs {
    fn default() -> Self {
        Self::new()
    }
}
