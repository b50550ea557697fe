//! Per-project configuration (`eco.toml`)
//!
//! Each project may carry an `eco.toml` declaring its build command, the
//! projects it must be built after, and the directories it exports to later
//! waves. An ecosystem root marks itself with an `[ecosystem]` table and may
//! set run-wide defaults in its `[build]` table.
//!
//! ```toml
//! [ecosystem]
//! name = "acme"
//!
//! [build]
//! command = ["make", "build"]
//! after = ["core-lib"]
//! exports = ["bin"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::error::ConfigError;

/// Parsed `eco.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Present only on ecosystem roots
    #[serde(default)]
    pub ecosystem: Option<EcosystemSection>,

    /// Build settings
    #[serde(default)]
    pub build: BuildSection,
}

/// `[ecosystem]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EcosystemSection {
    /// Display name of the ecosystem
    #[serde(default)]
    pub name: Option<String>,
}

/// `[build]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BuildSection {
    /// Build command (argv array or whitespace-separated string)
    #[serde(default)]
    pub command: Option<CommandSpec>,

    /// Names of projects that must be built first
    #[serde(default)]
    pub after: Vec<String>,

    /// Directories (relative to the project) prepended to PATH for later waves
    #[serde(default)]
    pub exports: Option<Vec<PathBuf>>,

    /// Default parallelism (read from the scope root)
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Default fail-fast policy (read from the scope root)
    #[serde(default)]
    pub fail_fast: Option<bool>,

    /// Treat unsatisfiable dependencies as an error (read from the scope root)
    #[serde(default)]
    pub strict: Option<bool>,

    /// Default exclusion globs (read from the scope root)
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Build command as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CommandSpec {
    /// `command = ["cargo", "build", "--release"]`
    Argv(Vec<String>),
    /// `command = "cargo build --release"`, split with POSIX shell quoting
    Line(String),
}

impl CommandSpec {
    /// Convert to an argv vector
    ///
    /// Returns `None` when a command line has unbalanced quotes.
    pub fn to_argv(&self) -> Option<Vec<String>> {
        match self {
            Self::Argv(argv) => Some(argv.clone()),
            Self::Line(line) => shlex::split(line),
        }
    }
}

impl ProjectConfig {
    /// Path of the config file inside a project directory
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(defaults::PROJECT_CONFIG_FILE)
    }

    /// Load the config of a project directory
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// declares an empty build command.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(dir);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content, &path)
    }

    /// Parse config content; `path` is used for error messages only
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        if let Some(command) = &config.build.command {
            match command.to_argv() {
                None => {
                    return Err(ConfigError::ParseError {
                        path: path.to_path_buf(),
                        error: "unbalanced quotes in build command".to_string(),
                    })
                }
                Some(argv) if argv.is_empty() => {
                    return Err(ConfigError::EmptyCommand {
                        path: path.to_path_buf(),
                    })
                }
                Some(_) => {}
            }
        }

        Ok(config)
    }

    /// Whether this config marks an ecosystem root
    pub fn is_ecosystem(&self) -> bool {
        self.ecosystem.is_some()
    }

    /// Declared build command, if any
    pub fn command(&self) -> Option<Vec<String>> {
        self.build.command.as_ref().and_then(CommandSpec::to_argv)
    }

    /// Export directories, falling back to the defaults
    pub fn exports(&self) -> Vec<PathBuf> {
        self.build.exports.clone().unwrap_or_else(|| {
            defaults::DEFAULT_EXPORT_DIRS
                .iter()
                .map(PathBuf::from)
                .collect()
        })
    }
}
