//! Error types for ecoctl
//!
//! Domain-specific error types using thiserror. Per-project build failures
//! are data ([`JobError`] travels inside a build result); everything else here
//! is a command-level error.

use std::path::PathBuf;
use thiserror::Error;

/// Project discovery errors
///
/// Always fatal: nothing is built when the inventory cannot be enumerated.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Start directory does not exist or is not a directory
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// IO error while walking the filesystem
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },

    /// A project configuration file could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration errors (`eco.toml`, global `config.toml`, selection patterns)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// Build command is present but empty
    #[error("Build command in '{path}' is empty")]
    EmptyCommand { path: PathBuf },

    /// Invalid glob pattern in --filter / --exclude
    #[error("Invalid pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },
}

/// Wave scheduling errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Dependencies can never be satisfied (cycle or dangling reference), strict mode only
    #[error("Circular dependency between: {}", jobs.join(", "))]
    CircularDependency { jobs: Vec<String> },
}

/// Failure of a single project build
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The build command could not be started
    #[error("failed to start '{program}': {error}")]
    Spawn { program: String, error: String },

    /// The build command exited unsuccessfully
    #[error("exited with status {code}")]
    Exit { code: i32 },

    /// The build command was terminated by a signal
    #[error("terminated by signal")]
    Signal,

    /// Reading the command's output or waiting on it failed
    #[error("I/O error: {error}")]
    Io { error: String },

    /// The run was cancelled before or while this build ran
    #[error("cancelled")]
    Cancelled,

    /// Not started because another build in the same wave failed (fail-fast)
    #[error("skipped after an earlier failure in the same wave")]
    Skipped,
}

/// Terminal build command errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// One or more builds failed
    #[error("{failed} of {total} build(s) failed")]
    Failed { failed: usize, total: usize },

    /// Fail-fast stopped the run after a failure
    #[error("Build failed for project '{project}': {error} ({failed} failed, {skipped} project(s) not built)")]
    Aborted {
        project: String,
        error: JobError,
        failed: usize,
        skipped: usize,
    },

    /// The run was interrupted
    #[error("Build interrupted ({failed} failed, {skipped} project(s) not built)")]
    Interrupted { failed: usize, skipped: usize },
}
