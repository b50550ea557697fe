//! Build jobs and their results

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::core::project::ProjectNode;
use crate::core::project_config::ProjectConfig;
use crate::error::{ConfigError, JobError};

/// One project to build
///
/// `name` is the join key used by the scheduler and the result adapters. It
/// is unique within a run, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildJob {
    /// Project name (directory basename)
    pub name: String,
    /// Working directory for the build command
    pub path: PathBuf,
    /// Build command argv
    pub command: Vec<String>,
    /// Declared "build after" names
    pub after: Vec<String>,
    /// Directories exported to later waves, relative to `path`
    pub exports: Vec<PathBuf>,
}

impl BuildJob {
    /// Create a job with no dependencies or exports
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, command: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            command,
            after: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Set the "build after" names
    #[must_use]
    pub fn with_after<I, S>(mut self, after: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after = after.into_iter().map(Into::into).collect();
        self
    }

    /// Set the exported directories
    #[must_use]
    pub fn with_exports(mut self, exports: Vec<PathBuf>) -> Self {
        self.exports = exports;
        self
    }

    /// Build a job from a discovered node and its configuration
    pub fn from_node(node: &ProjectNode, config: &ProjectConfig, default_command: &[String]) -> Self {
        let command = config
            .command()
            .unwrap_or_else(|| default_command.to_vec());

        Self::new(node.name(), node.path.clone(), command)
            .with_after(config.build.after.iter().cloned())
            .with_exports(config.exports())
    }

    /// Absolute export directories
    pub fn export_dirs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.exports.iter().map(|dir| resolve(&self.path, dir))
    }
}

/// Load the configuration of every target and turn it into a job
///
/// # Errors
///
/// Returns the first configuration error encountered.
pub fn load_jobs(
    targets: &[ProjectNode],
    default_command: &[String],
) -> Result<Vec<BuildJob>, ConfigError> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(targets.len());

    for node in targets {
        let config = ProjectConfig::load(&node.path)?;
        let job = BuildJob::from_node(node, &config, default_command);
        if !seen.insert(job.name.clone()) {
            tracing::warn!(
                "Project name '{}' appears more than once ({}); dependencies on it are ambiguous",
                job.name,
                job.path.display()
            );
        }
        jobs.push(job);
    }

    Ok(jobs)
}

fn resolve(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    }
}

/// Outcome of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// The job that ran
    pub job: BuildJob,
    /// Combined stdout/stderr, one `\n` per line
    pub output: Vec<u8>,
    /// `None` on success
    pub error: Option<JobError>,
    /// Wall-clock time from start to finish
    pub duration: Duration,
}

impl BuildResult {
    /// Whether the build succeeded
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Captured output as text
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// A result tagged with the wave it ran in (0-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveResult {
    /// Wave index
    pub wave: usize,
    /// Job outcome
    pub result: BuildResult,
}
