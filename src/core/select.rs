//! Job selection by name patterns (`--filter`, `--exclude`)

use glob::Pattern;

use crate::core::job::BuildJob;
use crate::error::ConfigError;

/// Include/exclude glob patterns matched against job names
#[derive(Debug, Default, Clone)]
pub struct JobSelector {
    include: Option<Pattern>,
    exclude: Vec<Pattern>,
}

fn compile(pattern: &str) -> Result<Pattern, ConfigError> {
    Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })
}

impl JobSelector {
    /// Compile the patterns
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` for malformed globs.
    pub fn new<S: AsRef<str>>(include: Option<&str>, exclude: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: include.map(compile).transpose()?,
            exclude: exclude
                .iter()
                .map(AsRef::as_ref)
                .filter(|p| !p.trim().is_empty())
                .map(|p| compile(p.trim()))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Whether a job name is selected
    pub fn matches(&self, name: &str) -> bool {
        self.include.as_ref().map_or(true, |p| p.matches(name))
            && !self.exclude.iter().any(|p| p.matches(name))
    }

    /// Keep the selected jobs, preserving order
    pub fn apply(&self, jobs: Vec<BuildJob>) -> Vec<BuildJob> {
        jobs.into_iter()
            .filter(|job| {
                let keep = self.matches(&job.name);
                if !keep {
                    tracing::debug!("Skipping {} (filtered out)", job.name);
                }
                keep
            })
            .collect()
    }
}
