//! Effective build settings
//!
//! Layers, highest first: command line, the scope root's `eco.toml`, the
//! global `config.toml`, built-in defaults.

use crate::config::defaults;
use crate::core::global_config::GlobalConfig;
use crate::core::orchestrator::OrchestratorOptions;
use crate::core::project_config::BuildSection;

/// Build-related command line flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// `--jobs`
    pub jobs: Option<usize>,
    /// `--fail-fast`
    pub fail_fast: bool,
    /// `--strict`
    pub strict: bool,
    /// `--exclude`
    pub exclude: Vec<String>,
}

/// Resolved settings for one build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Maximum concurrent builds
    pub jobs: usize,
    /// Stop dispatching waves after a failure
    pub fail_fast: bool,
    /// Cycles are errors
    pub strict: bool,
    /// Exclusion globs (root config first, then command line)
    pub exclude: Vec<String>,
    /// Command for projects that declare none
    pub default_command: Vec<String>,
}

impl BuildSettings {
    /// Merge the layers
    pub fn resolve(flags: &BuildFlags, root: &BuildSection, global: &GlobalConfig) -> Self {
        let jobs = flags
            .jobs
            .or(root.jobs)
            .or(global.build.jobs)
            .filter(|&n| n > 0)
            .unwrap_or_else(num_cpus::get);

        let default_command = global
            .build
            .command
            .clone()
            .filter(|argv| !argv.is_empty())
            .unwrap_or_else(|| {
                defaults::DEFAULT_BUILD_COMMAND
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            });

        Self {
            jobs,
            fail_fast: flags.fail_fast
                || root.fail_fast.or(global.build.fail_fast).unwrap_or(false),
            strict: flags.strict || root.strict.unwrap_or(false),
            exclude: root
                .exclude
                .iter()
                .chain(&flags.exclude)
                .cloned()
                .collect(),
            default_command,
        }
    }

    /// Orchestrator options derived from these settings
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            max_parallel: self.jobs,
            fail_fast: self.fail_fast,
            strict: self.strict,
        }
    }
}
