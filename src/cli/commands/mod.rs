//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod list;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::OutputConfig;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the projects in scope, in dependency waves
    Build {
        /// Maximum number of parallel builds
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Build only projects whose name matches this glob
        #[arg(long, value_name = "GLOB")]
        filter: Option<String>,

        /// Skip projects whose name matches any of these globs
        #[arg(long, value_name = "GLOB", value_delimiter = ',')]
        exclude: Vec<String>,

        /// Stop dispatching later waves after the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Show the build plan without running anything
        #[arg(long)]
        dry_run: bool,

        /// Show a live view of the running builds
        #[arg(short, long)]
        interactive: bool,

        /// Treat unsatisfiable build order as an error
        #[arg(long)]
        strict: bool,
    },

    /// List the projects in scope
    List,
}

impl Commands {
    /// Execute the command
    pub async fn run(self, output: &OutputConfig) -> Result<()> {
        match self {
            Self::Build {
                jobs,
                filter,
                exclude,
                fail_fast,
                dry_run,
                interactive,
                strict,
            } => {
                let current_dir = std::env::current_dir()?;
                let options = build::BuildOptions {
                    jobs,
                    filter,
                    exclude,
                    fail_fast,
                    dry_run,
                    interactive,
                    strict,
                };
                build::execute(&current_dir, options, output).await
            }
            Self::List => {
                let current_dir = std::env::current_dir()?;
                list::execute(&current_dir, output)
            }
        }
    }
}

/// Discover the inventory around `cwd` and resolve the projects in scope
fn resolve_cwd_scope(cwd: &std::path::Path) -> Result<crate::core::scope::Scope> {
    use anyhow::Context;

    let cwd = cwd
        .canonicalize()
        .with_context(|| format!("Failed to resolve working directory {}", cwd.display()))?;
    let inventory = crate::infra::discovery::discover(&cwd)
        .with_context(|| format!("Failed to discover projects from {}", cwd.display()))?;
    tracing::debug!("Discovered {} project(s)", inventory.nodes.len());

    Ok(crate::core::scope::resolve_scope(&cwd, &inventory))
}
