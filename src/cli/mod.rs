//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod adapters;
pub mod commands;
pub mod output;
pub mod tui;

use anyhow::Result;
use clap::Parser;

use commands::Commands;
use output::OutputConfig;

/// `--version` detail emitted by the build script
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("VERGEN_GIT_SHA"),
    "\ntarget: ",
    env!("VERGEN_CARGO_TARGET_TRIPLE"),
    "\nrustc: ",
    env!("VERGEN_RUSTC_SEMVER"),
    "\nbuilt: ",
    env!("VERGEN_BUILD_TIMESTAMP"),
);

/// ecoctl - build and inspect a multi-repository ecosystem
///
/// Discovers the projects of an ecosystem and builds the ones in scope of the
/// current directory in dependency order.
#[derive(Parser, Debug)]
#[command(name = "ecoctl")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v streams build output and info logs, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self, output: &OutputConfig) -> Result<()> {
        if let Some(cmd) = self.command {
            cmd.run(output).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
