//! ecoctl - meta-CLI for multi-repository ecosystems
//!
//! Entry point for the ecoctl command-line application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ecoctl::cli::output::{display_error, logs, OutputConfig};
use ecoctl::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = OutputConfig::new(cli.quiet, cli.json, cli.verbose);

    // Logs go to stderr so stdout stays parseable with --json; the live view
    // holds them back while it owns the terminal
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(output.log_level().into())
                .from_env_lossy(),
        )
        .with_writer(logs::writer)
        .with_target(false)
        .init();

    // Run the command and handle errors
    match cli.run(&output).await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e, &output);
            std::process::exit(1);
        }
    }
}
