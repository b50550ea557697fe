//! Build command implementation
//!
//! Implements `ecoctl build`: resolve the projects in scope, plan dependency
//! waves and run them through the selected front end.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::cli::adapters::{self, json, progress::ProgressSink, stream::StreamSink};
use crate::cli::output::{create_spinner, status, OutputConfig};
use crate::cli::tui;
use crate::core::event::{EventSink, NullSink};
use crate::core::global_config::GlobalConfig;
use crate::core::job::load_jobs;
use crate::core::orchestrator::{BuildPlan, RunReport, WaveOrchestrator};
use crate::core::project_config::ProjectConfig;
use crate::core::select::JobSelector;
use crate::core::settings::{BuildFlags, BuildSettings};
use crate::infra::dirs::EcoDirs;
use crate::infra::process::SystemSpawner;

/// Build options
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Maximum number of parallel builds
    pub jobs: Option<usize>,
    /// Name glob projects must match
    pub filter: Option<String>,
    /// Name globs to skip
    pub exclude: Vec<String>,
    /// Stop dispatching waves after a failure
    pub fail_fast: bool,
    /// Only print the plan
    pub dry_run: bool,
    /// Live view
    pub interactive: bool,
    /// Unsatisfiable build order is an error
    pub strict: bool,
}

/// Execute the build command
pub async fn execute(cwd: &Path, options: BuildOptions, output: &OutputConfig) -> Result<()> {
    let spinner = (output.show_progress() && output.verbose == 0)
        .then(|| create_spinner("Discovering projects..."));
    let scope = super::resolve_cwd_scope(cwd);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let scope = scope?;

    let root_config = ProjectConfig::load(&scope.root)?;
    let global = GlobalConfig::load(&EcoDirs::new()).context("Failed to load global configuration")?;
    let flags = BuildFlags {
        jobs: options.jobs,
        fail_fast: options.fail_fast,
        strict: options.strict,
        exclude: options.exclude,
    };
    let settings = BuildSettings::resolve(&flags, &root_config.build, &global);

    let selector = JobSelector::new(options.filter.as_deref(), &settings.exclude)?;
    let jobs = selector.apply(load_jobs(&scope.targets, &settings.default_command)?);
    tracing::info!(
        "{} project(s) in scope of {}",
        jobs.len(),
        scope.root.display()
    );

    let orchestrator = WaveOrchestrator::new(
        Arc::new(SystemSpawner::new()),
        settings.orchestrator_options(),
    );
    let plan = orchestrator.plan(jobs)?;

    if options.dry_run {
        return print_plan(&plan, output);
    }

    if plan.is_empty() && !output.json {
        if !output.quiet {
            println!("{} No projects to build", status::INFO);
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping builds");
                cancel.cancel();
            }
        })
    };

    let report = if options.interactive && output.show_progress() {
        tui::run_live(&orchestrator, &plan, &cancel).await?
    } else {
        let mut sink: Box<dyn EventSink> = if !output.show_progress() {
            Box::new(NullSink)
        } else if output.verbose > 0 {
            Box::new(StreamSink::stdout(output.color))
        } else {
            Box::new(ProgressSink::new())
        };
        orchestrator.run(&plan, &cancel, sink.as_mut()).await
    };
    interrupt.abort();

    print_report(&report, output)?;
    report.status()?;
    Ok(())
}

fn print_report(report: &RunReport, output: &OutputConfig) -> Result<()> {
    if output.json {
        println!("{}", json::batch_report(report)?);
    } else if !output.quiet {
        adapters::print_summary(report, &mut io::stdout().lock())?;
    }
    Ok(())
}

fn print_plan(plan: &BuildPlan, output: &OutputConfig) -> Result<()> {
    if output.json {
        println!("{}", json::dry_run_report(plan)?);
        return Ok(());
    }
    if output.quiet {
        return Ok(());
    }

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "Build plan: {} project(s) in {} wave(s)",
        plan.total(),
        plan.waves().len()
    )?;
    for (index, wave) in plan.waves().iter().enumerate() {
        let forced = if plan.forced_wave() == Some(index) {
            " (unresolved dependencies)"
        } else {
            ""
        };
        writeln!(out, "\nWave {}{forced}:", index + 1)?;
        for job in wave {
            write!(out, "  {:<24} {}", job.name, job.path.display())?;
            if !job.after.is_empty() {
                write!(out, "  (after: {})", job.after.join(", "))?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
