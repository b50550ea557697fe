//! Batch JSON reports
//!
//! Rendered once after the run (or the dry run) has finished.

use std::path::Path;

use serde::Serialize;

use crate::core::orchestrator::{BuildPlan, RunReport, Summary};

#[derive(Serialize)]
struct BuildReport<'a> {
    mode: &'static str,
    jobs: usize,
    results: Vec<JobRecord<'a>>,
    summary: Summary,
}

#[derive(Serialize)]
struct JobRecord<'a> {
    name: &'a str,
    path: &'a Path,
    /// 1-based
    wave: usize,
    success: bool,
    /// Seconds
    duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum PlanReport {
    Waves {
        mode: &'static str,
        waves: usize,
        total: usize,
        build_order: Vec<Vec<String>>,
    },
    Flat {
        projects: Vec<String>,
    },
}

/// Render the results of a finished run
///
/// Captured output is only included for failed builds.
pub fn batch_report(report: &RunReport) -> serde_json::Result<String> {
    let results = report
        .results
        .iter()
        .map(|r| JobRecord {
            name: &r.result.job.name,
            path: &r.result.job.path,
            wave: r.wave + 1,
            success: r.result.success(),
            duration: r.result.duration.as_secs_f64(),
            error: r.result.error.as_ref().map(ToString::to_string),
            output: (!r.result.success()).then(|| r.result.output_text()),
        })
        .collect();

    serde_json::to_string_pretty(&BuildReport {
        mode: "build",
        jobs: report.parallelism,
        results,
        summary: report.summary(),
    })
}

/// Render a dry-run plan
///
/// Without any in-set dependency the wave structure carries no information,
/// so only the project names are listed.
pub fn dry_run_report(plan: &BuildPlan) -> serde_json::Result<String> {
    let report = if plan.has_dependencies() {
        PlanReport::Waves {
            mode: "dry-run",
            waves: plan.waves().len(),
            total: plan.total(),
            build_order: plan.build_order(),
        }
    } else {
        PlanReport::Flat {
            projects: plan.build_order().concat(),
        }
    };
    serde_json::to_string_pretty(&report)
}
