//! Result adapters
//!
//! Front ends consuming the build event stream and the final report:
//!
//! - [`json`] - Batch JSON after completion (`--json`)
//! - [`stream`] - Streamed `[name] line` text (`-v`)
//! - [`progress`] - Per-wave progress bars (default)
//!
//! The live view lives in [`crate::cli::tui`].

pub mod json;
pub mod progress;
pub mod stream;

use std::io::{self, Write};

use crate::cli::output::{format_duration, status};
use crate::core::orchestrator::RunReport;
use crate::error::JobError;

/// Print the human-readable end-of-run summary
///
/// Captured output of every failed build is repeated here so it is not lost
/// between progress bars or interleaved streamed lines.
pub fn print_summary(report: &RunReport, out: &mut impl Write) -> io::Result<()> {
    for failure in report.failures() {
        let result = &failure.result;
        let error = result.error.as_ref().map(ToString::to_string).unwrap_or_default();
        writeln!(out)?;
        writeln!(
            out,
            "{} {} ({}): {error}",
            status::ERROR,
            result.job.name,
            result.job.path.display()
        )?;
        // Skipped and cancelled builds never produced output worth repeating
        if !matches!(result.error, Some(JobError::Skipped | JobError::Cancelled)) {
            for line in result.output_text().lines() {
                writeln!(out, "    {line}")?;
            }
        }
    }

    let summary = report.summary();
    let slowest = report
        .results
        .iter()
        .map(|r| r.result.duration)
        .max()
        .unwrap_or_default();

    writeln!(out)?;
    if summary.failed == 0 && report.unbuilt() == 0 && !report.cancelled {
        writeln!(
            out,
            "{} {} project(s) built (slowest {})",
            status::SUCCESS,
            summary.success,
            format_duration(slowest)
        )?;
    } else {
        writeln!(
            out,
            "{} {} built, {} failed, {} not built",
            status::ERROR,
            summary.success,
            summary.failed,
            report.unbuilt()
        )?;
    }
    if report.cancelled {
        writeln!(out, "{} build interrupted", status::WARNING)?;
    }
    Ok(())
}
