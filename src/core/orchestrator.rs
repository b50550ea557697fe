//! Build orchestration logic
//!
//! Coordinates the build across waves: wave `k + 1` is dispatched only after
//! the event stream of wave `k` has closed. Results are tagged with the wave
//! they ran in. With fail-fast, no further wave is dispatched once a wave saw
//! a failure; builds already running in that wave are not interrupted.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::event::{BuildEvent, EventSink};
use crate::core::executor::{BuildExecutor, ExecutorOptions, ResourceOptions};
use crate::core::job::{BuildJob, WaveResult};
use crate::core::scheduler::{DependencySpec, WaveScheduler};
use crate::error::{BuildError, JobError, SchedulerError};
use crate::infra::process::Spawner;

/// Orchestrator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Maximum concurrent builds within a wave
    pub max_parallel: usize,
    /// Stop dispatching waves after the first failure
    pub fail_fast: bool,
    /// Reject unsatisfiable dependencies instead of forcing a final wave
    pub strict: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            max_parallel: num_cpus::get(),
            fail_fast: false,
            strict: false,
        }
    }
}

/// Ordered waves ready to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    waves: Vec<Vec<BuildJob>>,
    forced_wave: Option<usize>,
    has_dependencies: bool,
}

impl BuildPlan {
    /// The waves, in dispatch order
    pub fn waves(&self) -> &[Vec<BuildJob>] {
        &self.waves
    }

    /// Number of jobs across all waves
    pub fn total(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    /// Whether the plan is empty
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Wave produced by the cycle fallback, if any
    pub fn forced_wave(&self) -> Option<usize> {
        self.forced_wave
    }

    /// Whether any job declares a dependency on another job in the plan
    pub fn has_dependencies(&self) -> bool {
        self.has_dependencies
    }

    /// Job names per wave
    pub fn build_order(&self) -> Vec<Vec<String>> {
        self.waves
            .iter()
            .map(|wave| wave.iter().map(|job| job.name.clone()).collect())
            .collect()
    }
}

/// Aggregate success/failure counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Builds that ran (or were settled as skipped/cancelled) in dispatched waves
    pub total: usize,
    /// Successful builds
    pub success: usize,
    /// Failed builds
    pub failed: usize,
    /// Builds settled without running because fail-fast stopped dispatch
    #[serde(skip_serializing_if = "is_zero")]
    pub skipped: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Parallelism used
    pub parallelism: usize,
    /// Results of dispatched waves, in completion order within each wave
    pub results: Vec<WaveResult>,
    /// Jobs of waves that were never dispatched
    pub not_built: Vec<BuildJob>,
    /// Wave after which fail-fast stopped dispatch
    pub halted_after: Option<usize>,
    /// Whether the run was cancelled
    pub cancelled: bool,
}

impl RunReport {
    /// Aggregate counts over `results`
    pub fn summary(&self) -> Summary {
        let success = self.results.iter().filter(|r| r.result.success()).count();
        let skipped = self
            .results
            .iter()
            .filter(|r| r.result.error == Some(JobError::Skipped))
            .count();
        Summary {
            total: self.results.len(),
            success,
            failed: self.results.len() - success - skipped,
            skipped,
        }
    }

    /// Failed results, including builds skipped by fail-fast
    pub fn failures(&self) -> impl Iterator<Item = &WaveResult> {
        self.results.iter().filter(|r| !r.result.success())
    }

    /// Builds that never ran: skipped in a dispatched wave or never dispatched
    pub fn unbuilt(&self) -> usize {
        self.summary().skipped + self.not_built.len()
    }

    /// Turn the report into the command's terminal status
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] when any build failed or the run was cut short.
    pub fn status(&self) -> Result<Summary, BuildError> {
        let summary = self.summary();
        let skipped = self.unbuilt();

        if self.cancelled {
            return Err(BuildError::Interrupted {
                failed: summary.failed,
                skipped,
            });
        }

        if self.halted_after.is_some() {
            let first = self
                .failures()
                .find(|r| !matches!(r.result.error, Some(JobError::Skipped)))
                .or_else(|| self.failures().next());
            if let Some(first) = first {
                return Err(BuildError::Aborted {
                    project: first.result.job.name.clone(),
                    error: first.result.error.clone().unwrap_or(JobError::Skipped),
                    failed: summary.failed,
                    skipped,
                });
            }
        }

        if summary.failed > 0 {
            return Err(BuildError::Failed {
                failed: summary.failed,
                total: summary.total,
            });
        }

        Ok(summary)
    }
}

/// Drives the executor wave by wave
#[derive(Debug, Clone)]
pub struct WaveOrchestrator {
    executor: BuildExecutor,
    options: OrchestratorOptions,
}

impl WaveOrchestrator {
    /// Create an orchestrator spawning commands through `spawner`
    pub fn new(spawner: Arc<dyn Spawner>, options: OrchestratorOptions) -> Self {
        Self {
            executor: BuildExecutor::new(spawner),
            options,
        }
    }

    /// Orchestrator settings
    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Compute the wave plan without running anything
    ///
    /// # Errors
    ///
    /// Returns `CircularDependency` in strict mode when the order cannot be satisfied.
    pub fn plan(&self, jobs: Vec<BuildJob>) -> Result<BuildPlan, SchedulerError> {
        let names: HashSet<&str> = jobs.iter().map(|job| job.name.as_str()).collect();
        let has_dependencies = jobs
            .iter()
            .any(|job| job.after.iter().any(|dep| names.contains(dep.as_str())));

        let schedule = WaveScheduler::new()
            .strict(self.options.strict)
            .schedule(&jobs, &DependencySpec::from_jobs(&jobs))?;

        Ok(BuildPlan {
            waves: schedule.waves,
            forced_wave: schedule.forced_wave,
            has_dependencies,
        })
    }

    /// Run every wave of `plan`, reporting progress to `sink`
    pub async fn run(
        &self,
        plan: &BuildPlan,
        cancel: &CancellationToken,
        sink: &mut dyn EventSink,
    ) -> RunReport {
        let total_waves = plan.waves.len();
        let mut resources = ResourceOptions::default();
        let mut report = RunReport {
            parallelism: self.options.max_parallel.max(1),
            ..RunReport::default()
        };

        for (index, wave) in plan.waves.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                report.not_built = plan.waves[index..].concat();
                break;
            }

            tracing::info!(
                "Wave {}/{}: {}",
                index + 1,
                total_waves,
                wave.iter().map(|j| j.name.as_str()).collect::<Vec<_>>().join(", ")
            );
            sink.wave_started(index, total_waves, wave);

            let options = ExecutorOptions {
                max_parallel: report.parallelism,
                continue_on_error: !self.options.fail_fast,
                resources: resources.clone(),
            };
            let mut events = self.executor.execute(wave.clone(), &options, cancel);
            let mut wave_failed = false;

            while let Some(event) = events.recv().await {
                sink.event(&event);
                if let BuildEvent::Finish { result } = event {
                    wave_failed |= !result.success();
                    report.results.push(WaveResult {
                        wave: index,
                        result,
                    });
                }
            }
            sink.wave_finished(index);

            for finished in report
                .results
                .iter()
                .filter(|r| r.wave == index && r.result.success())
            {
                for dir in finished.result.job.export_dirs() {
                    if dir.is_dir() && !resources.extra_path.contains(&dir) {
                        tracing::debug!("Exporting {} to later waves", dir.display());
                        resources.extra_path.push(dir);
                    }
                }
            }

            if cancel.is_cancelled() {
                report.cancelled = true;
                report.not_built = plan.waves[index + 1..].concat();
                break;
            }

            if wave_failed && self.options.fail_fast {
                tracing::warn!("Stopping after wave {} because a build failed", index + 1);
                report.halted_after = Some(index);
                report.not_built = plan.waves[index + 1..].concat();
                break;
            }
        }

        report
    }
}
