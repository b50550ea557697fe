//! Dependency wave scheduling
//!
//! Splits a job set into waves: every job lands in the first wave after all
//! of its in-set "build after" dependencies. Jobs inside a wave keep their
//! input order, so the decomposition is deterministic.

use std::collections::{HashMap, HashSet};

use crate::core::job::BuildJob;
use crate::error::SchedulerError;

/// "Build after" declarations keyed by job name
#[derive(Debug, Default, Clone)]
pub struct DependencySpec {
    /// job name -> names it must follow
    after: HashMap<String, Vec<String>>,
}

impl DependencySpec {
    /// Create an empty dependency map
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the declarations carried by the jobs themselves
    pub fn from_jobs(jobs: &[BuildJob]) -> Self {
        let mut spec = Self::new();
        for job in jobs {
            spec.add(&job.name, job.after.clone());
        }
        spec
    }

    /// Declare that `name` must follow `dependencies`
    pub fn add(&mut self, name: &str, dependencies: Vec<String>) {
        self.after.insert(name.to_string(), dependencies);
    }

    /// Declared dependencies of `name` (empty when none)
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.after.get(name).map_or(&[], Vec::as_slice)
    }
}

/// Result of scheduling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Ordered waves
    pub waves: Vec<Vec<BuildJob>>,
    /// Index of the wave produced by the cycle fallback, if it was used
    pub forced_wave: Option<usize>,
}

impl Schedule {
    /// Job names per wave
    pub fn build_order(&self) -> Vec<Vec<String>> {
        self.waves
            .iter()
            .map(|wave| wave.iter().map(|job| job.name.clone()).collect())
            .collect()
    }
}

/// Breadth-level topological scheduler
#[derive(Debug, Default, Clone, Copy)]
pub struct WaveScheduler {
    strict: bool,
}

impl WaveScheduler {
    /// Create a permissive scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Make unsatisfiable dependencies an error instead of forcing a final wave
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Compute the waves for `jobs`
    ///
    /// Dependencies on names outside `jobs` are ignored. When a scan finds no
    /// runnable job while some remain, the remaining jobs form one final wave
    /// (a warning is logged), or `CircularDependency` is returned in strict
    /// mode.
    pub fn schedule(
        &self,
        jobs: &[BuildJob],
        spec: &DependencySpec,
    ) -> Result<Schedule, SchedulerError> {
        let in_set: HashSet<&str> = jobs.iter().map(|job| job.name.as_str()).collect();
        let mut built_names: HashSet<&str> = HashSet::new();
        let mut built = vec![false; jobs.len()];
        let mut remaining = jobs.len();
        let mut schedule = Schedule::default();

        while remaining > 0 {
            let ready: Vec<usize> = (0..jobs.len())
                .filter(|&i| !built[i])
                .filter(|&i| {
                    spec.dependencies(&jobs[i].name)
                        .iter()
                        .filter(|dep| in_set.contains(dep.as_str()))
                        .all(|dep| built_names.contains(dep.as_str()))
                })
                .collect();

            if ready.is_empty() {
                let stuck: Vec<String> = (0..jobs.len())
                    .filter(|&i| !built[i])
                    .map(|i| jobs[i].name.clone())
                    .collect();

                if self.strict {
                    return Err(SchedulerError::CircularDependency { jobs: stuck });
                }

                tracing::warn!(
                    "Unsatisfiable build order (dependency cycle?) between {}; building them together in a final wave",
                    stuck.join(", ")
                );
                schedule.forced_wave = Some(schedule.waves.len());
                schedule.waves.push(
                    (0..jobs.len())
                        .filter(|&i| !built[i])
                        .map(|i| jobs[i].clone())
                        .collect(),
                );
                break;
            }

            for &i in &ready {
                built[i] = true;
                built_names.insert(jobs[i].name.as_str());
            }
            remaining -= ready.len();
            schedule
                .waves
                .push(ready.into_iter().map(|i| jobs[i].clone()).collect());
        }

        tracing::debug!("Scheduled {} job(s) into {} wave(s)", jobs.len(), schedule.waves.len());
        Ok(schedule)
    }
}
