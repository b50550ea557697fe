//! Build event contract
//!
//! Every front end (batch JSON, streamed text, progress bar, live view)
//! consumes the same stream of [`BuildEvent`]s. For each job the stream
//! carries exactly one `Start`, any number of `Output` lines, then exactly one
//! `Finish`. Events of different jobs interleave arbitrarily.

use crate::core::job::{BuildJob, BuildResult};

/// One step in a job's lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// The job was admitted to run
    Start {
        /// The job
        job: BuildJob,
    },
    /// One line of combined stdout/stderr
    Output {
        /// Job name
        name: String,
        /// Line without its terminator
        line: String,
    },
    /// The job completed (successfully or not)
    Finish {
        /// Complete result
        result: BuildResult,
    },
}

impl BuildEvent {
    /// Name of the job this event belongs to
    pub fn job_name(&self) -> &str {
        match self {
            Self::Start { job } => &job.name,
            Self::Output { name, .. } => name,
            Self::Finish { result } => &result.job.name,
        }
    }
}

/// Consumer of orchestration progress
///
/// Wave callbacks bracket the events of each wave.
pub trait EventSink {
    /// A wave is about to be dispatched
    fn wave_started(&mut self, _index: usize, _total: usize, _jobs: &[BuildJob]) {}

    /// A build event was received
    fn event(&mut self, event: &BuildEvent);

    /// All events of the wave have been delivered
    fn wave_finished(&mut self, _index: usize) {}
}

/// Sink that ignores everything
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn event(&mut self, _event: &BuildEvent) {}
}

/// Running success/failure counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Jobs currently running
    pub running: usize,
    /// Jobs finished successfully
    pub succeeded: usize,
    /// Jobs finished with an error
    pub failed: usize,
}

impl Tally {
    /// Account for one event
    pub fn record(&mut self, event: &BuildEvent) {
        match event {
            BuildEvent::Start { .. } => self.running += 1,
            BuildEvent::Output { .. } => {}
            BuildEvent::Finish { result } => {
                self.running = self.running.saturating_sub(1);
                if result.success() {
                    self.succeeded += 1;
                } else {
                    self.failed += 1;
                }
            }
        }
    }

    /// Jobs finished so far
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed
    }
}
