//! Progress bar front end
//!
//! One bar per wave; the bar message lists the builds still running.

use indicatif::ProgressBar;

use crate::cli::output::{create_build_bar, status};
use crate::core::event::{BuildEvent, EventSink, Tally};
use crate::core::job::BuildJob;

/// Sink drawing an indicatif bar for the active wave
#[derive(Default)]
pub struct ProgressSink {
    bar: Option<ProgressBar>,
    running: Vec<String>,
    tally: Tally,
    label: String,
}

impl ProgressSink {
    /// Create a progress sink
    pub fn new() -> Self {
        Self::default()
    }

    fn refresh_message(&self) {
        if let Some(bar) = &self.bar {
            bar.set_message(self.running.join(", "));
        }
    }
}

impl EventSink for ProgressSink {
    fn wave_started(&mut self, index: usize, total: usize, jobs: &[BuildJob]) {
        self.label = format!("wave {}/{}", index + 1, total);
        self.tally = Tally::default();
        self.running.clear();
        self.bar = Some(create_build_bar(jobs.len() as u64, self.label.clone()));
    }

    fn event(&mut self, event: &BuildEvent) {
        self.tally.record(event);
        match event {
            BuildEvent::Start { job } => self.running.push(job.name.clone()),
            BuildEvent::Output { .. } => return,
            BuildEvent::Finish { result } => {
                if let Some(pos) = self.running.iter().position(|n| *n == result.job.name) {
                    self.running.remove(pos);
                }
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    if let Some(error) = &result.error {
                        bar.println(format!("{} {}: {error}", status::ERROR, result.job.name));
                    }
                }
            }
        }
        self.refresh_message();
    }

    fn wave_finished(&mut self, _index: usize) {
        let Some(bar) = self.bar.take() else {
            return;
        };
        bar.finish_and_clear();

        let line = if self.tally.failed == 0 {
            format!("{} {}: {} built", status::SUCCESS, self.label, self.tally.succeeded)
        } else {
            format!(
                "{} {}: {} built, {} failed",
                status::ERROR,
                self.label,
                self.tally.succeeded,
                self.tally.failed
            )
        };
        eprintln!("{line}");
    }
}
