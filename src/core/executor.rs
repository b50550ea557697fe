//! Bounded-concurrency build execution
//!
//! [`BuildExecutor::execute`] runs the jobs of one wave, at most
//! `max_parallel` at a time, and returns the receiving end of the wave's
//! event stream. The stream closes once every job has sent its `Finish`
//! event, so the consumer must drain it to the end.
//!
//! Cancellation is kill-on-cancel: when the token fires, running commands
//! are killed along with their process group and finish with
//! [`JobError::Cancelled`], even if descendants still hold the output pipes; jobs still waiting
//! for a slot finish the same way without being spawned. Without
//! `continue_on_error`, a failure stops jobs that are still waiting for a
//! slot ([`JobError::Skipped`]) but leaves running siblings alone.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::Child;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::defaults;
use crate::core::event::BuildEvent;
use crate::core::job::{BuildJob, BuildResult};
use crate::error::JobError;
use crate::infra::process::{self, SpawnRequest, Spawner};

/// Extra resources handed to spawned commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Directories prepended to `PATH`
    pub extra_path: Vec<PathBuf>,
}

/// Per-wave execution settings
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Maximum number of concurrently running commands (at least 1)
    pub max_parallel: usize,
    /// Keep starting queued jobs after a failure
    pub continue_on_error: bool,
    /// Resources for spawned commands
    pub resources: ResourceOptions,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_parallel: num_cpus::get(),
            continue_on_error: true,
            resources: ResourceOptions::default(),
        }
    }
}

/// Worker pool running one build command per job
#[derive(Clone)]
pub struct BuildExecutor {
    spawner: Arc<dyn Spawner>,
}

impl std::fmt::Debug for BuildExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildExecutor").finish_non_exhaustive()
    }
}

impl BuildExecutor {
    /// Create an executor using `spawner` to start commands
    pub fn new(spawner: Arc<dyn Spawner>) -> Self {
        Self { spawner }
    }

    /// Start all jobs of `wave` and return their event stream
    ///
    /// Must be called from within a tokio runtime.
    pub fn execute(
        &self,
        wave: Vec<BuildJob>,
        options: &ExecutorOptions,
        cancel: &CancellationToken,
    ) -> mpsc::Receiver<BuildEvent> {
        let (tx, rx) = mpsc::channel(defaults::EVENT_CHANNEL_CAPACITY);
        let slots = Arc::new(Semaphore::new(options.max_parallel.max(1)));
        let halt = cancel.child_token();
        let search_path = process::prepend_search_path(&options.resources.extra_path);

        tracing::debug!(
            "Dispatching {} job(s) with up to {} in parallel",
            wave.len(),
            options.max_parallel.max(1)
        );

        for job in wave {
            let worker = Worker {
                job,
                spawner: Arc::clone(&self.spawner),
                events: tx.clone(),
                cancel: cancel.clone(),
                halt: halt.clone(),
                continue_on_error: options.continue_on_error,
                search_path: search_path.clone(),
            };
            let slots = Arc::clone(&slots);

            tokio::spawn(async move {
                let slot = tokio::select! {
                    biased;
                    () = worker.halt.cancelled() => None,
                    slot = slots.acquire_owned() => slot.ok(),
                };
                worker.run(slot.is_some()).await;
                drop(slot);
            });
        }

        rx
    }
}

/// One job's lifecycle
struct Worker {
    job: BuildJob,
    spawner: Arc<dyn Spawner>,
    events: mpsc::Sender<BuildEvent>,
    cancel: CancellationToken,
    /// Child of `cancel`; also fired by a failure when not continuing on error
    halt: CancellationToken,
    continue_on_error: bool,
    search_path: Option<OsString>,
}

impl Worker {
    async fn run(self, admitted: bool) {
        self.emit(BuildEvent::Start {
            job: self.job.clone(),
        })
        .await;

        let started = Instant::now();
        let (output, error) = if admitted {
            self.build().await
        } else if self.cancel.is_cancelled() {
            (Vec::new(), Some(JobError::Cancelled))
        } else {
            (Vec::new(), Some(JobError::Skipped))
        };

        match &error {
            None => tracing::info!("Built {} in {:.2?}", self.job.name, started.elapsed()),
            Some(e) => {
                tracing::info!("Build of {} failed: {e}", self.job.name);
                if !self.continue_on_error {
                    self.halt.cancel();
                }
            }
        }

        let result = BuildResult {
            job: self.job.clone(),
            output,
            error,
            duration: started.elapsed(),
        };
        self.emit(BuildEvent::Finish { result }).await;
    }

    async fn emit(&self, event: BuildEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("Event receiver for {} dropped", self.job.name);
        }
    }

    /// Spawn the command, stream its output, and wait for it
    async fn build(&self) -> (Vec<u8>, Option<JobError>) {
        if self.cancel.is_cancelled() {
            return (Vec::new(), Some(JobError::Cancelled));
        }

        let Some((program, args)) = self.job.command.split_first() else {
            return (
                Vec::new(),
                Some(JobError::Spawn {
                    program: String::new(),
                    error: "empty build command".to_string(),
                }),
            );
        };

        let request = SpawnRequest {
            program,
            args,
            cwd: &self.job.path,
            search_path: self.search_path.as_deref(),
        };
        let mut child = match self.spawner.spawn(&request) {
            Ok(child) => child,
            Err(e) => {
                return (
                    Vec::new(),
                    Some(JobError::Spawn {
                        program: program.clone(),
                        error: e.to_string(),
                    }),
                )
            }
        };
        tracing::debug!("Started {} (pid {:?}): {}", self.job.name, child.id(), self.job.command.join(" "));

        let (line_tx, mut lines) = mpsc::channel(defaults::LINE_CHANNEL_CAPACITY);
        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(process::pump_lines(out, line_tx.clone())));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(process::pump_lines(err, line_tx.clone())));
        drop(line_tx);

        let mut output = Vec::new();
        let mut pipes_open = true;
        let status = loop {
            tokio::select! {
                line = lines.recv(), if pipes_open => match line {
                    Some(line) => {
                        output.extend_from_slice(&line);
                        output.push(b'\n');
                        self.emit(BuildEvent::Output {
                            name: self.job.name.clone(),
                            line: String::from_utf8_lossy(&line).into_owned(),
                        })
                        .await;
                    }
                    None => pipes_open = false,
                },
                status = child.wait(), if !pipes_open => break Some(status),
                () = self.cancel.cancelled() => break None,
            }
        };

        let Some(status) = status else {
            self.kill(&mut child, [stdout, stderr]).await;
            return (output, Some(JobError::Cancelled));
        };

        let (stdout_err, stderr_err) =
            futures::future::join(finish_pump(stdout), finish_pump(stderr)).await;
        let error = match status {
            Ok(status) => exit_error(status).or(stdout_err).or(stderr_err),
            Err(e) => Some(JobError::Io {
                error: e.to_string(),
            }),
        };
        (output, error)
    }

    /// Kill the build's process tree and stop reading its output
    ///
    /// Descendants may keep the pipes open, so the pumps are aborted rather
    /// than drained.
    async fn kill(&self, child: &mut Child, pumps: [Option<JoinHandle<io::Result<()>>>; 2]) {
        tracing::debug!("Killing {}", self.job.name);
        if let Err(e) = process::kill_tree(child) {
            tracing::warn!("Failed to kill build of {}: {e}", self.job.name);
        }
        for pump in pumps.into_iter().flatten() {
            pump.abort();
        }
        let grace = Duration::from_millis(defaults::KILL_WAIT_MS);
        if tokio::time::timeout(grace, child.wait()).await.is_err() {
            tracing::warn!("Build of {} did not exit after being killed", self.job.name);
        }
    }
}

async fn finish_pump(pump: Option<JoinHandle<io::Result<()>>>) -> Option<JobError> {
    let error = match pump?.await {
        Ok(Ok(())) => return None,
        Ok(Err(e)) => e.to_string(),
        Err(e) => e.to_string(),
    };
    Some(JobError::Io { error })
}

fn exit_error(status: ExitStatus) -> Option<JobError> {
    if status.success() {
        return None;
    }
    Some(match status.code() {
        Some(code) => JobError::Exit { code },
        None => JobError::Signal,
    })
}
