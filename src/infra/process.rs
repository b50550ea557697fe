//! External process spawning
//!
//! Build commands are started through the [`Spawner`] trait so the executor
//! can be driven by test doubles (e.g. a spawn-counting stub).
//!
//! On Unix every build runs as the leader of its own process group, so
//! [`kill_tree`] also reaches the compilers and helpers a build starts.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Everything needed to start one build command
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    /// Program name or path
    pub program: &'a str,
    /// Arguments
    pub args: &'a [String],
    /// Working directory
    pub cwd: &'a Path,
    /// Full `PATH` value to use, when it differs from the inherited one
    pub search_path: Option<&'a OsStr>,
}

/// Starts build processes
///
/// Implementations must return a child whose stdout and stderr are piped.
pub trait Spawner: Send + Sync {
    /// Start the process described by `request`
    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<Child>;
}

/// Spawner backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl SystemSpawner {
    /// Create a system spawner
    pub fn new() -> Self {
        Self
    }
}

impl Spawner for SystemSpawner {
    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<Child> {
        let program = resolve_program(request)?;

        let mut cmd = Command::new(program);
        cmd.args(request.args)
            .current_dir(request.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        if let Some(path) = request.search_path {
            cmd.env("PATH", path);
        }

        cmd.spawn()
    }
}

/// Kill `child` together with every process in its process group
///
/// Children that do not lead a group of their own (e.g. from a custom
/// [`Spawner`]) are still killed directly.
pub fn kill_tree(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        kill_group(pid);
    }
    match child.start_kill() {
        // Already reaped
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
        other => other,
    }
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::debug!("Cannot signal process group {pid}: {e}"),
    }
}

/// Look the program up on the effective search path
fn resolve_program(request: &SpawnRequest<'_>) -> io::Result<PathBuf> {
    let search_path = request
        .search_path
        .map(OsStr::to_os_string)
        .or_else(|| std::env::var_os("PATH"));

    which::which_in(request.program, search_path, request.cwd).map_err(|e| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("command not found: {} ({e})", request.program),
        )
    })
}

/// Build a `PATH` value with `extra` directories in front of the inherited one
///
/// Returns `None` when there is nothing to prepend.
pub fn prepend_search_path(extra: &[PathBuf]) -> Option<OsString> {
    if extra.is_empty() {
        return None;
    }

    let inherited = std::env::var_os("PATH").unwrap_or_default();
    let dirs = extra
        .iter()
        .cloned()
        .chain(std::env::split_paths(&inherited));

    match std::env::join_paths(dirs) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("Cannot extend PATH with exported directories: {e}");
            None
        }
    }
}

/// Forward each line of `reader` (terminator stripped) to `lines`
///
/// Stops quietly when the receiver is gone. A final line without a newline
/// is still delivered.
pub async fn pump_lines<R>(reader: R, lines: mpsc::Sender<Vec<u8>>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        trim_line_ending(&mut buf);
        if lines.send(buf.clone()).await.is_err() {
            return Ok(());
        }
    }
}

fn trim_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}
