//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! colored output, and formatted messages to the user.

use std::io::IsTerminal;
use std::time::Duration;

use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;

/// How the user asked output to be presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Machine-readable output on stdout
    pub json: bool,
    /// Verbosity level (`-v` count)
    pub verbose: u8,
    /// Whether stderr is a color-capable terminal
    pub color: bool,
}

impl OutputConfig {
    /// Create an output configuration from the global flags
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        let color = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self {
            quiet,
            json,
            verbose,
            color,
        }
    }

    /// Default log level for these flags
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Whether human-readable progress may be printed
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

/// Print an error and its cause chain to stderr
pub fn display_error(error: &anyhow::Error, output: &OutputConfig) {
    let prefix = if output.color {
        status::ERROR.red().bold().to_string()
    } else {
        status::ERROR.to_string()
    };
    eprintln!("{prefix} {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Create a progress bar for one build wave
pub fn create_build_bar(total: u64, prefix: String) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} projects ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░"),
    );
    pb.set_prefix(prefix);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Format a duration as seconds with one decimal
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Log destination for the tracing subscriber
///
/// Logs go to stderr, except while a full-screen view owns the terminal:
/// then they are held back and written out once the view is gone.
pub mod logs {
    use std::io::{self, Write};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// `Some` while logs are held back
    static HELD: Mutex<Option<Vec<u8>>> = Mutex::new(None);

    fn held() -> MutexGuard<'static, Option<Vec<u8>>> {
        HELD.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writer handed to `tracing_subscriber::fmt().with_writer(logs::writer)`
    pub fn writer() -> LogWriter {
        LogWriter
    }

    /// Writes to stderr or into the hold-back buffer
    #[derive(Debug)]
    pub struct LogWriter;

    impl Write for LogWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Some(pending) = held().as_mut() {
                pending.extend_from_slice(buf);
                return Ok(buf.len());
            }
            io::stderr().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            io::stderr().flush()
        }
    }

    /// Hold logs back until the returned guard is dropped
    pub fn hold() -> HeldLogs {
        held().get_or_insert_with(Vec::new);
        HeldLogs { _private: () }
    }

    /// Releases held logs to stderr on drop
    #[derive(Debug)]
    pub struct HeldLogs {
        _private: (),
    }

    impl Drop for HeldLogs {
        fn drop(&mut self) {
            let pending = held().take();
            if let Some(pending) = pending {
                let _ = io::stderr().write_all(&pending);
            }
        }
    }

}
