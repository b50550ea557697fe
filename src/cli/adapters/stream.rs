//! Streamed text output
//!
//! Prints every output line as soon as it arrives, prefixed with the project
//! name. Each name keeps the same color for the whole run.

use std::collections::HashMap;
use std::io::{self, Stdout, Write};

use crossterm::style::{Color, Stylize};

use crate::cli::output::{format_duration, status};
use crate::core::event::{BuildEvent, EventSink};
use crate::core::job::BuildJob;

const PALETTE: &[Color] = &[
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::DarkCyan,
    Color::DarkGreen,
    Color::DarkYellow,
    Color::DarkMagenta,
];

/// Name → color assignment, in order of first appearance
#[derive(Debug, Default)]
struct ColorPalette {
    assigned: HashMap<String, Color>,
}

impl ColorPalette {
    fn color_for(&mut self, name: &str) -> Color {
        if let Some(color) = self.assigned.get(name) {
            return *color;
        }
        let color = PALETTE[self.assigned.len() % PALETTE.len()];
        self.assigned.insert(name.to_string(), color);
        color
    }
}

/// Sink printing `[name] line` for every output line
pub struct StreamSink<W: Write = Stdout> {
    out: W,
    color: bool,
    palette: ColorPalette,
}

impl StreamSink<Stdout> {
    /// Stream to stdout, colored when it is a terminal
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> StreamSink<W> {
    /// Stream to `out`
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            palette: ColorPalette::default(),
        }
    }

    /// Consume the sink, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn tag(&mut self, name: &str) -> String {
        let tag = format!("[{name}]");
        if self.color {
            let color = self.palette.color_for(name);
            tag.with(color).to_string()
        } else {
            tag
        }
    }

    fn write_line(&mut self, line: &str) {
        // A closed stdout (e.g. `| head`) must not abort the build
        if writeln!(self.out, "{line}").is_err() {
            tracing::debug!("Dropping output line: writer closed");
        }
    }
}

impl<W: Write> EventSink for StreamSink<W> {
    fn wave_started(&mut self, index: usize, total: usize, jobs: &[BuildJob]) {
        let names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
        self.write_line(&format!("==> Wave {}/{}: {}", index + 1, total, names.join(", ")));
    }

    fn event(&mut self, event: &BuildEvent) {
        let line = match event {
            BuildEvent::Start { job } => {
                format!("{} started: {}", self.tag(&job.name), job.command.join(" "))
            }
            BuildEvent::Output { name, line } => format!("{} {line}", self.tag(name)),
            BuildEvent::Finish { result } => {
                let tag = self.tag(&result.job.name);
                let duration = format_duration(result.duration);
                match &result.error {
                    None => format!("{tag} {} finished in {duration}", status::SUCCESS),
                    Some(e) => format!("{tag} {} {e} after {duration}", status::ERROR),
                }
            }
        };
        self.write_line(&line);
    }

    fn wave_finished(&mut self, _index: usize) {
        if self.out.flush().is_err() {
            tracing::debug!("Failed to flush streamed output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job::BuildResult;
    use crate::error::JobError;
    use std::time::Duration;

    fn job(name: &str) -> BuildJob {
        BuildJob::new(name, format!("/eco/{name}"), vec!["make".into(), "build".into()])
    }

    #[test]
    fn test_prefixes_lines_with_name() {
        let mut sink = StreamSink::new(Vec::new(), false);
        sink.wave_started(0, 2, &[job("api"), job("web")]);
        sink.event(&BuildEvent::Start { job: job("api") });
        sink.event(&BuildEvent::Output {
            name: "api".into(),
            line: "compiling".into(),
        });
        sink.event(&BuildEvent::Finish {
            result: BuildResult {
                job: job("api"),
                output: Vec::new(),
                error: Some(JobError::Exit { code: 1 }),
                duration: Duration::from_millis(2000),
            },
        });

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "==> Wave 1/2: api, web");
        assert_eq!(lines[1], "[api] started: make build");
        assert_eq!(lines[2], "[api] compiling");
        assert_eq!(lines[3], "[api] ✗ exited with status 1 after 2.0s");
    }

    #[test]
    fn test_palette_is_stable_per_name() {
        let mut palette = ColorPalette::default();
        let api = palette.color_for("api");
        let web = palette.color_for("web");
        assert_ne!(api, web);
        assert_eq!(palette.color_for("api"), api);
    }

    #[test]
    fn test_palettes_are_independent() {
        let mut first = ColorPalette::default();
        first.color_for("api");
        assert_eq!(first.color_for("web"), PALETTE[1]);

        let mut second = ColorPalette::default();
        assert_eq!(second.color_for("web"), PALETTE[0]);
    }
}
