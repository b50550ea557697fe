//! Live build view
//!
//! The orchestrator feeds a [`LiveSink`] on the async side while a render
//! thread draws the shared [`LiveState`]. Both sides lock the same mutex.

use std::io::{self, Stdout};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tokio_util::sync::CancellationToken;

use crate::cli::output::{format_duration, logs, status};
use crate::config::defaults;
use crate::core::event::{BuildEvent, EventSink, Tally};
use crate::core::orchestrator::{BuildPlan, RunReport, WaveOrchestrator};

/// Display state of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Waiting for its wave or a slot
    Pending,
    /// Command running
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed(String),
}

impl JobState {
    fn is_done(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// One row of the job table
#[derive(Debug, Clone)]
pub struct JobRow {
    /// Project name
    pub name: String,
    /// Wave index (0-based)
    pub wave: usize,
    /// Current state
    pub state: JobState,
    /// When the job started
    pub started: Option<Instant>,
    /// Final duration
    pub duration: Option<Duration>,
    /// Output lines received so far
    pub output: Vec<String>,
}

impl JobRow {
    fn elapsed(&self) -> Option<Duration> {
        self.duration.or_else(|| self.started.map(|s| s.elapsed()))
    }
}

/// Everything the live view draws
#[derive(Debug, Clone)]
pub struct LiveState {
    /// Jobs in plan order
    pub rows: Vec<JobRow>,
    /// Running/succeeded/failed counters
    pub tally: Tally,
    /// Active wave (0-based) and wave count
    pub wave: Option<(usize, usize)>,
    /// The run has ended
    pub finished: bool,
}

impl LiveState {
    /// Initial state for `plan`: every job pending
    pub fn new(plan: &BuildPlan) -> Self {
        let rows = plan
            .waves()
            .iter()
            .enumerate()
            .flat_map(|(wave, jobs)| {
                jobs.iter().map(move |job| JobRow {
                    name: job.name.clone(),
                    wave,
                    state: JobState::Pending,
                    started: None,
                    duration: None,
                    output: Vec::new(),
                })
            })
            .collect();

        Self {
            rows,
            tally: Tally::default(),
            wave: None,
            finished: false,
        }
    }

    /// Apply one build event
    pub fn apply(&mut self, event: &BuildEvent) {
        self.tally.record(event);
        let wave = self.wave.map_or(0, |(index, _)| index);
        let name = event.job_name();

        // Names are only unique within a wave's unfinished jobs
        let Some(row) = self
            .rows
            .iter_mut()
            .find(|r| r.wave == wave && r.name == name && !r.state.is_done())
        else {
            return;
        };

        match event {
            BuildEvent::Start { .. } => {
                row.state = JobState::Running;
                row.started = Some(Instant::now());
            }
            BuildEvent::Output { line, .. } => row.output.push(line.clone()),
            BuildEvent::Finish { result } => {
                row.duration = Some(result.duration);
                row.state = match &result.error {
                    None => JobState::Succeeded,
                    Some(e) => JobState::Failed(e.to_string()),
                };
            }
        }
    }
}

/// Event sink updating the shared state
struct LiveSink {
    state: Arc<Mutex<LiveState>>,
}

impl EventSink for LiveSink {
    fn wave_started(&mut self, index: usize, total: usize, _jobs: &[crate::core::job::BuildJob]) {
        lock(&self.state).wave = Some((index, total));
    }

    fn event(&mut self, event: &BuildEvent) {
        lock(&self.state).apply(event);
    }
}

fn lock(state: &Mutex<LiveState>) -> MutexGuard<'_, LiveState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `plan` while showing the live view
///
/// The view stays open after the run until the user quits it.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or restored.
pub async fn run_live(
    orchestrator: &WaveOrchestrator,
    plan: &BuildPlan,
    cancel: &CancellationToken,
) -> anyhow::Result<RunReport> {
    let state = Arc::new(Mutex::new(LiveState::new(plan)));

    let view = {
        let mut view = LiveView::new(Arc::clone(&state), cancel.clone());
        std::thread::spawn(move || view.run())
    };

    let mut sink = LiveSink {
        state: Arc::clone(&state),
    };
    let report = orchestrator.run(plan, cancel, &mut sink).await;
    lock(&state).finished = true;

    tokio::task::spawn_blocking(move || view.join())
        .await?
        .map_err(|_| anyhow!("live view thread panicked"))??;

    Ok(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Table,
    Output,
}

/// Render loop for the live view
struct LiveView {
    state: Arc<Mutex<LiveState>>,
    cancel: CancellationToken,
    table_state: TableState,
    view_mode: ViewMode,
    scroll: u16,
}

impl LiveView {
    fn new(state: Arc<Mutex<LiveState>>, cancel: CancellationToken) -> Self {
        Self {
            state,
            cancel,
            table_state: TableState::default().with_selected(Some(0)),
            view_mode: ViewMode::Table,
            scroll: 0,
        }
    }

    /// Set up the terminal, run the loop, restore the terminal
    fn run(&mut self) -> anyhow::Result<()> {
        // Released after the terminal is restored
        let _logs = logs::hold();
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        let tick = Duration::from_millis(defaults::UI_TICK_MS);
        loop {
            let snapshot = lock(&self.state).clone();
            terminal.draw(|f| self.draw(f, &snapshot))?;

            if !event::poll(tick)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                if snapshot.finished {
                    return Ok(());
                }
                self.cancel.cancel();
                continue;
            }

            match (self.view_mode, key.code) {
                (_, KeyCode::Char('q')) if snapshot.finished => return Ok(()),
                (ViewMode::Table, KeyCode::Up | KeyCode::Char('k')) => self.select(&snapshot, -1),
                (ViewMode::Table, KeyCode::Down | KeyCode::Char('j')) => self.select(&snapshot, 1),
                (ViewMode::Table, KeyCode::Enter) => {
                    self.view_mode = ViewMode::Output;
                    self.scroll = 0;
                }
                (ViewMode::Output, KeyCode::Esc | KeyCode::Enter) => {
                    self.view_mode = ViewMode::Table;
                }
                (ViewMode::Output, KeyCode::Up | KeyCode::Char('k')) => {
                    self.scroll = self.scroll.saturating_sub(1);
                }
                (ViewMode::Output, KeyCode::Down | KeyCode::Char('j')) => {
                    self.scroll = self.scroll.saturating_add(1);
                }
                _ => {}
            }
        }
    }

    fn select(&mut self, state: &LiveState, delta: isize) {
        if state.rows.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let last = state.rows.len() - 1;
        let next = current.saturating_add_signed(delta).min(last);
        self.table_state.select(Some(next));
    }

    fn draw(&mut self, f: &mut Frame, state: &LiveState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tallies
                Constraint::Min(5),    // Jobs or output
                Constraint::Length(3), // Help
            ])
            .split(f.area());

        self.draw_header(f, chunks[0], state);
        match self.view_mode {
            ViewMode::Table => self.draw_table(f, chunks[1], state),
            ViewMode::Output => self.draw_output(f, chunks[1], state),
        }
        self.draw_status_bar(f, chunks[2], state);
    }

    fn draw_header(&self, f: &mut Frame, area: Rect, state: &LiveState) {
        let wave = state
            .wave
            .map(|(index, total)| format!("Wave {}/{}", index + 1, total))
            .unwrap_or_else(|| "Starting".to_string());

        let line = Line::from(vec![
            Span::styled(wave, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   "),
            Span::styled(
                format!("running {}", state.tally.running),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("   "),
            Span::styled(
                format!("{} {}", status::SUCCESS, state.tally.succeeded),
                Style::default().fg(Color::Green),
            ),
            Span::raw("   "),
            Span::styled(
                format!("{} {}", status::ERROR, state.tally.failed),
                Style::default().fg(Color::Red),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("ecoctl build")
            .style(Style::default().fg(Color::Cyan));
        f.render_widget(Paragraph::new(line).block(block), area);
    }

    fn draw_table(&mut self, f: &mut Frame, area: Rect, state: &LiveState) {
        let rows = state.rows.iter().map(|row| {
            let (label, color) = match &row.state {
                JobState::Pending => ("pending".to_string(), Color::DarkGray),
                JobState::Running => ("running".to_string(), Color::Yellow),
                JobState::Succeeded => (format!("{} ok", status::SUCCESS), Color::Green),
                JobState::Failed(error) => (format!("{} {error}", status::ERROR), Color::Red),
            };
            Row::new(vec![
                Cell::from((row.wave + 1).to_string()),
                Cell::from(row.name.clone()),
                Cell::from(label).style(Style::default().fg(color)),
                Cell::from(row.elapsed().map(format_duration).unwrap_or_default()),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Percentage(30),
                Constraint::Min(20),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["Wave", "Project", "State", "Time"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Projects"))
        .row_highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_output(&self, f: &mut Frame, area: Rect, state: &LiveState) {
        let Some(row) = self.table_state.selected().and_then(|i| state.rows.get(i)) else {
            return;
        };

        let lines: Vec<Line> = row.output.iter().map(|l| Line::raw(l.as_str())).collect();
        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Output: {}", row.name)),
            );
        f.render_widget(paragraph, area);
    }

    fn draw_status_bar(&self, f: &mut Frame, area: Rect, state: &LiveState) {
        let quit = if state.finished {
            "q: Quit"
        } else {
            "Ctrl+C: Cancel"
        };
        let help = match self.view_mode {
            ViewMode::Table => format!("↑↓/jk: Navigate • Enter: Output • {quit}"),
            ViewMode::Output => format!("↑↓/jk: Scroll • Esc/Enter: Back • {quit}"),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(help).block(block), area);
    }
}
