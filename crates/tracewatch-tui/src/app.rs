//! Top-level application state and the main event loop.
//!
//! [`App::run`] sets up the terminal, drives the crossterm event loop, and
//! tears everything down cleanly on exit or panic. Snapshots are pulled from
//! the shared [`Aggregator`] on a fixed refresh interval; ingestion keeps
//! running in the background regardless of what the dashboard shows.

use crate::{
    commands::execute_command,
    event::{self, AppEvent},
    theme::Theme,
    widgets::{
        command_bar::{CommandBar, CommandBarOutcome, CommandBarState},
        delay_chart::{DelayChart, DelayHistory},
        help::HelpPopup,
        stats_panel::StatsPanel,
        status_bar::StatusBar,
    },
};
use crossterm::{
    event::{self as ct_event, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDir, Layout, Rect},
    Frame, Terminal,
};
use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;
use tracewatch_core::{config::UiConfig, Aggregator, Snapshot};

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Dashboard,
    /// Vim-style `:` command line is active.
    Command,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    /// Most recent snapshot, `None` until the first refresh.
    pub snapshot: Option<Snapshot>,
    pub history: DelayHistory,
    /// While paused the periodic refresh is skipped; `r` still forces one.
    pub paused: bool,
    pub theme: Theme,
    pub show_help: bool,
    pub focus: Focus,
    pub command_bar: CommandBarState,
    pub quit: bool,
}

impl AppState {
    pub fn new(theme: Theme, history_len: usize) -> Self {
        Self {
            snapshot: None,
            history: DelayHistory::new(history_len),
            paused: false,
            theme,
            show_help: false,
            focus: Focus::Dashboard,
            command_bar: CommandBarState::default(),
            quit: false,
        }
    }

    /// Store a fresh snapshot and extend the delay history.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.history.push(snapshot.average_delay_ns);
        self.snapshot = Some(snapshot);
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    state: AppState,
    aggregator: Arc<Aggregator>,
    refresh_every: Duration,
    last_refresh: Option<Instant>,
    cancel: CancellationToken,
}

impl App {
    pub fn new(
        aggregator: Arc<Aggregator>,
        ui: &UiConfig,
        refresh_every: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let theme = Theme::by_name(&ui.theme);
        Self {
            state: AppState::new(theme, ui.history_len),
            aggregator,
            refresh_every,
            last_refresh: None,
            cancel,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Set up the terminal, run the event loop, and restore the terminal on exit.
    pub fn run(mut self) -> anyhow::Result<()> {
        install_panic_hook();

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        // Leaving the dashboard ends the whole process
        self.cancel.cancel();
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        loop {
            self.tick(Instant::now());

            {
                let s = &self.state;
                terminal.draw(|frame| draw(frame, s))?;
            }

            if self.state.quit || self.cancel.is_cancelled() {
                break;
            }

            if ct_event::poll(Duration::from_millis(100))? {
                let raw = ct_event::read()?;
                if let Event::Key(key) = &raw {
                    if key.kind != crossterm::event::KeyEventKind::Press {
                        continue;
                    }
                }
                let app_event = if self.state.focus == Focus::Command {
                    event::to_app_event_insert(raw)
                } else {
                    event::to_app_event(raw)
                };
                if let Some(ev) = app_event {
                    tracing::debug!(focus = ?self.state.focus, event = ?ev, "key event");
                    self.handle(ev);
                }
            }
        }
        Ok(())
    }

    /// Refresh when the interval has elapsed and the view is live.
    pub fn tick(&mut self, now: Instant) {
        if self.state.paused {
            return;
        }
        let due = self
            .last_refresh
            .map_or(true, |last| now.duration_since(last) >= self.refresh_every);
        if due {
            self.refresh(now);
        }
    }

    fn refresh(&mut self, now: Instant) {
        let snapshot = self.aggregator.snapshot();
        tracing::trace!(peers = snapshot.peers, topics = snapshot.topics, "dashboard refresh");
        self.state.apply_snapshot(snapshot);
        self.last_refresh = Some(now);
    }

    pub fn handle(&mut self, event: AppEvent) {
        let s = &mut self.state;

        // Help popup intercepts all events; only close keys pass through.
        if s.show_help {
            match event {
                AppEvent::ToggleHelp | AppEvent::Escape => {
                    tracing::debug!("help popup closed");
                    s.show_help = false;
                }
                AppEvent::Quit => s.quit = true,
                _ => {}
            }
            return;
        }

        // Command mode intercepts all events.
        if s.focus == Focus::Command {
            if event == AppEvent::Quit {
                s.quit = true;
                return;
            }
            match s.command_bar.handle(&event) {
                CommandBarOutcome::Editing => {}
                CommandBarOutcome::Cancelled => s.focus = Focus::Dashboard,
                CommandBarOutcome::Submit(cmd) => {
                    s.focus = Focus::Dashboard;
                    execute_command(s, cmd);
                }
            }
            return;
        }

        match event {
            AppEvent::Quit => {
                tracing::debug!("quit");
                s.quit = true;
            }
            AppEvent::TogglePause => {
                s.paused = !s.paused;
                tracing::debug!(paused = s.paused, "pause toggled");
            }
            AppEvent::ToggleHelp => {
                tracing::debug!("help popup opened");
                s.show_help = true;
            }
            AppEvent::CommandMode => {
                tracing::debug!("entering command mode");
                s.command_bar.clear();
                s.focus = Focus::Command;
            }
            AppEvent::Refresh => self.refresh(Instant::now()),
            // Terminal resize is handled automatically by ratatui
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn draw(frame: &mut Frame, state: &AppState) {
    let area = frame.area();

    // Vertical: 1-line status bar | counters | delay sparkline
    let vert = Layout::default()
        .direction(LayoutDir::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(10),
            Constraint::Fill(1),
        ])
        .split(area);

    let snapshot = state.snapshot.as_ref();

    frame.render_widget(StatusBar::new(snapshot, state.paused, &state.theme), vert[0]);
    frame.render_widget(StatsPanel::new(snapshot, &state.theme), vert[1]);
    frame.render_widget(DelayChart::new(&state.history, snapshot, &state.theme), vert[2]);

    if state.show_help {
        frame.render_widget(HelpPopup::new(&state.theme), area);
    }

    // Command bar overlays the bottom row of the screen
    if state.focus == Focus::Command {
        let cmd_area = Rect { y: area.bottom().saturating_sub(1), height: 1, ..area };
        frame.render_widget(CommandBar::new(&state.command_bar, &state.theme), cmd_area);
        let col = state.command_bar.cursor_col(cmd_area);
        frame.set_cursor_position((col, cmd_area.y));
    }
}

// ---------------------------------------------------------------------------
// Terminal helpers
// ---------------------------------------------------------------------------

fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original(info);
    }));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    const PUBLISH: &[u8] =
        br#"{"peerID":"A","published":{"messageID":"m1","timestamp":1000}}"#;
    const DELIVER: &[u8] =
        br#"{"peerID":"B","delivered":{"messageID":"m1","timestamp":2501000}}"#;

    fn app() -> App {
        let ui = UiConfig { theme: "default".into(), history_len: 4 };
        App::new(
            Arc::new(Aggregator::new()),
            &ui,
            Duration::from_secs(1),
            CancellationToken::new(),
        )
    }

    fn screen(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| draw(frame, state)).unwrap();
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn first_tick_refreshes_immediately() {
        let mut app = app();
        app.aggregator.ingest_line(PUBLISH).unwrap();
        app.tick(Instant::now());
        assert_eq!(app.state().snapshot.as_ref().unwrap().published_messages, 1);
    }

    #[test]
    fn tick_waits_for_interval() {
        let mut app = app();
        let t0 = Instant::now();
        app.tick(t0);
        app.aggregator.ingest_line(PUBLISH).unwrap();
        app.tick(t0 + Duration::from_millis(500));
        assert_eq!(app.state().snapshot.as_ref().unwrap().published_messages, 0);
        app.tick(t0 + Duration::from_secs(1));
        assert_eq!(app.state().snapshot.as_ref().unwrap().published_messages, 1);
    }

    #[test]
    fn paused_view_only_refreshes_on_demand() {
        let mut app = app();
        app.handle(AppEvent::TogglePause);
        assert!(app.state().paused);
        app.tick(Instant::now());
        assert!(app.state().snapshot.is_none());
        app.handle(AppEvent::Refresh);
        assert!(app.state().snapshot.is_some());
    }

    #[test]
    fn history_tracks_average_delay() {
        let mut app = app();
        app.aggregator.ingest_line(PUBLISH).unwrap();
        app.aggregator.ingest_line(DELIVER).unwrap();
        app.handle(AppEvent::Refresh);
        app.handle(AppEvent::Refresh);
        assert_eq!(app.state().history.len(), 2);
    }

    #[test]
    fn command_mode_runs_commands() {
        let mut app = app();
        app.handle(AppEvent::CommandMode);
        assert_eq!(app.state().focus, Focus::Command);
        for c in "theme gruvbox".chars() {
            app.handle(AppEvent::Char(c));
        }
        app.handle(AppEvent::Enter);
        assert_eq!(app.state().focus, Focus::Dashboard);
        assert_eq!(app.state().theme.name, "gruvbox");
    }

    #[test]
    fn letters_are_text_in_command_mode() {
        let mut app = app();
        app.handle(AppEvent::CommandMode);
        app.handle(AppEvent::Char('q'));
        assert!(!app.state().quit);
        app.handle(AppEvent::Escape);
        assert_eq!(app.state().focus, Focus::Dashboard);
    }

    #[test]
    fn help_popup_swallows_other_keys() {
        let mut app = app();
        app.handle(AppEvent::ToggleHelp);
        app.handle(AppEvent::TogglePause);
        assert!(!app.state().paused);
        app.handle(AppEvent::Escape);
        assert!(!app.state().show_help);
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = app();
        app.handle(AppEvent::Quit);
        assert!(app.state().quit);
    }

    #[test]
    fn draw_shows_counters() {
        let mut app = app();
        app.aggregator.ingest_line(PUBLISH).unwrap();
        app.aggregator.ingest_line(DELIVER).unwrap();
        app.handle(AppEvent::Refresh);
        let text = screen(app.state());
        assert!(text.contains("tracewatch"));
        assert!(text.contains("Published"));
        assert!(text.contains("2.500 ms"));
    }

    #[test]
    fn draw_before_first_snapshot() {
        let app = app();
        let text = screen(app.state());
        assert!(text.contains("waiting for first snapshot"));
    }
}
