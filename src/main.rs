pub mod ui;

use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, Rng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use tracing::warn;

use tapzone::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::SessionConfig,
    export::write_export,
    geometry::zone_center,
    logging::init_file_logging,
    recorder::TouchLogEntry,
    runtime::{ChannelEventSource, Runner, TapEvent},
    Hand, SessionEvent, SessionPhase, TouchSession,
};

const TICK_RATE_MS: u64 = 100;
/// Side length of each zone in zone-local units
pub const ZONE_SIZE: f64 = 400.0;

/// two-hand touch reaction test
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Two circular zones spawn targets during timed trials, first for the right hand and then for the left. Click targets as they appear; every hit is logged with its offset from the zone center and the response time, and the session is saved as a csv file when both trials are over."
)]
pub struct Cli {}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportStatus {
    Saved(PathBuf),
    Failed(String),
}

pub struct App<C, R> {
    pub session: TouchSession<C, R>,
    pub export_dir: PathBuf,
    pub export_status: Option<ExportStatus>,
    /// Screen area of the last draw, used to map clicks onto zones
    pub last_area: Rect,
}

impl<C: Clock, R: Rng> App<C, R> {
    pub fn new(session: TouchSession<C, R>, export_dir: PathBuf) -> Self {
        Self {
            session,
            export_dir,
            export_status: None,
            last_area: Rect::default(),
        }
    }

    pub fn on_tick(&mut self) {
        let events = self.session.pump(ZONE_SIZE);
        self.handle_events(events);
    }

    fn handle_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            if let SessionEvent::ExportReady(text) = event {
                self.save(&text);
            }
        }
    }

    fn save(&mut self, text: &str) {
        self.export_status = Some(match write_export(&self.export_dir, text, Local::now()) {
            Ok(path) => ExportStatus::Saved(path),
            Err(e) => {
                warn!(error = %e, "saving session failed");
                ExportStatus::Failed(e.to_string())
            }
        });
    }

    /// Save again after a failed write; the log is still in memory
    pub fn retry_export(&mut self) {
        if !matches!(self.export_status, Some(ExportStatus::Failed(_))) {
            return;
        }
        match self.session.export() {
            Ok(text) => self.save(&text),
            Err(e) => self.export_status = Some(ExportStatus::Failed(e.to_string())),
        }
    }

    /// Handle a key press. Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
            KeyCode::Char(' ') => {
                if self.session.phase() == SessionPhase::Idle {
                    let events = self.session.start();
                    self.handle_events(events);
                }
                false
            }
            KeyCode::Char('s') => {
                self.retry_export();
                false
            }
            _ => false,
        }
    }

    /// Treat a click on cell (`column`, `row`) as a tap in whichever zone it falls in
    pub fn on_click(&mut self, column: u16, row: u16) -> Option<TouchLogEntry> {
        for hand in [Hand::Left, Hand::Right] {
            let rect = ui::zone_rect(self.last_area, hand);
            if let Some(point) = ui::cell_to_zone_point(rect, column, row) {
                let id = self.session.target_at(hand, point)?;
                return self.session.tap(hand, id, zone_center(ZONE_SIZE));
            }
        }
        None
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let _cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    // last chance to reach stderr before the alternate screen takes over
    if let Some(log_path) = AppDirs::log_path() {
        if let Err(e) = init_file_logging(&log_path) {
            eprintln!("logging disabled, {}: {}", log_path.display(), e);
        }
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        TouchSession::with_system_clock(SessionConfig::default()),
        AppDirs::export_dir(),
    );
    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<SystemClock, StdRng>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        ChannelEventSource::crossterm(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            TapEvent::Tick | TapEvent::Resize => {}
            TapEvent::Key(key) => {
                if app.on_key(key) {
                    break;
                }
            }
            TapEvent::Click { column, row } => {
                app.on_click(column, row);
            }
        }

        // clock-driven, so a busy event stream cannot stall the session
        app.on_tick();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::SeedableRng;
    use std::fs;
    use tapzone::clock::ManualClock;
    use tapzone::geometry::Point;
    use tempfile::tempdir;

    fn app(export_dir: PathBuf) -> App<ManualClock, StdRng> {
        let mut app = App::new(
            TouchSession::new(
                SessionConfig::default(),
                ManualClock::new(),
                StdRng::seed_from_u64(11),
            ),
            export_dir,
        );
        app.last_area = Rect::new(0, 0, 100, 40);
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cli_takes_no_options() {
        assert!(Cli::try_parse_from(["tapzone"]).is_ok());
        assert!(Cli::try_parse_from(["tapzone", "--duration", "10"]).is_err());
    }

    #[test]
    fn test_space_starts_session() {
        let dir = tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());

        assert!(!app.on_key(key(KeyCode::Char(' '))));
        assert_eq!(app.session.phase(), SessionPhase::CountdownRight);

        // a second press does not restart the countdown
        app.session.tick();
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.session.countdown().unwrap().remaining(), 2);
    }

    #[test]
    fn test_quit_keys() {
        let dir = tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());
        assert!(app.on_key(key(KeyCode::Esc)));
        assert!(app.on_key(key(KeyCode::Char('q'))));
        assert!(app.on_key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!app.on_key(key(KeyCode::Char('x'))));
    }

    #[test]
    fn test_click_on_target_logs_tap() {
        let dir = tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());
        app.on_key(key(KeyCode::Char(' ')));
        for _ in 0..3 {
            app.session.tick();
        }
        let target = app.session.spawn_tick(ZONE_SIZE).unwrap();

        let rect = ui::zone_rect(app.last_area, Hand::Right);
        let (col, row) = ui::zone_point_to_cell(rect, target.position);

        let entry = app.on_click(col, row).unwrap();
        assert_eq!(entry.hand, Hand::Right);
        assert!(app.session.targets(Hand::Right).is_empty());

        // same cell again hits nothing
        assert!(app.on_click(col, row).is_none());
        assert_eq!(app.session.log().len(), 1);
    }

    #[test]
    fn test_clicks_hit_within_drawn_target_only() {
        let dir = tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());
        app.on_key(key(KeyCode::Char(' ')));
        for _ in 0..3 {
            app.session.tick();
        }
        let target = app.session.spawn_tick(ZONE_SIZE).unwrap();
        let drawn = ui::target_circle(
            &target,
            app.session.config().target_radius,
            ratatui::style::Color::Red,
        );

        // walk from the target toward the zone center so both clicks stay in the zone
        let center = zone_center(ZONE_SIZE);
        let (dx, dy) = center.offset_from(target.position);
        let len = dx.hypot(dy);
        let at = |d: f64| {
            Point::new(
                target.position.x + dx / len * d,
                target.position.y + dy / len * d,
            )
        };
        let rect = ui::zone_rect(app.last_area, Hand::Right);

        let (col, row) = ui::zone_point_to_cell(rect, at(drawn.radius * 1.5));
        assert!(app.on_click(col, row).is_none());

        let (col, row) = ui::zone_point_to_cell(rect, at(drawn.radius * 0.8));
        let entry = app.on_click(col, row).unwrap();
        assert_eq!(entry.hand, Hand::Right);
    }

    #[test]
    fn test_click_in_inactive_zone_is_ignored() {
        let dir = tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());
        app.on_key(key(KeyCode::Char(' ')));
        for _ in 0..3 {
            app.session.tick();
        }
        let target = app.session.spawn_tick(ZONE_SIZE).unwrap();

        let left = ui::zone_rect(app.last_area, Hand::Left);
        let (col, row) = ui::zone_point_to_cell(left, target.position);
        assert!(app.on_click(col, row).is_none());
        assert!(app.on_click(0, 0).is_none());
        assert_eq!(app.session.targets(Hand::Right).len(), 1);
    }

    #[test]
    fn test_finished_session_is_saved() {
        let dir = tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());
        app.on_key(key(KeyCode::Char(' ')));

        app.session.clock().advance(Duration::from_secs(3 + 30 + 3 + 30));
        app.on_tick();

        assert!(app.session.is_finished());
        let path = match &app.export_status {
            Some(ExportStatus::Saved(path)) => path.clone(),
            other => panic!("expected saved export, got {:?}", other),
        };
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("hand,distance_from_center,dx,dy,response_time\n"));
    }

    #[test]
    fn test_failed_save_can_be_retried() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let mut app = app(blocker);
        app.on_key(key(KeyCode::Char(' ')));
        app.session.clock().advance(Duration::from_secs(66));
        app.on_tick();
        assert_matches!(app.export_status, Some(ExportStatus::Failed(_)));

        app.export_dir = dir.path().join("exports");
        app.on_key(key(KeyCode::Char('s')));
        assert_matches!(app.export_status, Some(ExportStatus::Saved(ref p)) if p.exists());
    }
}
