mod input;
mod pump;
mod stopwatch;
mod storage;
mod theme;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use crossbeam::channel;
use num_traits::{FromPrimitive, ToPrimitive};
use structopt::StructOpt;
use timer_core::{Clock, MonotonicClock, Scheduler, TimerEngine, CADENCE_MS};

use crate::pump::Pump;
use crate::stopwatch::{command_for_key, Command, StopwatchState};
use crate::storage::{FileStore, PreferenceStore};
use crate::theme::Theme;

const APP_NAME: &str = "Stopwatch";

#[derive(Debug, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub enum AppOp {
    Redraw = 0,
    Rawkeys,
    Pump,
    Quit,
}

/// Two-word message passed between the worker threads and the main loop.
#[derive(Clone, Copy, Debug)]
pub struct Scalar {
    pub id: usize,
    pub arg1: usize,
}

impl Scalar {
    pub fn new(op: impl ToPrimitive, arg1: usize) -> Self {
        Self {
            id: op.to_usize().unwrap_or(usize::MAX),
            arg1,
        }
    }
}

#[derive(StructOpt)]
#[structopt(name = "stopwatch", about = "Stopwatch with lap splits")]
struct Options {
    /// Preference file holding the theme.
    #[structopt(long, default_value = "stopwatch-prefs.json", parse(from_os_str))]
    store: PathBuf,

    /// Display refresh interval in milliseconds while running.
    #[structopt(long, default_value = "10")]
    cadence: u64,

    /// Enable debug messages.
    #[structopt(long)]
    debug: bool,
}

struct StopwatchApp<C: Clock, S: Scheduler, W: Write> {
    stopwatch: StopwatchState<C, S>,
    store: Box<dyn PreferenceStore>,
    theme: Theme,
    help_visible: bool,
    out: W,
}

impl<C: Clock, S: Scheduler, W: Write> StopwatchApp<C, S, W> {
    fn new(timer: TimerEngine<C, S>, store: Box<dyn PreferenceStore>, out: W) -> Self {
        let theme = Theme::load(&*store);
        log::info!("{} theme is {}", APP_NAME, theme.as_str());
        Self {
            stopwatch: StopwatchState::new(timer),
            store,
            theme,
            help_visible: true,
            out,
        }
    }

    fn redraw(&mut self) {
        let frame = self.stopwatch.frame(self.theme, self.help_visible);
        if let Err(e) = ui::draw_stopwatch(&mut self.out, &frame) {
            log::error!("can't draw: {}", e);
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(e) = self.theme.save(&mut *self.store) {
            log::error!("Failed to save theme: {}", e);
        }
    }

    /// Returns false once the app should quit.
    fn handle_key(&mut self, key: char) -> bool {
        let command = match command_for_key(key) {
            Some(command) => command,
            None => return true,
        };

        // First key dismisses the shortcut banner
        let mut dirty = self.help_visible;
        self.help_visible = false;

        match command {
            Command::Quit => return false,
            Command::ToggleTheme => {
                self.toggle_theme();
                dirty = true;
            }
            _ => dirty |= self.stopwatch.apply(command),
        }
        if dirty {
            self.redraw();
        }
        true
    }

    fn handle_pump(&mut self) {
        // A tick can still be queued after a stop
        if self.stopwatch.timer.is_running() {
            self.redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let opt = Options::from_args();

    let level = if opt.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::info!("{} PID is {}", APP_NAME, std::process::id());

    let cadence = if opt.cadence == 0 {
        log::warn!("cadence must be positive, using {} ms", CADENCE_MS);
        CADENCE_MS
    } else {
        opt.cadence
    };

    let store = FileStore::new(&opt.store);
    log::debug!("preferences at {}", store.path().display());

    let (main_conn, inbox) = channel::unbounded();
    let pump = Pump::spawn(main_conn.clone());
    input::spawn(main_conn.clone());
    main_conn.send(Scalar::new(AppOp::Redraw, 0)).ok();
    drop(main_conn);

    let timer = TimerEngine::with_cadence(MonotonicClock::new(), pump, cadence);
    let mut app = StopwatchApp::new(timer, Box::new(store), io::stdout());

    for msg in inbox.iter() {
        match FromPrimitive::from_usize(msg.id) {
            Some(AppOp::Redraw) => app.redraw(),
            Some(AppOp::Rawkeys) => {
                if let Some(key) = char::from_u32(msg.arg1 as u32) {
                    if !app.handle_key(key) {
                        break;
                    }
                }
            }
            Some(AppOp::Pump) => app.handle_pump(),
            Some(AppOp::Quit) => break,
            None => log::error!("unknown opcode: {:?}", msg),
        }
    }

    // Stop the timer so the pump is disarmed before it is torn down
    app.stopwatch.apply(Command::Stop);
    ui::clear_screen(&mut app.out).context("can't restore terminal")?;
    drop(app);
    log::info!("{} exiting", APP_NAME);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FailingStore, MemoryStore, StorageError};
    use crate::theme::KEY_THEME;
    use std::cell::RefCell;
    use std::rc::Rc;
    use timer_core::ManualClock;

    struct NullScheduler;

    impl Scheduler for NullScheduler {
        fn arm(&mut self, _cadence_ms: u64) {}
        fn disarm(&mut self) {}
    }

    /// Store that can be inspected after the app has taken ownership of it.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl PreferenceStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.borrow_mut().set(key, value)
        }
    }

    type TestApp = StopwatchApp<ManualClock, NullScheduler, Vec<u8>>;

    fn app(store: Box<dyn PreferenceStore>) -> (TestApp, ManualClock) {
        let clock = ManualClock::new(0);
        let timer = TimerEngine::new(clock.clone(), NullScheduler);
        (StopwatchApp::new(timer, store, Vec::new()), clock)
    }

    fn take_screen(app: &mut TestApp) -> String {
        String::from_utf8(std::mem::take(&mut app.out)).unwrap()
    }

    #[test]
    fn test_theme_loaded_from_store() {
        let mut store = MemoryStore::default();
        store.set(KEY_THEME, "dark").unwrap();
        let (app, _) = app(Box::new(store));
        assert_eq!(app.theme, Theme::Dark);
    }

    #[test]
    fn test_toggle_theme_persists_and_redraws() {
        let store = SharedStore::default();
        let (mut app, _) = app(Box::new(store.clone()));
        assert_eq!(app.theme, Theme::Light);

        assert!(app.handle_key('t'));
        assert_eq!(app.theme, Theme::Dark);
        assert_eq!(store.get(KEY_THEME).unwrap().as_deref(), Some("dark"));
        assert!(take_screen(&mut app).contains("(dark theme)"));

        assert!(app.handle_key('T'));
        assert_eq!(store.get(KEY_THEME).unwrap().as_deref(), Some("light"));
        assert!(take_screen(&mut app).contains("(light theme)"));
    }

    #[test]
    fn test_toggle_theme_survives_failed_save() {
        let (mut app, _) = app(Box::new(FailingStore));
        assert_eq!(app.theme, Theme::Light);
        assert!(app.handle_key('t'));
        assert_eq!(app.theme, Theme::Dark);
        assert!(take_screen(&mut app).contains("(dark theme)"));
    }

    #[test]
    fn test_first_key_dismisses_help() {
        let (mut app, _) = app(Box::new(MemoryStore::default()));
        app.redraw();
        assert!(take_screen(&mut app).contains("Keyboard Shortcuts:"));

        // Lap while stopped changes nothing, but still clears the banner
        assert!(app.handle_key('l'));
        assert!(!app.help_visible);
        let screen = take_screen(&mut app);
        assert!(!screen.is_empty());
        assert!(!screen.contains("Keyboard Shortcuts:"));

        // Later no-op keys do not redraw
        assert!(app.handle_key('l'));
        assert!(app.out.is_empty());
    }

    #[test]
    fn test_unbound_key_ignored() {
        let (mut app, _) = app(Box::new(MemoryStore::default()));
        assert!(app.handle_key('x'));
        assert!(app.help_visible);
        assert!(app.out.is_empty());
    }

    #[test]
    fn test_pump_redraws_only_while_running() {
        let (mut app, clock) = app(Box::new(MemoryStore::default()));
        assert!(app.handle_key(' '));
        take_screen(&mut app);

        clock.advance(1_230);
        app.handle_pump();
        assert!(take_screen(&mut app).contains("00:00:01.23"));

        assert!(app.handle_key(' '));
        take_screen(&mut app);
        clock.advance(500);
        app.handle_pump();
        assert!(app.out.is_empty());
        assert_eq!(app.stopwatch.timer.sample(), 1_230);
    }

    #[test]
    fn test_quit_key() {
        let (mut app, _) = app(Box::new(MemoryStore::default()));
        assert!(!app.handle_key('q'));
        assert!(!app.handle_key('Q'));
    }
}
