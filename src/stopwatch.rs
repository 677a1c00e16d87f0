use timer_core::{format, format_lap, Clock, FormattedTime, Scheduler, TimerEngine};

use crate::theme::Theme;

pub const NO_LAPS: &str = "No lap times recorded";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Start,
    Stop,
    Toggle,
    Reset,
    Lap,
    ToggleTheme,
    Quit,
}

pub fn command_for_key(key: char) -> Option<Command> {
    match key {
        ' ' => Some(Command::Toggle),
        'r' | 'R' => Some(Command::Reset),
        'l' | 'L' => Some(Command::Lap),
        't' | 'T' => Some(Command::ToggleTheme),
        'q' | 'Q' => Some(Command::Quit),
        _ => None,
    }
}

/// Everything the screen shows, computed from the current state.
#[derive(Clone, PartialEq, Debug)]
pub struct Frame {
    pub time: FormattedTime,
    pub laps: Vec<String>,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub lap_enabled: bool,
    pub theme: Theme,
    pub show_help: bool,
}

pub struct StopwatchState<C: Clock, S: Scheduler> {
    pub timer: TimerEngine<C, S>,
}

impl<C: Clock, S: Scheduler> StopwatchState<C, S> {
    pub fn new(timer: TimerEngine<C, S>) -> Self {
        Self { timer }
    }

    /// Apply a timer command. Returns true when the display changed.
    /// Theme and quit are not timer commands and are left to the caller.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Start => {
                if self.timer.is_running() {
                    return false;
                }
                self.timer.start();
                log::debug!("started at {} ms", self.timer.sample());
            }
            Command::Stop => {
                if !self.timer.is_running() {
                    return false;
                }
                self.timer.stop();
                log::debug!("stopped at {} ms", self.timer.sample());
            }
            Command::Toggle => {
                let next = if self.timer.is_running() { Command::Stop } else { Command::Start };
                return self.apply(next);
            }
            Command::Reset => {
                self.timer.reset();
                log::debug!("reset");
            }
            Command::Lap => match self.timer.lap() {
                Some(lap) => log::debug!("lap {}: {} ms", self.timer.laps().len(), lap),
                None => return false,
            },
            Command::ToggleTheme | Command::Quit => return false,
        }
        true
    }

    pub fn frame(&self, theme: Theme, show_help: bool) -> Frame {
        let running = self.timer.is_running();
        Frame {
            time: format(self.timer.sample()),
            laps: self
                .timer
                .laps()
                .iter()
                .enumerate()
                .map(|(i, &lap)| format_lap(i, lap))
                .collect(),
            start_enabled: !running,
            stop_enabled: running,
            lap_enabled: running,
            theme,
            show_help,
        }
    }
}
