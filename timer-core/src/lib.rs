//! Pure timing logic library with no platform dependencies.
//! Time and periodic sampling are injected, so everything here is testable on host.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

pub mod format;

pub use format::{format, format_hms, format_hms_cs, format_lap, FormattedTime};

/// Display refresh cadence while running.
pub const CADENCE_MS: u64 = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerState {
    Stopped,
    Running,
}

/// Millisecond time source. Must not go backwards.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// A cancellable periodic task that drives display sampling.
pub trait Scheduler {
    fn arm(&mut self, cadence_ms: u64);
    fn disarm(&mut self);
}

/// Milliseconds since the clock was created, from `Instant`.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self { now: Rc::new(Cell::new(now_ms)) }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Stopwatch state machine: Stopped <-> Running, with lap splits.
///
/// While running, elapsed time is `now - start_epoch`; while stopped it is the
/// frozen `accumulated_ms`. The scheduler is armed exactly while running.
pub struct TimerEngine<C: Clock, S: Scheduler> {
    clock: C,
    scheduler: S,
    state: TimerState,
    start_epoch_ms: u64,
    accumulated_ms: u64,
    laps: Vec<u64>,
    cadence_ms: u64,
}

impl<C: Clock, S: Scheduler> TimerEngine<C, S> {
    pub fn new(clock: C, scheduler: S) -> Self {
        Self::with_cadence(clock, scheduler, CADENCE_MS)
    }

    pub fn with_cadence(clock: C, scheduler: S, cadence_ms: u64) -> Self {
        Self {
            clock,
            scheduler,
            state: TimerState::Stopped,
            start_epoch_ms: 0,
            accumulated_ms: 0,
            laps: Vec::new(),
            cadence_ms,
        }
    }

    pub fn start(&mut self) {
        if self.state == TimerState::Running {
            return;
        }
        // Resume from whatever was accumulated before the pause
        self.start_epoch_ms = self.clock.now_ms().saturating_sub(self.accumulated_ms);
        self.state = TimerState::Running;
        self.scheduler.arm(self.cadence_ms);
    }

    pub fn stop(&mut self) {
        if self.state != TimerState::Running {
            return;
        }
        self.scheduler.disarm();
        self.accumulated_ms = self.sample();
        self.state = TimerState::Stopped;
    }

    pub fn reset(&mut self) {
        self.stop();
        self.accumulated_ms = 0;
        self.start_epoch_ms = 0;
        self.laps.clear();
    }

    /// Record the time since the previous lap boundary. `None` while stopped.
    pub fn lap(&mut self) -> Option<u64> {
        if self.state != TimerState::Running {
            return None;
        }
        let recorded: u64 = self.laps.iter().sum();
        let lap = self.sample().saturating_sub(recorded);
        self.laps.push(lap);
        Some(lap)
    }

    /// Current elapsed milliseconds.
    pub fn sample(&self) -> u64 {
        match self.state {
            TimerState::Running => self.clock.now_ms().saturating_sub(self.start_epoch_ms),
            TimerState::Stopped => self.accumulated_ms,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn laps(&self) -> &[u64] {
        &self.laps
    }

    pub fn cadence_ms(&self) -> u64 {
        self.cadence_ms
    }
}

impl<C: Clock, S: Scheduler> Drop for TimerEngine<C, S> {
    fn drop(&mut self) {
        if self.state == TimerState::Running {
            self.scheduler.disarm();
        }
    }
}
