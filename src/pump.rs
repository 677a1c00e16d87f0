use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use num_traits::FromPrimitive;
use timer_core::{Scheduler, CADENCE_MS};

use crate::{AppOp, Scalar};

#[derive(Debug, num_derive::FromPrimitive, num_derive::ToPrimitive)]
enum PumpOp {
    Arm = 0,
    Disarm,
    Quit,
}

/// Periodic `AppOp::Pump` source running on its own thread.
///
/// Armed, it posts one pump message to the main loop per cadence interval.
/// Disarmed, it blocks until told otherwise. Dropping the handle stops and
/// joins the thread.
pub struct Pump {
    conn: Sender<Scalar>,
    handle: Option<JoinHandle<()>>,
}

impl Pump {
    pub fn spawn(main_conn: Sender<Scalar>) -> Self {
        let (conn, control) = channel::unbounded();
        let handle = thread::Builder::new()
            .name("pump".into())
            .spawn(move || pump_thread(control, main_conn))
            .map_err(|e| log::error!("can't spawn pump thread: {}", e))
            .ok();
        Self { conn, handle }
    }
}

impl Scheduler for Pump {
    fn arm(&mut self, cadence_ms: u64) {
        self.conn.send(Scalar::new(PumpOp::Arm, cadence_arg(cadence_ms))).ok();
    }

    fn disarm(&mut self) {
        self.conn.send(Scalar::new(PumpOp::Disarm, 0)).ok();
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.conn.send(Scalar::new(PumpOp::Quit, 0)).ok();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("pump thread panicked");
            }
        }
    }
}

/// Cadence as a scalar argument, clamped where `usize` is narrower than `u64`.
fn cadence_arg(cadence_ms: u64) -> usize {
    usize::try_from(cadence_ms).unwrap_or(usize::MAX)
}

fn pump_thread(control: Receiver<Scalar>, main_conn: Sender<Scalar>) {
    let mut interval = Duration::from_millis(CADENCE_MS);
    let mut next_tick: Option<Instant> = None;

    loop {
        // Block-wait when disarmed, wait until the next tick when armed
        let envelope = match next_tick {
            Some(deadline) => match control.recv_deadline(deadline) {
                Ok(msg) => Some(msg),
                Err(RecvTimeoutError::Timeout) => {
                    if main_conn.send(Scalar::new(AppOp::Pump, 0)).is_err() {
                        break;
                    }
                    // Skip missed ticks rather than bursting to catch up
                    let now = Instant::now();
                    next_tick = match deadline.checked_add(interval) {
                        Some(next) if next > now => Some(next),
                        _ => now.checked_add(interval),
                    };
                    None
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match control.recv() {
                Ok(msg) => Some(msg),
                Err(_) => break,
            },
        };

        if let Some(msg) = envelope {
            match FromPrimitive::from_usize(msg.id) {
                Some(PumpOp::Arm) => {
                    let mut interval_ms = u64::try_from(msg.arg1).unwrap_or(u64::MAX);
                    if interval_ms == 0 {
                        interval_ms = CADENCE_MS;
                    }
                    interval = Duration::from_millis(interval_ms);
                    if next_tick.is_none() {
                        // An interval past the end of time never ticks
                        next_tick = Instant::now().checked_add(interval);
                    }
                    log::debug!("pump armed at {} ms", interval_ms);
                }
                Some(PumpOp::Disarm) => {
                    next_tick = None;
                    log::debug!("pump disarmed");
                }
                Some(PumpOp::Quit) => break,
                None => log::error!("unknown pump opcode: {:?}", msg),
            }
        }
    }
}
