//! Repeating tick source for the countdown.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

struct Interval {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

/// Owns at most one running interval.
///
/// Every start bumps the generation; ticks are tagged with the generation of
/// the interval that produced them so late ticks from a cancelled interval
/// can be told apart.
pub struct Ticker {
    period: Duration,
    generation: u64,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            interval: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    /// Generation of the current (or most recent) interval.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts an interval calling `on_tick(generation)` once per period.
    /// Does nothing if one is already running. The interval ends when
    /// `on_tick` returns false or [`Ticker::stop`] is called.
    pub fn start<F>(&mut self, on_tick: F)
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        if self.is_active() {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let (stop, stop_rx) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("pomodoro-clock".to_string())
            .spawn(move || {
                let mut on_tick = on_tick;
                let mut next = Instant::now() + period;
                loop {
                    let wait = next.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !on_tick(generation) {
                                break;
                            }
                            next = next_deadline(next, period, Instant::now());
                        }
                        // Stop requested or ticker dropped.
                        _ => break,
                    }
                }
            });

        match spawned {
            Ok(thread) => {
                debug!(generation, "Clock started");
                self.interval = Some(Interval { stop, thread });
            }
            Err(e) => error!(error = %e, "Failed to start clock thread"),
        }
    }

    /// Cancels the running interval and waits for its thread to exit.
    pub fn stop(&mut self) {
        if let Some(interval) = self.interval.take() {
            drop(interval.stop);
            let _ = interval.thread.join();
            debug!(generation = self.generation, "Clock stopped");
        }
    }
}

/// Deadline after the tick scheduled at `scheduled`. Keeps a steady cadence,
/// but after a stall (e.g. system sleep) the missed ticks are dropped instead
/// of fired back to back.
fn next_deadline(scheduled: Instant, period: Duration, now: Instant) -> Instant {
    let next = scheduled + period;
    if next + period < now {
        now + period
    } else {
        next
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
