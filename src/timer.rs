//! Countdown driver.
//!
//! All state changes go through a single command queue owned by the main
//! thread. The clock and the rollover watcher only send commands.

use crate::app::{App, CompletionEvent};
use crate::clock::Ticker;
use crate::config::AppConfig;
use crate::models::{PomodoroState, SettingsPatch};
use crate::notifications::NotificationEmitter;
use crate::rollover::RolloverWatcher;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info};

/// Title shown in the tray when nothing is counting down.
pub const IDLE_TITLE: &str = "🍅";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Skip,
    CompleteSession,
    ResetAll,
    ResetPomodoro,
    ClearHistory,
    SetActiveTask(String),
    ClearActiveTask,
    FinishActiveTask,
    UpdateSettings(SettingsPatch),
    TogglePanel,
    /// One second elapsed on the clock interval with this generation.
    Tick { generation: u64 },
    /// Re-check the calendar day for stats rollover.
    CheckDay,
}

/// What happened while handling one or more commands.
#[derive(Debug, Default)]
pub struct DriverOutcome {
    pub changed: bool,
    pub completions: Vec<CompletionEvent>,
}

impl DriverOutcome {
    fn merge(&mut self, other: DriverOutcome) {
        self.changed |= other.changed;
        self.completions.extend(other.completions);
    }
}

pub struct Driver {
    app: App,
    clock: Ticker,
    emitter: NotificationEmitter,
    tx: Sender<Command>,
    rx: Receiver<Command>,
    rollover: Option<RolloverWatcher>,
}

impl Driver {
    /// Takes ownership of the app. Stats from a previous day are rolled over
    /// before any command runs.
    pub fn new(app: App, config: &AppConfig, emitter: NotificationEmitter) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut driver = Self {
            app,
            clock: Ticker::new(config.tick_interval),
            emitter,
            tx,
            rx,
            rollover: None,
        };
        driver.app.reset_daily_stats();
        driver
    }

    /// Starts the periodic day check.
    pub fn watch_rollover(&mut self, config: &AppConfig) {
        if self.rollover.is_none() {
            self.rollover = Some(RolloverWatcher::spawn(
                self.tx.clone(),
                config.rollover_interval,
            ));
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Handles every queued command.
    pub fn drain(&mut self) -> DriverOutcome {
        let mut outcome = DriverOutcome::default();
        while let Ok(command) = self.rx.try_recv() {
            outcome.merge(self.dispatch(command));
        }
        outcome
    }

    /// Applies one command, then completes the phase if the countdown
    /// reached zero while running.
    pub fn dispatch(&mut self, command: Command) -> DriverOutcome {
        let mut outcome = DriverOutcome {
            changed: self.apply(command),
            completions: Vec::new(),
        };

        if self.app.state.is_running && self.app.state.time_remaining == 0 {
            let event = self.app.complete_phase();
            let emitted = self
                .emitter
                .emit(&event, self.app.state.config.sound_enabled);
            info!(
                finished = ?event.finished,
                next = ?event.next,
                completed_sessions = event.completed_sessions,
                auto_started = event.auto_started,
                chimed = emitted.chimed,
                notified = emitted.notified,
                "Phase finished"
            );
            outcome.changed = true;
            outcome.completions.push(event);
        }

        self.sync_clock();
        outcome
    }

    /// Stops background threads and writes pending state.
    pub fn shutdown(&mut self) {
        self.clock.stop();
        self.rollover = None;
        self.app.flush();
    }

    fn apply(&mut self, command: Command) -> bool {
        let app = &mut self.app;
        match command {
            Command::Tick { generation } => {
                if !self.clock.is_active() || generation != self.clock.generation() {
                    debug!(generation, "Ignoring stale tick");
                    return false;
                }
                return app.tick();
            }
            Command::Start => app.start(),
            Command::Pause => app.pause(),
            Command::Reset => app.reset(),
            Command::Skip => {
                let change = app.skip_phase();
                debug!(from = ?change.from, to = ?change.to, "Skip handled");
            }
            Command::CompleteSession => match app.complete_session() {
                Some(event) => info!(
                    finished = ?event.finished,
                    next = ?event.next,
                    completed_sessions = event.completed_sessions,
                    "Session completed early"
                ),
                None => debug!("Complete requested while idle, moved to work"),
            },
            Command::ResetAll => app.reset_all(),
            Command::ResetPomodoro => app.reset_pomodoro(),
            Command::ClearHistory => app.clear_history(),
            Command::SetActiveTask(id) => app.set_active_task(&id),
            Command::ClearActiveTask => app.clear_active_task(),
            Command::FinishActiveTask => app.finish_active_task(),
            Command::UpdateSettings(patch) => return app.update_settings(&patch).is_ok(),
            Command::TogglePanel => app.toggle_panel(),
            Command::CheckDay => return app.reset_daily_stats(),
        }
        true
    }

    /// Keeps exactly one interval running while the countdown is live.
    fn sync_clock(&mut self) {
        let should_run = self.app.state.is_running && self.app.state.time_remaining > 0;
        if should_run && !self.clock.is_active() {
            let tx = self.tx.clone();
            self.clock
                .start(move |generation| tx.send(Command::Tick { generation }).is_ok());
        } else if !should_run && self.clock.is_active() {
            self.clock.stop();
        }
    }

    #[cfg(test)]
    fn sender(&self) -> Sender<Command> {
        self.tx.clone()
    }

    #[cfg(test)]
    fn clock_generation(&self) -> u64 {
        self.clock.generation()
    }

    #[cfg(test)]
    fn clock_active(&self) -> bool {
        self.clock.is_active()
    }
}

/// Formats the tray title from the current countdown.
pub fn format_tray_title(state: &PomodoroState) -> String {
    if state.is_running && state.time_remaining > 0 {
        format!(
            "{} {}",
            state.current_phase.emoji(),
            format_time(state.time_remaining)
        )
    } else if !state.is_at_full_duration() {
        format!("⏸ {}", format_time(state.time_remaining))
    } else {
        IDLE_TITLE.to_string()
    }
}

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
