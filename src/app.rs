//! Main application state and logic.

use crate::config::AppConfig;
use crate::models::{ConfigError, Phase, PomodoroState, PomodoroUiState, SettingsPatch};
use crate::persistence::{Store, StoreError, POMODORO_KEY, POMODORO_UI_KEY};
use crate::pomodoro::{self, PhaseChange};
use crate::stats::{self, StatsReport};
use crate::tasks::{Task, TaskRegistry, LINKABLE_STATUSES};
use crate::writer::DebouncedWriter;
use chrono::Local;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// A phase that ran out; drives notifications and sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    pub finished: Phase,
    pub next: Phase,
    pub completed_sessions: u32,
    pub auto_started: bool,
}

/// Owns the Pomodoro state and persists it after every mutation.
pub struct App {
    pub state: PomodoroState,
    pub ui: PomodoroUiState,
    store: Store,
    writer: DebouncedWriter,
}

impl App {
    /// Opens the store under the configured data directory and loads state.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let path = config.db_path();
        let store = Store::open_or_fallback(&path)?;
        let writer = DebouncedWriter::spawn(
            Store::open_or_fallback(&path)?,
            config.persist_debounce,
        );
        Ok(Self::with_store(store, writer))
    }

    /// Builds an app from an already opened store (reads) and writer (writes).
    pub fn with_store(store: Store, writer: DebouncedWriter) -> Self {
        if !store.is_available() {
            warn!("Storage is not accepting writes, changes will not persist");
        }
        let state = store.load_pomodoro_state(Local::now().date_naive());
        let ui = store.load_ui_state();

        Self {
            state,
            ui,
            store,
            writer,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn start(&mut self) {
        pomodoro::start(&mut self.state, Local::now());
        self.persist();
    }

    pub fn pause(&mut self) {
        pomodoro::pause(&mut self.state);
        self.persist();
    }

    pub fn reset(&mut self) {
        pomodoro::reset(&mut self.state);
        self.persist();
    }

    /// Advances the countdown. Saves every ten seconds rather than every tick.
    pub fn tick(&mut self) -> bool {
        let changed = pomodoro::tick(&mut self.state);
        if changed && self.state.time_remaining % 10 == 0 {
            self.persist();
        }
        changed
    }

    pub fn complete_phase(&mut self) -> CompletionEvent {
        let change = pomodoro::complete_phase(&mut self.state, Local::now());
        self.persist();
        self.completion_event(change)
    }

    pub fn skip_phase(&mut self) -> PhaseChange {
        let change = pomodoro::skip_phase(&mut self.state);
        self.persist();
        change
    }

    pub fn complete_session(&mut self) -> Option<CompletionEvent> {
        let change = pomodoro::complete_session(&mut self.state, Local::now());
        self.persist();
        change.map(|change| self.completion_event(change))
    }

    /// Clears progress, history and today's stats, keeping configuration.
    pub fn reset_all(&mut self) {
        pomodoro::reset_all(&mut self.state, Local::now().date_naive());
        info!("Reset all pomodoro data");
        self.persist();
    }

    /// Returns to a fresh work phase, keeping history and stats.
    pub fn reset_pomodoro(&mut self) {
        pomodoro::reset_pomodoro(&mut self.state);
        info!("Reset pomodoro timer");
        self.persist();
    }

    /// Validates and applies a settings change.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<(), ConfigError> {
        if let Err(e) = patch.validate() {
            warn!(error = %e, "Rejected settings change");
            return Err(e);
        }
        pomodoro::update_settings(&mut self.state, patch);
        self.persist();
        Ok(())
    }

    /// Links a task. The id is not checked against the task list.
    pub fn set_active_task(&mut self, task_id: &str) {
        pomodoro::set_active_task(&mut self.state, task_id);
        self.persist();
    }

    pub fn clear_active_task(&mut self) {
        pomodoro::clear_active_task(&mut self.state);
        self.persist();
    }

    /// Counts the linked task as completed today and unlinks it.
    pub fn finish_active_task(&mut self) {
        if self.state.active_task_id.is_none() {
            return;
        }
        pomodoro::record_task_completed(&mut self.state, Local::now().date_naive());
        self.persist();
    }

    /// Rolls today's stats over if the calendar day has changed.
    pub fn reset_daily_stats(&mut self) -> bool {
        let rolled = pomodoro::reset_daily_stats(&mut self.state, Local::now().date_naive());
        if rolled {
            self.persist();
        }
        rolled
    }

    pub fn clear_history(&mut self) {
        pomodoro::clear_history(&mut self.state);
        self.persist();
    }

    pub fn toggle_panel(&mut self) {
        self.set_panel_open(!self.ui.show_pomodoro_panel);
    }

    pub fn set_panel_open(&mut self, open: bool) {
        self.ui.show_pomodoro_panel = open;
        self.writer.save(POMODORO_UI_KEY, &self.ui);
    }

    /// Tasks that can be linked to the timer.
    pub fn linkable_tasks(&self) -> Vec<Task> {
        self.store.list_tasks(&LINKABLE_STATUSES)
    }

    /// Display name of the linked task, if one is linked.
    pub fn active_task_name(&self) -> Option<String> {
        self.state
            .active_task_id
            .as_deref()
            .map(|id| stats::task_display_name(&self.store, id))
    }

    pub fn report(&self) -> StatsReport {
        stats::build_report(&self.state, &self.store)
    }

    /// Blocks until queued writes are on disk.
    pub fn flush(&self) {
        self.writer.flush();
    }

    fn persist(&self) {
        self.writer.save(POMODORO_KEY, &self.state);
    }

    fn completion_event(&self, change: PhaseChange) -> CompletionEvent {
        CompletionEvent {
            finished: change.from,
            next: change.to,
            completed_sessions: self.state.completed_sessions,
            auto_started: change.auto_started,
        }
    }
}
