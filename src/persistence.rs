//! SQLite-backed key-value store with JSON values.

use crate::models::{PomodoroState, PomodoroUiState};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

pub const POMODORO_KEY: &str = "quick-look-pomodoro";
pub const POMODORO_UI_KEY: &str = "quick-look-pomodoro-ui-state";
pub const TASKS_KEY: &str = "quick-look-tasks";
pub const NOTIFICATION_PERMISSION_KEY: &str = "quick-look-notification-permission";

const AVAILABILITY_PROBE_KEY: &str = "__storage_test__";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens the store at `path`, creating the file and tables if needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| StoreError::DirectoryCreation)?;
        }

        let conn = Connection::open(path)?;
        // The reader and the background writer each hold a connection.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::initialize_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store. Nothing written here outlives the process.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Opens the store at `path`, falling back to memory if the file is unusable.
    pub fn open_or_fallback(path: &Path) -> Result<Self, StoreError> {
        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Storage unavailable, state will not persist");
                Self::open_in_memory()
            }
        }
    }

    fn initialize_tables(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, json: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
            params![key, json],
        )?;
        Ok(())
    }

    /// Reads and decodes `key`, returning `default` if it is missing or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get_json(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                error!(key, error = %e, "Error reading from storage");
                default
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_raw(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Encodes and writes `value`. Returns false if the write failed.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|json| self.set_raw(key, &json));
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(key, error = %e, "Error saving to storage");
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.conn.execute("DELETE FROM kv WHERE key = ?", [key]) {
            Ok(_) => true,
            Err(e) => {
                error!(key, error = %e, "Error removing from storage");
                false
            }
        }
    }

    /// Checks that the store accepts writes.
    pub fn is_available(&self) -> bool {
        self.set_raw(AVAILABILITY_PROBE_KEY, "\"test\"").is_ok()
            && self.remove(AVAILABILITY_PROBE_KEY)
    }

    /// Loads the persisted Pomodoro state, filling gaps with defaults.
    pub fn load_pomodoro_state(&self, today: NaiveDate) -> PomodoroState {
        let saved = self.get(POMODORO_KEY, Value::Object(Map::new()));
        decode_pomodoro_state(saved, today)
    }

    pub fn load_ui_state(&self) -> PomodoroUiState {
        self.get(POMODORO_UI_KEY, PomodoroUiState::default())
    }
}

/// Builds a state from a saved JSON object, field by field.
///
/// Saved fields are laid over the defaults one at a time; a field that does
/// not decode is dropped. `isRunning` is never restored.
pub fn decode_pomodoro_state(saved: Value, today: NaiveDate) -> PomodoroState {
    let defaults = PomodoroState::new(today);
    let Value::Object(saved) = saved else {
        warn!("Persisted pomodoro state is not an object, using defaults");
        return defaults;
    };
    let Ok(Value::Object(mut merged)) = serde_json::to_value(&defaults) else {
        return defaults;
    };

    for (key, value) in saved {
        let previous = merged.insert(key.clone(), value);
        if serde_json::from_value::<PomodoroState>(Value::Object(merged.clone())).is_err() {
            warn!(field = %key, "Discarding unreadable persisted field");
            match previous {
                Some(previous) => merged.insert(key, previous),
                None => merged.remove(&key),
            };
        }
    }

    let mut state = serde_json::from_value::<PomodoroState>(Value::Object(merged))
        .unwrap_or(defaults);
    sanitize_loaded(&mut state);
    state
}

fn sanitize_loaded(state: &mut PomodoroState) {
    state.is_running = false;

    for field in state.config.sanitize() {
        warn!(field, "Persisted setting out of range, using default");
    }
    if state.current_session == 0 {
        state.current_session = 1;
    }
    let full = state.phase_duration();
    if state.time_remaining == 0 || state.time_remaining > full {
        state.time_remaining = full;
    }
}
