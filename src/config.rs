//! Runtime configuration.

use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DATA_DIR_ENV: &str = "QUICKLOOK_DATA_DIR";
const DB_FILE_NAME: &str = "quicklook.db";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Countdown resolution.
    pub tick_interval: Duration,
    /// How often the calendar day is re-checked.
    pub rollover_interval: Duration,
    /// Window for coalescing state writes.
    pub persist_debounce: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            tick_interval: Duration::from_secs(1),
            rollover_interval: Duration::from_secs(60 * 60),
            persist_debounce: Duration::from_millis(100),
        }
    }
}

impl AppConfig {
    /// Defaults with the data directory overridable via `QUICKLOOK_DATA_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "quicklook", "QuickLook")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
