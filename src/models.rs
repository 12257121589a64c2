//! Data models for the Pomodoro timer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

pub const DEFAULT_WORK_MINS: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINS: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINS: u32 = 15;
pub const DEFAULT_SESSIONS_UNTIL_LONG_BREAK: u32 = 4;

pub const WORK_MINS_RANGE: RangeInclusive<u32> = 1..=60;
pub const SHORT_BREAK_MINS_RANGE: RangeInclusive<u32> = 1..=30;
pub const LONG_BREAK_MINS_RANGE: RangeInclusive<u32> = 1..=60;
pub const SESSIONS_UNTIL_LONG_BREAK_RANGE: RangeInclusive<u32> = 2..=8;

/// Segment of the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
    /// Bootstrap state before the first start.
    Idle,
}

impl Phase {
    pub fn is_break(self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Work => "Focus Time",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
            Self::Idle => "Ready to Start",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Work => "🍅",
            Self::ShortBreak => "☕",
            Self::LongBreak => "🏖️",
            Self::Idle => "⏱️",
        }
    }
}

/// Error raised when a settings change is rejected at the input boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {field} must be between {min} and {max}, got {value}")]
    InvalidConfiguration {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

fn check_range(
    field: &'static str,
    value: Option<u32>,
    range: &RangeInclusive<u32>,
) -> Result<(), ConfigError> {
    match value {
        Some(v) if !range.contains(&v) => Err(ConfigError::InvalidConfiguration {
            field,
            value: v,
            min: *range.start(),
            max: *range.end(),
        }),
        _ => Ok(()),
    }
}

/// User-configurable settings for the pomodoro timer.
///
/// Serialized flat into the persisted Pomodoro record, so field names follow
/// the stored camelCase layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroConfig {
    /// Work phase length in minutes.
    pub work_duration: u32,
    /// Short break length in minutes.
    pub short_break_duration: u32,
    /// Long break length in minutes.
    pub long_break_duration: u32,
    /// Every Nth completed work phase is followed by a long break.
    pub sessions_until_long_break: u32,
    pub auto_start_breaks: bool,
    pub auto_start_work: bool,
    pub sound_enabled: bool,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_duration: DEFAULT_WORK_MINS,
            short_break_duration: DEFAULT_SHORT_BREAK_MINS,
            long_break_duration: DEFAULT_LONG_BREAK_MINS,
            sessions_until_long_break: DEFAULT_SESSIONS_UNTIL_LONG_BREAK,
            auto_start_breaks: false,
            auto_start_work: false,
            sound_enabled: true,
        }
    }
}

impl PomodoroConfig {
    /// Replaces out-of-bounds values with their defaults.
    /// Returns the names of the fields that were replaced.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let defaults = Self::default();
        let mut replaced = Vec::new();
        let mut fix = |field: &'static str, value: &mut u32, range: RangeInclusive<u32>, default: u32| {
            if !range.contains(value) {
                *value = default;
                replaced.push(field);
            }
        };
        fix(
            "workDuration",
            &mut self.work_duration,
            WORK_MINS_RANGE,
            defaults.work_duration,
        );
        fix(
            "shortBreakDuration",
            &mut self.short_break_duration,
            SHORT_BREAK_MINS_RANGE,
            defaults.short_break_duration,
        );
        fix(
            "longBreakDuration",
            &mut self.long_break_duration,
            LONG_BREAK_MINS_RANGE,
            defaults.long_break_duration,
        );
        fix(
            "sessionsUntilLongBreak",
            &mut self.sessions_until_long_break,
            SESSIONS_UNTIL_LONG_BREAK_RANGE,
            defaults.sessions_until_long_break,
        );
        replaced
    }
}

/// Partial settings update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub work_duration: Option<u32>,
    pub short_break_duration: Option<u32>,
    pub long_break_duration: Option<u32>,
    pub sessions_until_long_break: Option<u32>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_work: Option<bool>,
    pub sound_enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("workDuration", self.work_duration, &WORK_MINS_RANGE)?;
        check_range(
            "shortBreakDuration",
            self.short_break_duration,
            &SHORT_BREAK_MINS_RANGE,
        )?;
        check_range(
            "longBreakDuration",
            self.long_break_duration,
            &LONG_BREAK_MINS_RANGE,
        )?;
        check_range(
            "sessionsUntilLongBreak",
            self.sessions_until_long_break,
            &SESSIONS_UNTIL_LONG_BREAK_RANGE,
        )?;
        Ok(())
    }

    /// Merges the provided fields into `config`.
    pub fn apply_to(&self, config: &mut PomodoroConfig) {
        if let Some(v) = self.work_duration {
            config.work_duration = v;
        }
        if let Some(v) = self.short_break_duration {
            config.short_break_duration = v;
        }
        if let Some(v) = self.long_break_duration {
            config.long_break_duration = v;
        }
        if let Some(v) = self.sessions_until_long_break {
            config.sessions_until_long_break = v;
        }
        if let Some(v) = self.auto_start_breaks {
            config.auto_start_breaks = v;
        }
        if let Some(v) = self.auto_start_work {
            config.auto_start_work = v;
        }
        if let Some(v) = self.sound_enabled {
            config.sound_enabled = v;
        }
    }
}

/// Returns the full length of `phase` in seconds. Idle counts as work.
pub fn duration_for(phase: Phase, config: &PomodoroConfig) -> u32 {
    let mins = match phase {
        Phase::Work | Phase::Idle => config.work_duration,
        Phase::ShortBreak => config.short_break_duration,
        Phase::LongBreak => config.long_break_duration,
    };
    mins * 60
}

/// Statistics for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub date: NaiveDate,
    pub completed_pomodoros: u32,
    /// Minutes of completed work phases.
    pub total_focus_time: u32,
    pub completed_tasks: u32,
}

impl TodayStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            completed_pomodoros: 0,
            total_focus_time: 0,
            completed_tasks: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Work,
}

/// One work-phase attempt, recorded when the phase starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub task_id: Option<String>,
    /// Planned length in minutes.
    pub duration: u32,
    pub completed: bool,
}

/// The whole Pomodoro session state.
///
/// `is_running` is never serialized: a reloaded timer always starts paused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroState {
    pub current_phase: Phase,
    #[serde(skip)]
    pub is_running: bool,
    /// Seconds left in the current phase.
    pub time_remaining: u32,
    pub current_session: u32,
    pub completed_sessions: u32,
    #[serde(flatten)]
    pub config: PomodoroConfig,
    pub active_task_id: Option<String>,
    pub today_stats: TodayStats,
    pub pomodoro_history: Vec<HistoryEntry>,
}

impl PomodoroState {
    pub fn new(today: NaiveDate) -> Self {
        let config = PomodoroConfig::default();
        Self {
            current_phase: Phase::Work,
            is_running: false,
            time_remaining: duration_for(Phase::Work, &config),
            current_session: 1,
            completed_sessions: 0,
            config,
            active_task_id: None,
            today_stats: TodayStats::new(today),
            pomodoro_history: Vec::new(),
        }
    }

    /// Full length of the current phase in seconds.
    pub fn phase_duration(&self) -> u32 {
        duration_for(self.current_phase, &self.config)
    }

    pub fn is_at_full_duration(&self) -> bool {
        self.time_remaining == self.phase_duration()
    }

    /// Returns the progress through the current phase (0.0 to 1.0).
    pub fn progress_percent(&self) -> f32 {
        let total = self.phase_duration();
        if total == 0 {
            return 1.0;
        }
        1.0 - (self.time_remaining.min(total) as f32 / total as f32)
    }

    /// Index of the trailing history entry if it is an unfinished work attempt.
    pub fn open_entry_index(&self) -> Option<usize> {
        let idx = self.pomodoro_history.len().checked_sub(1)?;
        let entry = &self.pomodoro_history[idx];
        (!entry.completed && entry.kind == EntryKind::Work).then_some(idx)
    }
}

/// Panel visibility, persisted under its own key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroUiState {
    #[serde(default)]
    pub show_pomodoro_panel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_state_defaults() {
        let state = PomodoroState::new(day());
        assert_eq!(state.current_phase, Phase::Work);
        assert!(!state.is_running);
        assert_eq!(state.time_remaining, 25 * 60);
        assert_eq!(state.current_session, 1);
        assert_eq!(state.completed_sessions, 0);
        assert_eq!(state.config, PomodoroConfig::default());
        assert_eq!(state.today_stats, TodayStats::new(day()));
        assert!(state.pomodoro_history.is_empty());
    }

    #[test]
    fn test_duration_for_each_phase() {
        let config = PomodoroConfig {
            work_duration: 30,
            short_break_duration: 7,
            long_break_duration: 20,
            ..PomodoroConfig::default()
        };
        assert_eq!(duration_for(Phase::Work, &config), 1800);
        assert_eq!(duration_for(Phase::ShortBreak, &config), 420);
        assert_eq!(duration_for(Phase::LongBreak, &config), 1200);
        assert_eq!(duration_for(Phase::Idle, &config), 1800);
    }

    #[test]
    fn test_progress_percent() {
        let mut state = PomodoroState::new(day());
        assert_eq!(state.progress_percent(), 0.0);

        state.time_remaining = 750;
        assert!((state.progress_percent() - 0.5).abs() < 0.01);

        state.time_remaining = 0;
        assert!((state.progress_percent() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Phase::ShortBreak).unwrap(),
            "\"short_break\""
        );
        let phase: Phase = serde_json::from_str("\"long_break\"").unwrap();
        assert_eq!(phase, Phase::LongBreak);
    }

    #[test]
    fn test_state_json_layout_is_flat_and_excludes_running() {
        let mut state = PomodoroState::new(day());
        state.is_running = true;
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["currentPhase"], "work");
        assert_eq!(value["workDuration"], 25);
        assert_eq!(value["sessionsUntilLongBreak"], 4);
        assert_eq!(value["todayStats"]["completedPomodoros"], 0);
        assert!(value.get("isRunning").is_none());
        assert!(value.get("config").is_none());
    }

    #[test]
    fn test_patch_validation_bounds() {
        assert!(SettingsPatch::default().validate().is_ok());

        let ok = SettingsPatch {
            work_duration: Some(60),
            short_break_duration: Some(1),
            sessions_until_long_break: Some(8),
            ..SettingsPatch::default()
        };
        assert!(ok.validate().is_ok());

        let bad = SettingsPatch {
            short_break_duration: Some(31),
            ..SettingsPatch::default()
        };
        assert_eq!(
            bad.validate(),
            Err(ConfigError::InvalidConfiguration {
                field: "shortBreakDuration",
                value: 31,
                min: 1,
                max: 30,
            })
        );

        let bad = SettingsPatch {
            sessions_until_long_break: Some(1),
            ..SettingsPatch::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_patch_applies_only_given_fields() {
        let mut config = PomodoroConfig::default();
        SettingsPatch {
            long_break_duration: Some(30),
            auto_start_work: Some(true),
            ..SettingsPatch::default()
        }
        .apply_to(&mut config);

        assert_eq!(config.long_break_duration, 30);
        assert!(config.auto_start_work);
        assert_eq!(config.work_duration, DEFAULT_WORK_MINS);
        assert!(!config.auto_start_breaks);
    }

    #[test]
    fn test_config_sanitize_replaces_out_of_range() {
        let mut config = PomodoroConfig {
            work_duration: 0,
            sessions_until_long_break: 20,
            ..PomodoroConfig::default()
        };
        let replaced = config.sanitize();
        assert_eq!(replaced, vec!["workDuration", "sessionsUntilLongBreak"]);
        assert_eq!(config, PomodoroConfig::default());
    }

    #[test]
    fn test_open_entry_index() {
        let mut state = PomodoroState::new(day());
        assert_eq!(state.open_entry_index(), None);

        state.pomodoro_history.push(HistoryEntry {
            id: "1".to_string(),
            kind: EntryKind::Work,
            started_at: Utc::now(),
            completed_at: None,
            task_id: None,
            duration: 25,
            completed: false,
        });
        assert_eq!(state.open_entry_index(), Some(0));

        state.pomodoro_history[0].completed = true;
        assert_eq!(state.open_entry_index(), None);
    }
}
