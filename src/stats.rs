//! Aggregate statistics derived from the Pomodoro history.

use crate::models::{EntryKind, HistoryEntry, PomodoroState};
use crate::tasks::TaskRegistry;
use chrono::{DateTime, Utc};

const RECENT_SESSION_LIMIT: usize = 10;
const UNKNOWN_TASK: &str = "Unknown Task";

#[derive(Debug, Clone, PartialEq)]
pub struct RecentSession {
    pub id: String,
    pub completed_at: Option<DateTime<Utc>>,
    /// Minutes.
    pub duration: u32,
    pub task_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub total_sessions: usize,
    /// Mean planned length of completed sessions, in minutes.
    pub average_session_mins: f32,
    /// Newest first.
    pub recent: Vec<RecentSession>,
}

fn is_completed_work(entry: &&HistoryEntry) -> bool {
    entry.completed && entry.kind == EntryKind::Work
}

pub fn build_report<R: TaskRegistry + ?Sized>(state: &PomodoroState, tasks: &R) -> StatsReport {
    let completed: Vec<&HistoryEntry> = state
        .pomodoro_history
        .iter()
        .filter(is_completed_work)
        .collect();

    let total_sessions = completed.len();
    let average_session_mins = if total_sessions == 0 {
        0.0
    } else {
        let total: u32 = completed.iter().map(|entry| entry.duration).sum();
        total as f32 / total_sessions as f32
    };

    let recent = completed
        .iter()
        .rev()
        .take(RECENT_SESSION_LIMIT)
        .map(|entry| RecentSession {
            id: entry.id.clone(),
            completed_at: entry.completed_at,
            duration: entry.duration,
            task_name: entry
                .task_id
                .as_deref()
                .map(|id| task_display_name(tasks, id)),
        })
        .collect();

    StatsReport {
        total_sessions,
        average_session_mins,
        recent,
    }
}

/// Name of the task with `id`, or a placeholder if it no longer exists.
pub fn task_display_name<R: TaskRegistry + ?Sized>(tasks: &R, id: &str) -> String {
    tasks
        .lookup(id)
        .map(|task| task.name)
        .unwrap_or_else(|| UNKNOWN_TASK.to_string())
}

/// Formats minutes as `45m` or `1h 5m`.
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}
