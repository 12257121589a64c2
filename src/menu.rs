//! Menu building and updating for the tray dropdown.

use crate::app::App;
use crate::models::{
    Phase, PomodoroConfig, PomodoroState, TodayStats, LONG_BREAK_MINS_RANGE,
    SESSIONS_UNTIL_LONG_BREAK_RANGE, SHORT_BREAK_MINS_RANGE, WORK_MINS_RANGE,
};
use crate::stats::{format_duration, RecentSession, StatsReport};
use crate::tasks::Task;
use crate::timer::format_time;
use chrono::Local;
use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use std::ops::RangeInclusive;
use thiserror::Error;

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_SESSION: &str = "session";
pub const ID_PROGRESS: &str = "progress";
pub const ID_STATS: &str = "stats";
pub const ID_ACTIVE_TASK: &str = "active_task";
pub const ID_START: &str = "start";
pub const ID_PAUSE: &str = "pause";
pub const ID_RESET: &str = "reset";
pub const ID_SKIP: &str = "skip";
pub const ID_COMPLETE: &str = "complete";
pub const ID_UNLINK_TASK: &str = "unlink_task";
pub const ID_FINISH_TASK: &str = "finish_task";
pub const ID_AUTO_BREAKS: &str = "auto_breaks";
pub const ID_AUTO_WORK: &str = "auto_work";
pub const ID_SOUND_TOGGLE: &str = "sound_toggle";
pub const ID_PANEL_TOGGLE: &str = "panel_toggle";
pub const ID_CLEAR_HISTORY: &str = "clear_history";
pub const ID_RESET_POMODORO: &str = "reset_pomodoro";
pub const ID_RESET_ALL: &str = "reset_all";
pub const ID_QUIT: &str = "quit";

pub const TASK_PREFIX: &str = "task_";
pub const WORK_PREFIX: &str = "work_";
pub const SHORT_PREFIX: &str = "short_";
pub const LONG_PREFIX: &str = "long_";
pub const THRESH_PREFIX: &str = "thresh_";

const WORK_CHOICES: [u32; 6] = [15, 20, 25, 30, 45, 60];
const SHORT_CHOICES: [u32; 4] = [3, 5, 10, 15];
const LONG_CHOICES: [u32; 4] = [10, 15, 20, 30];

const PROGRESS_WIDTH: usize = 20;
const TASK_DESCRIPTION_CHARS: usize = 30;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// Holds references to menu items that change every tick.
pub struct MenuItems {
    pub status: MenuItem,
    pub session: MenuItem,
    pub progress: MenuItem,
    pub stats: MenuItem,
    pub start: MenuItem,
    pub pause: MenuItem,
    pub reset: MenuItem,
}

fn info_item(id: &str, text: impl AsRef<str>) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, false, None::<Accelerator>)
}

fn action_item(id: &str, text: &str, enabled: bool) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, enabled, None::<Accelerator>)
}

fn check_item(id: impl AsRef<str>, text: impl AsRef<str>, checked: bool) -> CheckMenuItem {
    CheckMenuItem::with_id(MenuId::new(id), text, true, checked, None::<Accelerator>)
}

/// Builds the complete menu structure from the app's current state.
pub fn build_menu(app: &App) -> Result<(Menu, MenuItems), MenuError> {
    let state = &app.state;
    let menu = Menu::new();

    let status = info_item(ID_STATUS, format_status(state));
    let session = info_item(ID_SESSION, format_session(state));
    let progress = info_item(ID_PROGRESS, format_progress(state.progress_percent()));
    menu.append(&status)?;
    menu.append(&session)?;
    menu.append(&progress)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let stats = info_item(ID_STATS, format_stats(&state.today_stats));
    menu.append(&stats)?;
    let active_task = info_item(ID_ACTIVE_TASK, format_active_task(app.active_task_name()));
    menu.append(&active_task)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let start = action_item(ID_START, "▶  Start", !state.is_running);
    let pause = action_item(ID_PAUSE, "⏸  Pause", state.is_running);
    let reset = action_item(ID_RESET, "↺  Reset", can_reset(state));
    let skip_label = if state.current_phase.is_break() {
        "⏭  Skip Break"
    } else {
        "⏭  Skip Focus"
    };
    let skip = action_item(ID_SKIP, skip_label, true);
    let complete = action_item(ID_COMPLETE, "✓  Complete Session", true);
    menu.append(&start)?;
    menu.append(&pause)?;
    menu.append(&reset)?;
    menu.append(&skip)?;
    menu.append(&complete)?;

    menu.append(&PredefinedMenuItem::separator())?;

    menu.append(&build_task_submenu(
        &app.linkable_tasks(),
        state.active_task_id.as_deref(),
    )?)?;
    menu.append(&action_item(
        ID_FINISH_TASK,
        "✔  Finish Active Task",
        state.active_task_id.is_some(),
    ))?;

    menu.append(&PredefinedMenuItem::separator())?;

    menu.append(&check_item(
        ID_PANEL_TOGGLE,
        "Show Pomodoro Panel",
        app.ui.show_pomodoro_panel,
    ))?;
    if app.ui.show_pomodoro_panel {
        menu.append(&build_history_submenu(&app.report())?)?;
    }
    menu.append(&build_settings_submenu(&state.config)?)?;

    menu.append(&PredefinedMenuItem::separator())?;

    menu.append(&action_item(ID_RESET_POMODORO, "Reset Everything", true))?;
    menu.append(&action_item(ID_RESET_ALL, "Reset All Pomodoro Data", true))?;
    menu.append(&action_item(ID_QUIT, "Quit QuickLook", true))?;

    let items = MenuItems {
        status,
        session,
        progress,
        stats,
        start,
        pause,
        reset,
    };

    Ok((menu, items))
}

fn build_task_submenu(tasks: &[Task], active: Option<&str>) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new("🔗  Link Task", true);

    if tasks.is_empty() {
        submenu.append(&info_item("no_tasks", "No open tasks"))?;
    }
    for task in tasks {
        submenu.append(&check_item(
            format!("{}{}", TASK_PREFIX, task.id),
            format_task_choice(task),
            active == Some(task.id.as_str()),
        ))?;
    }

    submenu.append(&PredefinedMenuItem::separator())?;
    submenu.append(&action_item(ID_UNLINK_TASK, "Unlink Task", active.is_some()))?;

    Ok(submenu)
}

fn build_history_submenu(report: &StatsReport) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new("📊  Pomodoro Stats", true);

    submenu.append(&info_item(
        "total_sessions",
        format!("Total sessions: {}", report.total_sessions),
    ))?;
    submenu.append(&info_item(
        "average_session",
        format!("Average session: {:.1}m", report.average_session_mins),
    ))?;

    submenu.append(&PredefinedMenuItem::separator())?;

    if report.recent.is_empty() {
        submenu.append(&info_item("recent_none", "No completed sessions yet"))?;
    }
    for session in &report.recent {
        submenu.append(&info_item(
            &format!("recent_{}", session.id),
            format_recent(session),
        ))?;
    }

    submenu.append(&PredefinedMenuItem::separator())?;
    submenu.append(&action_item(
        ID_CLEAR_HISTORY,
        "Clear History",
        report.total_sessions > 0,
    ))?;

    Ok(submenu)
}

fn build_settings_submenu(config: &PomodoroConfig) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new("⚙  Settings", true);

    submenu.append(&choice_submenu(
        format!("Work: {} min", config.work_duration),
        WORK_PREFIX,
        &duration_choices(&WORK_CHOICES, config.work_duration, &WORK_MINS_RANGE),
        config.work_duration,
        "min",
    )?)?;
    submenu.append(&choice_submenu(
        format!("Short Break: {} min", config.short_break_duration),
        SHORT_PREFIX,
        &duration_choices(
            &SHORT_CHOICES,
            config.short_break_duration,
            &SHORT_BREAK_MINS_RANGE,
        ),
        config.short_break_duration,
        "min",
    )?)?;
    submenu.append(&choice_submenu(
        format!("Long Break: {} min", config.long_break_duration),
        LONG_PREFIX,
        &duration_choices(
            &LONG_CHOICES,
            config.long_break_duration,
            &LONG_BREAK_MINS_RANGE,
        ),
        config.long_break_duration,
        "min",
    )?)?;
    submenu.append(&choice_submenu(
        format!("Long Break After: {} sessions", config.sessions_until_long_break),
        THRESH_PREFIX,
        &SESSIONS_UNTIL_LONG_BREAK_RANGE.collect::<Vec<_>>(),
        config.sessions_until_long_break,
        "sessions",
    )?)?;

    submenu.append(&PredefinedMenuItem::separator())?;

    submenu.append(&check_item(
        ID_AUTO_BREAKS,
        "Auto-start Breaks",
        config.auto_start_breaks,
    ))?;
    submenu.append(&check_item(ID_AUTO_WORK, "Auto-start Work", config.auto_start_work))?;
    submenu.append(&check_item(ID_SOUND_TOGGLE, "Sound Enabled", config.sound_enabled))?;

    Ok(submenu)
}

fn choice_submenu(
    title: String,
    prefix: &str,
    choices: &[u32],
    current: u32,
    unit: &str,
) -> Result<Submenu, MenuError> {
    let submenu = Submenu::new(title, true);
    for &value in choices {
        submenu.append(&check_item(
            format!("{}{}", prefix, value),
            format!("{} {}", value, unit),
            value == current,
        ))?;
    }
    Ok(submenu)
}

/// Preset values within `range`, plus the current value if it isn't a preset.
pub fn duration_choices(presets: &[u32], current: u32, range: &RangeInclusive<u32>) -> Vec<u32> {
    let mut choices: Vec<u32> = presets
        .iter()
        .copied()
        .filter(|value| range.contains(value))
        .collect();
    if range.contains(&current) && !choices.contains(&current) {
        choices.push(current);
        choices.sort_unstable();
    }
    choices
}

/// Updates the per-tick menu items based on the current state.
pub fn update_menu_items(items: &MenuItems, state: &PomodoroState) {
    items.status.set_text(format_status(state));
    items.session.set_text(format_session(state));
    items
        .progress
        .set_text(format_progress(state.progress_percent()));
    items.stats.set_text(format_stats(&state.today_stats));

    items.start.set_enabled(!state.is_running);
    items.pause.set_enabled(state.is_running);
    items.reset.set_enabled(can_reset(state));
}

fn can_reset(state: &PomodoroState) -> bool {
    state.is_running || !state.is_at_full_duration()
}

/// Formats the status line for the menu.
pub fn format_status(state: &PomodoroState) -> String {
    let phase = state.current_phase;
    if phase == Phase::Idle {
        return format!("{}  {}", phase.emoji(), phase.title());
    }
    let time = format_time(state.time_remaining);
    if !state.is_running && !state.is_at_full_duration() {
        format!("⏸  {} - {} (paused)", phase.title(), time)
    } else {
        format!("{}  {} - {}", phase.emoji(), phase.title(), time)
    }
}

pub fn format_session(state: &PomodoroState) -> String {
    format!(
        "Session {}  ·  {} completed",
        state.current_session, state.completed_sessions
    )
}

/// Formats the progress bar for a fraction in `0.0..=1.0`.
pub fn format_progress(fraction: f32) -> String {
    let pct = fraction.clamp(0.0, 1.0);
    let filled = (pct * PROGRESS_WIDTH as f32).round() as usize;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(PROGRESS_WIDTH - filled),
        (pct * 100.0).round() as u32
    )
}

/// Formats the daily stats for the menu.
pub fn format_stats(today: &TodayStats) -> String {
    let count = today.completed_pomodoros;
    let mut line = if count == 0 {
        "Today: —  0 (0m)".to_string()
    } else {
        let tomatoes = "🍅".repeat(count.min(10) as usize);
        let extra = if count > 10 {
            format!("+{}", count - 10)
        } else {
            String::new()
        };
        format!(
            "Today: {}{}  {} ({})",
            tomatoes,
            extra,
            count,
            format_duration(today.total_focus_time)
        )
    };
    if today.completed_tasks > 0 {
        line.push_str(&format!("  ·  {} tasks", today.completed_tasks));
    }
    line
}

pub fn format_active_task(name: Option<String>) -> String {
    match name {
        Some(name) => format!("Task: {}", name),
        None => "No task linked".to_string(),
    }
}

/// Picker entry: name, a short description, then labels as hashtags.
pub fn format_task_choice(task: &Task) -> String {
    let mut text = task.name.clone();
    if let Some(description) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        let short: String = description.chars().take(TASK_DESCRIPTION_CHARS).collect();
        text.push_str("  ·  ");
        text.push_str(short.trim_end());
        if description.chars().count() > TASK_DESCRIPTION_CHARS {
            text.push('…');
        }
    }
    for label in &task.labels {
        text.push_str(&format!("  #{}", label));
    }
    text
}

/// One line of the recent sessions list, in local time.
pub fn format_recent(session: &RecentSession) -> String {
    let when = session
        .completed_at
        .map(|at| at.with_timezone(&Local).format("%b %-d %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string());
    let task = session.task_name.as_deref().unwrap_or("No task");
    format!("{}  {}  {}", when, format_duration(session.duration), task)
}
