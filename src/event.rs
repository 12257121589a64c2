//! Menu event handling.

use crate::menu::{
    ID_AUTO_BREAKS, ID_AUTO_WORK, ID_CLEAR_HISTORY, ID_COMPLETE, ID_FINISH_TASK, ID_PANEL_TOGGLE,
    ID_PAUSE, ID_QUIT, ID_RESET, ID_RESET_ALL, ID_RESET_POMODORO, ID_SKIP, ID_SOUND_TOGGLE,
    ID_START, ID_UNLINK_TASK, LONG_PREFIX, SHORT_PREFIX, TASK_PREFIX, THRESH_PREFIX, WORK_PREFIX,
};
use crate::models::{PomodoroConfig, SettingsPatch};
use crate::timer::Command;
use muda::MenuEvent;

/// Result of handling a menu event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    /// Event maps to a command for the driver.
    Command(Command),
    /// User requested quit.
    Quit,
    /// Nothing to do (informational item).
    Continue,
}

/// Translates a menu click into a driver command.
pub fn handle_menu_event(event: &MenuEvent, config: &PomodoroConfig) -> EventResult {
    let id = event.id().as_ref();
    if id == ID_QUIT {
        return EventResult::Quit;
    }
    match command_for_id(id, config) {
        Some(command) => EventResult::Command(command),
        None => EventResult::Continue,
    }
}

/// Maps a menu item id to a command. Toggles flip the current `config` value.
pub fn command_for_id(id: &str, config: &PomodoroConfig) -> Option<Command> {
    let command = match id {
        ID_START => Command::Start,
        ID_PAUSE => Command::Pause,
        ID_RESET => Command::Reset,
        ID_SKIP => Command::Skip,
        ID_COMPLETE => Command::CompleteSession,
        ID_UNLINK_TASK => Command::ClearActiveTask,
        ID_FINISH_TASK => Command::FinishActiveTask,
        ID_PANEL_TOGGLE => Command::TogglePanel,
        ID_CLEAR_HISTORY => Command::ClearHistory,
        ID_RESET_POMODORO => Command::ResetPomodoro,
        ID_RESET_ALL => Command::ResetAll,
        ID_AUTO_BREAKS => settings(SettingsPatch {
            auto_start_breaks: Some(!config.auto_start_breaks),
            ..SettingsPatch::default()
        }),
        ID_AUTO_WORK => settings(SettingsPatch {
            auto_start_work: Some(!config.auto_start_work),
            ..SettingsPatch::default()
        }),
        ID_SOUND_TOGGLE => settings(SettingsPatch {
            sound_enabled: Some(!config.sound_enabled),
            ..SettingsPatch::default()
        }),
        _ => return prefixed_command(id),
    };
    Some(command)
}

fn settings(patch: SettingsPatch) -> Command {
    Command::UpdateSettings(patch)
}

/// Handles task links and duration choices from submenus.
fn prefixed_command(id: &str) -> Option<Command> {
    if let Some(task_id) = id.strip_prefix(TASK_PREFIX) {
        return Some(Command::SetActiveTask(task_id.to_string()));
    }

    let (prefix, value) = [WORK_PREFIX, SHORT_PREFIX, LONG_PREFIX, THRESH_PREFIX]
        .into_iter()
        .find_map(|prefix| id.strip_prefix(prefix).map(|rest| (prefix, rest)))?;
    let value = value.parse::<u32>().ok()?;

    let mut patch = SettingsPatch::default();
    match prefix {
        WORK_PREFIX => patch.work_duration = Some(value),
        SHORT_PREFIX => patch.short_break_duration = Some(value),
        LONG_PREFIX => patch.long_break_duration = Some(value),
        _ => patch.sessions_until_long_break = Some(value),
    }
    Some(settings(patch))
}
