//! Pomodoro state machine.
//!
//! Every command is a plain function over [`PomodoroState`]. Nothing here
//! touches storage, clocks or the notification layer; callers pass in the
//! current time and persist the result themselves.

use crate::models::{
    duration_for, EntryKind, HistoryEntry, Phase, PomodoroState, SettingsPatch, TodayStats,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info};

/// Describes a phase change performed by [`complete_phase`] or [`skip_phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
    /// Whether the next phase began running immediately.
    pub auto_started: bool,
}

/// Starts (or resumes) the timer.
///
/// A history entry is opened when work begins from a full-length countdown.
pub fn start(state: &mut PomodoroState, now: DateTime<Local>) {
    if state.is_running {
        return;
    }
    state.is_running = true;

    if state.current_phase == Phase::Idle {
        state.current_phase = Phase::Work;
        state.time_remaining = duration_for(Phase::Work, &state.config);
    }

    if state.current_phase == Phase::Work && state.is_at_full_duration() {
        open_work_entry(state, now);
    }
}

pub fn pause(state: &mut PomodoroState) {
    state.is_running = false;
}

/// Stops the timer and rewinds the current phase to its full length.
/// An unfinished work attempt is dropped from the history.
pub fn reset(state: &mut PomodoroState) {
    state.is_running = false;
    state.time_remaining = state.phase_duration();
    if state.current_phase == Phase::Work {
        discard_open_entry(state);
    }
}

/// Advances the countdown by one second. Returns true if anything changed.
///
/// Reaching zero does not transition; the driver observes that and calls
/// [`complete_phase`].
pub fn tick(state: &mut PomodoroState) -> bool {
    if state.is_running && state.time_remaining > 0 {
        state.time_remaining -= 1;
        true
    } else {
        false
    }
}

/// Finishes the current phase and moves to the next one.
pub fn complete_phase(state: &mut PomodoroState, now: DateTime<Local>) -> PhaseChange {
    state.is_running = false;
    let from = state.current_phase;

    if from == Phase::Work {
        reset_daily_stats(state, now.date_naive());

        state.completed_sessions += 1;
        state.today_stats.completed_pomodoros += 1;
        state.today_stats.total_focus_time += state.config.work_duration;

        if let Some(idx) = state.open_entry_index() {
            let entry = &mut state.pomodoro_history[idx];
            entry.completed = true;
            entry.completed_at = Some(now.with_timezone(&Utc));
        }

        let long_break_due =
            state.completed_sessions % state.config.sessions_until_long_break.max(1) == 0;
        info!(
            completed_sessions = state.completed_sessions,
            long_break_due, "Completed work session"
        );

        let next = if long_break_due {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        };
        enter_phase(state, next);
        state.is_running = state.config.auto_start_breaks;

        PhaseChange {
            from,
            to: next,
            auto_started: state.is_running,
        }
    } else {
        enter_phase(state, Phase::Work);
        state.current_session += 1;
        state.is_running = state.config.auto_start_work;
        if state.is_running {
            open_work_entry(state, now);
        }

        PhaseChange {
            from,
            to: Phase::Work,
            auto_started: state.is_running,
        }
    }
}

/// Leaves the current phase without counting it.
///
/// Skipping out of work chooses the break from the completed count as it
/// stands, so a long break only follows a skip when the count is already a
/// non-zero multiple of the cadence.
pub fn skip_phase(state: &mut PomodoroState) -> PhaseChange {
    state.is_running = false;
    let from = state.current_phase;

    let to = match from {
        Phase::Idle => Phase::Work,
        Phase::Work => {
            let cadence = state.config.sessions_until_long_break.max(1);
            let long_break_due =
                state.completed_sessions > 0 && state.completed_sessions % cadence == 0;
            discard_open_entry(state);
            if long_break_due {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        }
        Phase::ShortBreak | Phase::LongBreak => {
            state.current_session += 1;
            Phase::Work
        }
    };
    enter_phase(state, to);
    info!(?from, ?to, "Skipped phase");

    PhaseChange {
        from,
        to,
        auto_started: false,
    }
}

/// Completes the current phase right away, regardless of time left.
///
/// From idle this only moves to a full-length work phase without running.
pub fn complete_session(state: &mut PomodoroState, now: DateTime<Local>) -> Option<PhaseChange> {
    if state.current_phase == Phase::Idle {
        enter_phase(state, Phase::Work);
        None
    } else {
        Some(complete_phase(state, now))
    }
}

/// Hard reset: clears progress, history and today's stats but keeps the
/// configured durations, auto-start flags and sound setting.
pub fn reset_all(state: &mut PomodoroState, today: NaiveDate) {
    state.current_phase = Phase::Work;
    state.is_running = false;
    state.time_remaining = duration_for(Phase::Work, &state.config);
    state.current_session = 1;
    state.completed_sessions = 0;
    state.active_task_id = None;
    state.pomodoro_history.clear();
    state.today_stats = TodayStats::new(today);
}

/// Soft reset: returns to a fresh work phase, keeping history, counters and
/// today's stats.
pub fn reset_pomodoro(state: &mut PomodoroState) {
    discard_open_entry(state);
    state.current_phase = Phase::Work;
    state.is_running = false;
    state.time_remaining = duration_for(Phase::Work, &state.config);
    state.current_session = 1;
    state.active_task_id = None;
}

/// Merges new settings. The countdown follows a new work duration only while
/// idle or sitting untouched at the start of a work phase. Otherwise the time
/// left is only cut down when it exceeds the new length of the current phase.
pub fn update_settings(state: &mut PomodoroState, patch: &SettingsPatch) {
    let untouched_work =
        state.current_phase == Phase::Work && state.is_at_full_duration();
    let resync = state.current_phase == Phase::Idle || untouched_work;

    patch.apply_to(&mut state.config);

    if resync {
        state.time_remaining = duration_for(Phase::Work, &state.config);
        if let Some(idx) = state.open_entry_index() {
            state.pomodoro_history[idx].duration = state.config.work_duration;
        }
    } else {
        state.time_remaining = state.time_remaining.min(state.phase_duration());
    }
}

pub fn set_active_task(state: &mut PomodoroState, task_id: impl Into<String>) {
    state.active_task_id = Some(task_id.into());
}

pub fn clear_active_task(state: &mut PomodoroState) {
    state.active_task_id = None;
}

/// Starts a fresh day of stats if `today` differs from the stored date.
/// Returns true if the stats were rolled over.
pub fn reset_daily_stats(state: &mut PomodoroState, today: NaiveDate) -> bool {
    if state.today_stats.date == today {
        return false;
    }
    info!(previous = %state.today_stats.date, %today, "Rolled over daily stats");
    state.today_stats = TodayStats::new(today);
    true
}

pub fn clear_history(state: &mut PomodoroState) {
    state.pomodoro_history.clear();
}

/// Counts the active task as finished today and unlinks it.
pub fn record_task_completed(state: &mut PomodoroState, today: NaiveDate) {
    reset_daily_stats(state, today);
    state.today_stats.completed_tasks += 1;
    state.active_task_id = None;
}

fn enter_phase(state: &mut PomodoroState, phase: Phase) {
    state.current_phase = phase;
    state.time_remaining = duration_for(phase, &state.config);
}

fn open_work_entry(state: &mut PomodoroState, now: DateTime<Local>) {
    if state.open_entry_index().is_some() {
        return;
    }
    let entry = HistoryEntry {
        id: now.timestamp_millis().to_string(),
        kind: EntryKind::Work,
        started_at: now.with_timezone(&Utc),
        completed_at: None,
        task_id: state.active_task_id.clone(),
        duration: state.config.work_duration,
        completed: false,
    };
    debug!(entry_id = %entry.id, "Opened history entry");
    state.pomodoro_history.push(entry);
}

fn discard_open_entry(state: &mut PomodoroState) {
    if let Some(idx) = state.open_entry_index() {
        let entry = state.pomodoro_history.remove(idx);
        debug!(entry_id = %entry.id, "Discarded unfinished history entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PomodoroConfig;
    use chrono::{Duration, TimeZone};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn at(hour: u32, min: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 1, 15, hour, min, 0)
            .single()
            .unwrap()
    }

    fn new_state() -> PomodoroState {
        PomodoroState::new(today())
    }

    /// Runs the current phase down to zero and completes it.
    fn run_to_completion(state: &mut PomodoroState, now: DateTime<Local>) -> PhaseChange {
        start(state, now);
        while tick(state) {}
        assert_eq!(state.time_remaining, 0);
        complete_phase(state, now)
    }

    #[test]
    fn test_start_from_idle_enters_work() {
        let mut state = new_state();
        state.current_phase = Phase::Idle;
        state.time_remaining = 0;

        start(&mut state, at(9, 0));

        assert!(state.is_running);
        assert_eq!(state.current_phase, Phase::Work);
        assert_eq!(state.time_remaining, 25 * 60);
        assert_eq!(state.pomodoro_history.len(), 1);
    }

    #[test]
    fn test_start_records_history_entry() {
        let mut state = new_state();
        state.active_task_id = Some("42".to_string());

        start(&mut state, at(9, 0));

        let entry = &state.pomodoro_history[0];
        assert_eq!(entry.kind, EntryKind::Work);
        assert_eq!(entry.task_id.as_deref(), Some("42"));
        assert_eq!(entry.duration, 25);
        assert!(!entry.completed);
        assert_eq!(entry.completed_at, None);
        assert_eq!(entry.started_at, at(9, 0).with_timezone(&Utc));
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut state = new_state();
        start(&mut state, at(9, 0));
        start(&mut state, at(9, 0));
        assert_eq!(state.pomodoro_history.len(), 1);

        // Pausing before the first tick and starting again reuses the entry.
        pause(&mut state);
        start(&mut state, at(9, 1));
        assert_eq!(state.pomodoro_history.len(), 1);
    }

    #[test]
    fn test_resume_mid_phase_does_not_add_entry() {
        let mut state = new_state();
        start(&mut state, at(9, 0));
        tick(&mut state);
        pause(&mut state);
        start(&mut state, at(9, 5));

        assert!(state.is_running);
        assert_eq!(state.pomodoro_history.len(), 1);
    }

    #[test]
    fn test_start_in_break_does_not_add_entry() {
        let mut state = new_state();
        state.current_phase = Phase::ShortBreak;
        state.time_remaining = 300;

        start(&mut state, at(9, 0));

        assert!(state.is_running);
        assert!(state.pomodoro_history.is_empty());
    }

    #[test]
    fn test_pause_only_stops() {
        let mut state = new_state();
        start(&mut state, at(9, 0));
        tick(&mut state);
        let before = state.clone();

        pause(&mut state);

        assert!(!state.is_running);
        assert_eq!(state.time_remaining, before.time_remaining);
        assert_eq!(state.pomodoro_history, before.pomodoro_history);
    }

    #[test]
    fn test_tick_while_paused_is_noop() {
        let mut state = new_state();
        for _ in 0..5 {
            assert!(!tick(&mut state));
        }
        assert_eq!(state.time_remaining, 25 * 60);
    }

    #[test]
    fn test_tick_stops_at_zero() {
        let mut state = new_state();
        state.time_remaining = 1;
        state.is_running = true;

        assert!(tick(&mut state));
        assert_eq!(state.time_remaining, 0);
        assert!(!tick(&mut state));
        assert_eq!(state.time_remaining, 0);
        assert_eq!(state.current_phase, Phase::Work);
    }

    #[test]
    fn test_full_work_phase_counts_once() {
        let mut state = new_state();
        state.config.work_duration = 1;
        state.time_remaining = 60;

        start(&mut state, at(9, 0));
        let mut ticks = 0;
        while tick(&mut state) {
            ticks += 1;
        }
        assert_eq!(ticks, 60);

        let change = complete_phase(&mut state, at(9, 1));

        assert_eq!(state.completed_sessions, 1);
        assert_eq!(state.today_stats.completed_pomodoros, 1);
        assert_eq!(state.today_stats.total_focus_time, 1);
        assert_eq!(change.from, Phase::Work);
        assert_eq!(change.to, Phase::ShortBreak);

        let entry = &state.pomodoro_history[0];
        assert!(entry.completed);
        assert_eq!(entry.completed_at, Some(at(9, 1).with_timezone(&Utc)));
    }

    #[test]
    fn test_reset_during_work_discards_open_entry() {
        let mut state = new_state();
        run_to_completion(&mut state, at(9, 0));
        run_to_completion(&mut state, at(9, 30));
        start(&mut state, at(9, 35));
        tick(&mut state);
        assert_eq!(state.pomodoro_history.len(), 2);

        reset(&mut state);

        assert!(!state.is_running);
        assert_eq!(state.time_remaining, 25 * 60);
        assert_eq!(state.pomodoro_history.len(), 1);
        assert!(state.pomodoro_history[0].completed);
    }

    #[test]
    fn test_reset_during_break_keeps_history() {
        let mut state = new_state();
        run_to_completion(&mut state, at(9, 0));
        start(&mut state, at(9, 25));
        tick(&mut state);

        reset(&mut state);

        assert_eq!(state.current_phase, Phase::ShortBreak);
        assert_eq!(state.time_remaining, 5 * 60);
        assert_eq!(state.pomodoro_history.len(), 1);
    }

    #[test]
    fn test_long_break_cadence() {
        for cadence in 2..=8 {
            let mut state = new_state();
            state.config.sessions_until_long_break = cadence;
            for n in 1..=(cadence * 2) {
                let change = run_to_completion(&mut state, at(9, 0));
                let expected = if n % cadence == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                };
                assert_eq!(change.to, expected, "cadence {cadence}, session {n}");
                // Finish the break to get back to work.
                run_to_completion(&mut state, at(9, 0));
            }
        }
    }

    #[test]
    fn test_four_sessions_reach_long_break() {
        let mut state = new_state();
        for i in 0..4 {
            let change = run_to_completion(&mut state, at(9, 0));
            if i < 3 {
                assert_eq!(change.to, Phase::ShortBreak);
                let back = run_to_completion(&mut state, at(9, 0));
                assert_eq!(back.to, Phase::Work);
            }
        }

        assert_eq!(state.completed_sessions, 4);
        assert_eq!(state.current_phase, Phase::LongBreak);
        assert_eq!(state.time_remaining, 15 * 60);
        assert_eq!(state.current_session, 4);
        assert_eq!(state.today_stats.total_focus_time, 100);
    }

    #[test]
    fn test_break_completion_returns_to_work() {
        let mut state = new_state();
        run_to_completion(&mut state, at(9, 0));
        let change = run_to_completion(&mut state, at(9, 30));

        assert_eq!(change.from, Phase::ShortBreak);
        assert_eq!(change.to, Phase::Work);
        assert_eq!(state.current_session, 2);
        assert_eq!(state.time_remaining, 25 * 60);
        assert!(!state.is_running);
    }

    #[test]
    fn test_auto_start_flags() {
        let mut state = new_state();
        state.config.auto_start_breaks = true;
        let change = run_to_completion(&mut state, at(9, 0));
        assert!(change.auto_started);
        assert!(state.is_running);

        pause(&mut state);
        let change = run_to_completion(&mut state, at(9, 30));
        assert!(!change.auto_started);
        assert!(!state.is_running);

        state.config.auto_start_work = true;
        run_to_completion(&mut state, at(10, 0));
        let change = run_to_completion(&mut state, at(10, 30));
        assert!(change.auto_started);
        assert!(state.is_running);
    }

    #[test]
    fn test_auto_started_work_opens_history_entry() {
        let mut state = new_state();
        state.config.auto_start_breaks = true;
        state.config.auto_start_work = true;

        start(&mut state, at(9, 0));
        for _ in 0..3 {
            // Work, then the break that follows it.
            for _ in 0..2 {
                while tick(&mut state) {}
                complete_phase(&mut state, at(9, 30));
            }
        }

        assert!(state.is_running);
        assert_eq!(state.current_phase, Phase::Work);
        assert_eq!(state.completed_sessions, 3);
        let completed = state.pomodoro_history.iter().filter(|e| e.completed).count();
        assert_eq!(completed, 3);
        // The running fourth round has its own open entry.
        assert_eq!(state.pomodoro_history.len(), 4);
        assert!(state.open_entry_index().is_some());
    }

    #[test]
    fn test_skip_work_is_not_counted() {
        let mut state = new_state();
        start(&mut state, at(9, 0));
        tick(&mut state);

        let change = skip_phase(&mut state);

        assert_eq!(change.to, Phase::ShortBreak);
        assert_eq!(state.completed_sessions, 0);
        assert_eq!(state.today_stats.completed_pomodoros, 0);
        assert!(state.pomodoro_history.is_empty());
        assert!(!state.is_running);
    }

    #[test]
    fn test_skip_uses_pre_increment_count() {
        let mut state = new_state();
        state.config.sessions_until_long_break = 2;

        // 1 completed: completing now would give a long break, skipping doesn't.
        run_to_completion(&mut state, at(9, 0));
        run_to_completion(&mut state, at(9, 0));
        start(&mut state, at(9, 0));
        assert_eq!(skip_phase(&mut state).to, Phase::ShortBreak);

        // 2 completed: skipping now lands on a long break.
        skip_phase(&mut state);
        run_to_completion(&mut state, at(9, 0));
        skip_phase(&mut state);
        assert_eq!(state.completed_sessions, 2);
        start(&mut state, at(9, 0));
        assert_eq!(skip_phase(&mut state).to, Phase::LongBreak);
    }

    #[test]
    fn test_skip_break_and_idle() {
        let mut state = new_state();
        state.current_phase = Phase::LongBreak;
        state.time_remaining = 100;
        state.is_running = true;

        let change = skip_phase(&mut state);
        assert_eq!(change.to, Phase::Work);
        assert_eq!(state.current_session, 2);
        assert_eq!(state.time_remaining, 25 * 60);
        assert!(!state.is_running);

        state.current_phase = Phase::Idle;
        let change = skip_phase(&mut state);
        assert_eq!(change.to, Phase::Work);
        assert_eq!(state.current_session, 2);
    }

    #[test]
    fn test_complete_session_forces_completion() {
        let mut state = new_state();
        start(&mut state, at(9, 0));
        tick(&mut state);

        let change = complete_session(&mut state, at(9, 3)).unwrap();

        assert_eq!(change.to, Phase::ShortBreak);
        assert_eq!(state.completed_sessions, 1);
        assert!(state.pomodoro_history[0].completed);
    }

    #[test]
    fn test_complete_session_from_idle() {
        let mut state = new_state();
        state.current_phase = Phase::Idle;
        state.time_remaining = 0;

        assert_eq!(complete_session(&mut state, at(9, 0)), None);
        assert_eq!(state.current_phase, Phase::Work);
        assert_eq!(state.time_remaining, 25 * 60);
        assert!(!state.is_running);
        assert_eq!(state.completed_sessions, 0);
    }

    #[test]
    fn test_reset_all_keeps_configuration() {
        let mut state = new_state();
        state.config = PomodoroConfig {
            work_duration: 40,
            short_break_duration: 10,
            long_break_duration: 30,
            sessions_until_long_break: 3,
            auto_start_breaks: true,
            auto_start_work: true,
            sound_enabled: false,
        };
        state.time_remaining = 40 * 60;
        run_to_completion(&mut state, at(9, 0));
        state.active_task_id = Some("7".to_string());
        let config = state.config.clone();
        let next_day = today() + Duration::days(1);

        reset_all(&mut state, next_day);

        assert_eq!(state.config, config);
        assert_eq!(state.completed_sessions, 0);
        assert!(state.pomodoro_history.is_empty());
        assert_eq!(state.today_stats, TodayStats::new(next_day));
        assert_eq!(state.current_phase, Phase::Work);
        assert_eq!(state.time_remaining, 40 * 60);
        assert_eq!(state.current_session, 1);
        assert_eq!(state.active_task_id, None);
        assert!(!state.is_running);
    }

    #[test]
    fn test_reset_pomodoro_keeps_history_and_stats() {
        let mut state = new_state();
        run_to_completion(&mut state, at(9, 0));
        run_to_completion(&mut state, at(9, 30));
        state.active_task_id = Some("7".to_string());
        start(&mut state, at(9, 35));
        tick(&mut state);

        reset_pomodoro(&mut state);

        assert_eq!(state.current_phase, Phase::Work);
        assert_eq!(state.time_remaining, 25 * 60);
        assert_eq!(state.current_session, 1);
        assert_eq!(state.active_task_id, None);
        assert_eq!(state.completed_sessions, 1);
        assert_eq!(state.today_stats.completed_pomodoros, 1);
        assert_eq!(state.pomodoro_history.len(), 1);
        assert!(state.pomodoro_history[0].completed);
    }

    #[test]
    fn test_update_settings_resyncs_untouched_work() {
        let mut state = new_state();
        let patch = SettingsPatch {
            work_duration: Some(30),
            ..SettingsPatch::default()
        };

        update_settings(&mut state, &patch);

        assert_eq!(state.config.work_duration, 30);
        assert_eq!(state.time_remaining, 1800);
    }

    #[test]
    fn test_update_settings_leaves_elapsed_work_alone() {
        let mut state = new_state();
        start(&mut state, at(9, 0));
        for _ in 0..600 {
            tick(&mut state);
        }
        pause(&mut state);

        update_settings(
            &mut state,
            &SettingsPatch {
                work_duration: Some(30),
                ..SettingsPatch::default()
            },
        );

        assert_eq!(state.config.work_duration, 30);
        assert_eq!(state.time_remaining, 15 * 60);
    }

    #[test]
    fn test_update_settings_leaves_break_alone() {
        let mut state = new_state();
        run_to_completion(&mut state, at(9, 0));

        update_settings(
            &mut state,
            &SettingsPatch {
                work_duration: Some(50),
                short_break_duration: Some(10),
                ..SettingsPatch::default()
            },
        );

        assert_eq!(state.current_phase, Phase::ShortBreak);
        assert_eq!(state.time_remaining, 5 * 60);
    }

    #[test]
    fn test_update_settings_shortens_running_break() {
        let mut state = new_state();
        state.current_phase = Phase::LongBreak;
        state.config.long_break_duration = 20;
        state.time_remaining = 1100;
        state.is_running = true;

        update_settings(
            &mut state,
            &SettingsPatch {
                long_break_duration: Some(10),
                ..SettingsPatch::default()
            },
        );

        assert_eq!(state.time_remaining, 600);
        assert!(state.is_running);

        // A longer break leaves the remaining time as it was.
        update_settings(
            &mut state,
            &SettingsPatch {
                long_break_duration: Some(30),
                ..SettingsPatch::default()
            },
        );
        assert_eq!(state.time_remaining, 600);
    }

    #[test]
    fn test_update_settings_from_idle() {
        let mut state = new_state();
        state.current_phase = Phase::Idle;
        state.time_remaining = 0;

        update_settings(
            &mut state,
            &SettingsPatch {
                work_duration: Some(45),
                ..SettingsPatch::default()
            },
        );

        assert_eq!(state.time_remaining, 45 * 60);
    }

    #[test]
    fn test_update_settings_adjusts_unticked_entry() {
        let mut state = new_state();
        start(&mut state, at(9, 0));
        pause(&mut state);

        update_settings(
            &mut state,
            &SettingsPatch {
                work_duration: Some(50),
                ..SettingsPatch::default()
            },
        );

        assert_eq!(state.pomodoro_history[0].duration, 50);
    }

    #[test]
    fn test_active_task_link() {
        let mut state = new_state();
        set_active_task(&mut state, "missing-task");
        assert_eq!(state.active_task_id.as_deref(), Some("missing-task"));
        clear_active_task(&mut state);
        assert_eq!(state.active_task_id, None);
    }

    #[test]
    fn test_reset_daily_stats_rolls_over_once() {
        let mut state = new_state();
        run_to_completion(&mut state, at(9, 0));
        let tomorrow = today() + Duration::days(1);

        assert!(!reset_daily_stats(&mut state, today()));
        assert_eq!(state.today_stats.completed_pomodoros, 1);

        assert!(reset_daily_stats(&mut state, tomorrow));
        assert_eq!(state.today_stats, TodayStats::new(tomorrow));
        assert!(!reset_daily_stats(&mut state, tomorrow));
        assert_eq!(state.completed_sessions, 1);
    }

    #[test]
    fn test_completion_on_new_day_counts_for_new_day() {
        let mut state = new_state();
        run_to_completion(&mut state, at(9, 0));
        run_to_completion(&mut state, at(9, 30));

        let next_morning = at(9, 0) + Duration::days(1);
        run_to_completion(&mut state, next_morning);

        assert_eq!(state.today_stats.date, next_morning.date_naive());
        assert_eq!(state.today_stats.completed_pomodoros, 1);
        assert_eq!(state.completed_sessions, 2);
    }

    #[test]
    fn test_clear_history_and_task_completion() {
        let mut state = new_state();
        run_to_completion(&mut state, at(9, 0));
        state.active_task_id = Some("3".to_string());

        record_task_completed(&mut state, today());
        clear_history(&mut state);

        assert!(state.pomodoro_history.is_empty());
        assert_eq!(state.today_stats.completed_tasks, 1);
        assert_eq!(state.active_task_id, None);
        assert_eq!(state.completed_sessions, 1);
    }
}
