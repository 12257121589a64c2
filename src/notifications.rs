//! Desktop notifications for phase completion.

use crate::app::CompletionEvent;
use crate::audio::AudioPlayer;
use crate::models::Phase;
use crate::persistence::{Store, NOTIFICATION_PERMISSION_KEY};
use notify_rust::Notification;
use serde::{Deserialize, Serialize};
use std::thread;
use tracing::{info, warn};

/// Whether the user allows notifications. `Default` means not yet asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    #[default]
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseMessage {
    pub summary: &'static str,
    pub body: &'static str,
}

/// Text shown when `finished` runs out.
pub fn message_for(finished: Phase) -> PhaseMessage {
    match finished {
        Phase::Work | Phase::Idle => PhaseMessage {
            summary: "🍅 Work Session Complete!",
            body: "Time for a break. Great job staying focused!",
        },
        Phase::ShortBreak => PhaseMessage {
            summary: "☕ Short Break Complete!",
            body: "Ready to get back to work?",
        },
        Phase::LongBreak => PhaseMessage {
            summary: "🏖️ Long Break Complete!",
            body: "Refreshed and ready for the next session!",
        },
    }
}

/// What [`NotificationEmitter::emit`] did for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emitted {
    pub chimed: bool,
    pub notified: bool,
}

/// Plays the chime and shows a notification for each completion.
pub struct NotificationEmitter {
    permission: NotificationPermission,
    audio: Option<AudioPlayer>,
}

impl NotificationEmitter {
    /// Loads the stored permission, asking once if it was never decided.
    pub fn initialize(store: &Store, audio: Option<AudioPlayer>) -> Self {
        let mut permission = store.get(NOTIFICATION_PERMISSION_KEY, NotificationPermission::Default);
        if permission == NotificationPermission::Default {
            permission = request_permission();
            store.set(NOTIFICATION_PERMISSION_KEY, &permission);
            info!(?permission, "Notification permission resolved");
        }
        Self::new(permission, audio)
    }

    pub fn new(permission: NotificationPermission, audio: Option<AudioPlayer>) -> Self {
        Self { permission, audio }
    }

    /// No popups and no sound.
    #[cfg(test)]
    pub fn silent() -> Self {
        Self::new(NotificationPermission::Denied, None)
    }

    #[cfg(test)]
    pub fn permission(&self) -> NotificationPermission {
        self.permission
    }

    pub fn emit(&self, event: &CompletionEvent, sound_enabled: bool) -> Emitted {
        let mut emitted = Emitted::default();
        if sound_enabled {
            if let Some(audio) = &self.audio {
                audio.play_chime();
                emitted.chimed = true;
            }
        }
        if self.permission == NotificationPermission::Granted {
            show(message_for(event.finished));
            emitted.notified = true;
        }
        emitted
    }
}

/// Shows the notification on a background thread; the notification server
/// may block.
fn show(message: PhaseMessage) {
    thread::spawn(move || {
        if let Err(e) = Notification::new()
            .summary(message.summary)
            .body(message.body)
            .appname("QuickLook")
            .show()
        {
            warn!(error = %e, "Failed to show notification");
        }
    });
}

/// Granted when a notification server answers.
#[cfg(all(unix, not(target_os = "macos")))]
fn request_permission() -> NotificationPermission {
    match notify_rust::get_server_information() {
        Ok(server) => {
            info!(server = %server.name, "Found notification server");
            NotificationPermission::Granted
        }
        Err(e) => {
            warn!(error = %e, "No notification server available");
            NotificationPermission::Denied
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn request_permission() -> NotificationPermission {
    NotificationPermission::Granted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_per_phase() {
        assert_eq!(message_for(Phase::Work).summary, "🍅 Work Session Complete!");
        assert_eq!(message_for(Phase::ShortBreak).body, "Ready to get back to work?");
        assert_eq!(message_for(Phase::LongBreak).summary, "🏖️ Long Break Complete!");
    }

    #[test]
    fn test_permission_is_not_asked_again() {
        let store = Store::open_in_memory().unwrap();
        store.set(NOTIFICATION_PERMISSION_KEY, &NotificationPermission::Denied);

        let emitter = NotificationEmitter::initialize(&store, None);

        assert_eq!(emitter.permission(), NotificationPermission::Denied);
    }

    #[test]
    fn test_permission_serializes_lowercase() {
        let json = serde_json::to_string(&NotificationPermission::Granted).unwrap();
        assert_eq!(json, "\"granted\"");
    }

    #[test]
    fn test_emit_respects_permission_and_audio() {
        let event = CompletionEvent {
            finished: Phase::Work,
            next: Phase::ShortBreak,
            completed_sessions: 1,
            auto_started: false,
        };

        assert_eq!(NotificationEmitter::silent().emit(&event, true), Emitted::default());

        let undecided = NotificationEmitter::new(NotificationPermission::Default, None);
        let emitted = undecided.emit(&event, true);
        assert!(!emitted.notified);
        assert!(!emitted.chimed);
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_show_work_complete() {
        show(message_for(Phase::Work));
    }
}
