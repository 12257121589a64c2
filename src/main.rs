//! QuickLook Pomodoro - a tray Pomodoro timer with task linking and stats.
//!
//! The winit main thread owns all state. Menu clicks, clock ticks and the
//! daily rollover check all arrive as commands on one queue.

use std::time::Duration;

use muda::MenuEvent;
use tracing::{error, info, warn};
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

mod app;
mod audio;
mod clock;
mod config;
mod event;
mod menu;
mod models;
mod notifications;
mod persistence;
mod pomodoro;
mod rollover;
mod stats;
mod tasks;
mod timer;
mod writer;

use app::App;
use audio::AudioPlayer;
use config::AppConfig;
use event::EventResult;
use menu::MenuItems;
use notifications::NotificationEmitter;
use timer::{Driver, DriverOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Application handler for the winit event loop.
struct QuickLook {
    driver: Driver,
    tray: TrayIcon,
    menu_items: MenuItems,
}

impl QuickLook {
    fn refresh(&mut self, rebuild: bool) {
        let state = &self.driver.app().state;
        self.tray.set_title(Some(timer::format_tray_title(state)));

        if !rebuild {
            menu::update_menu_items(&self.menu_items, state);
            return;
        }
        match menu::build_menu(self.driver.app()) {
            Ok((built_menu, items)) => {
                self.tray.set_menu(Some(Box::new(built_menu)));
                self.menu_items = items;
            }
            Err(e) => error!(error = %e, "Failed to rebuild menu"),
        }
    }

    fn process_menu_events(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            let result = event::handle_menu_event(&event, &self.driver.app().state.config);
            match result {
                EventResult::Quit => {
                    event_loop.exit();
                    return;
                }
                EventResult::Command(command) => {
                    self.driver.dispatch(command);
                    // Task names, settings and history may all have changed.
                    self.refresh(true);
                }
                EventResult::Continue => {}
            }
        }
    }

    fn process_commands(&mut self) {
        let DriverOutcome {
            changed,
            completions,
        } = self.driver.drain();
        if changed {
            // A completion moves counters and history that only a rebuild shows.
            self.refresh(!completions.is_empty());
        }
    }
}

impl ApplicationHandler for QuickLook {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::wait_duration(POLL_INTERVAL));

        self.process_commands();
        self.process_menu_events(event_loop);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        info!("Shutting down");
        self.driver.shutdown();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    info!(data_dir = %config.data_dir.display(), "Starting QuickLook Pomodoro");

    let app = App::new(&config)?;

    // Audio is created on the main thread; the output stream is not Send.
    let audio = match AudioPlayer::new() {
        Ok(player) => Some(player),
        Err(e) => {
            warn!(error = %e, "Audio unavailable, completion sound disabled");
            None
        }
    };
    let emitter = NotificationEmitter::initialize(app.store(), audio);

    let mut driver = Driver::new(app, &config, emitter);
    driver.watch_rollover(&config);

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::new()?;

    let (built_menu, menu_items) = menu::build_menu(driver.app())?;

    // No icon image, the title text carries the countdown
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_title(timer::format_tray_title(&driver.app().state))
        .with_tooltip("QuickLook Pomodoro")
        .build()?;

    let mut quicklook = QuickLook {
        driver,
        tray,
        menu_items,
    };

    event_loop.run_app(&mut quicklook)?;

    Ok(())
}
