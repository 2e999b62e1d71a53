//! Application shell
//!
//! Wires the catalog, state, tray and overlay together and runs the one
//! loop that owns them all: pump window messages, apply tray and
//! second-instance requests, sleep. Redraws come from a thread timer so
//! they keep running while a menu or dialog has the message loop.
//! Everything that touches `CrosshairState` happens on this thread.

use crate::args::{self, CommandArgs};
use crate::color::Argb;
use crate::instance::InstanceMessage;
use crate::state::CrosshairState;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Two left clicks closer than this count as a double-click
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// Opaque color with random channels
pub fn random_color<R: Rng>(rng: &mut R) -> Argb {
    Argb::opaque(rng.gen(), rng.gen(), rng.gen())
}

/// Apply a message from a second launch. A relaunch without any arguments
/// cycles the style; anything else goes through the resolver.
pub fn apply_message(state: &mut CrosshairState, message: &InstanceMessage) -> bool {
    match message {
        InstanceMessage::Args(raw) if raw.is_empty() => {
            debug!("Relaunched without arguments, cycling style");
            state.next_style()
        }
        InstanceMessage::Args(raw) => {
            let parsed = CommandArgs::parse(raw);
            info!("Applying forwarded arguments {:?}", parsed);
            args::apply(&parsed, state)
        }
    }
}

/// Turns left-button releases into double-clicks
#[derive(Debug, Default)]
pub struct ClickTracker {
    last_click: Option<Instant>,
}

impl ClickTracker {
    /// Record a click. Returns true if it completes a double-click.
    pub fn click(&mut self, now: Instant) -> bool {
        match self.last_click.take() {
            Some(last) if now.duration_since(last) < DOUBLE_CLICK_WINDOW => true,
            _ => {
                self.last_click = Some(now);
                false
            }
        }
    }
}

#[cfg(windows)]
pub use shell::run;

#[cfg(windows)]
mod shell {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::{self, AppConfig};
    use crate::dialogs;
    use crate::bitmap::SharedBitmap;
    use crate::overlay::{LoopState, RedrawJob, Renderer};
    use crate::screen::{self, ScreenSurface};
    use crate::tray::{TrayCommand, TrayMenu};
    use anyhow::{Context, Result};
    use crossbeam::channel::Receiver;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tray_icon::menu::MenuEvent;
    use tray_icon::{MouseButton, MouseButtonState, TrayIconEvent};
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, KillTimer, PeekMessageW, SetTimer, TranslateMessage, MSG, PM_REMOVE,
        WM_QUIT,
    };

    struct Shell {
        state: CrosshairState,
        tray: TrayMenu,
        styles_dir: PathBuf,
        colors_dir: PathBuf,
    }

    /// Run until Exit is chosen. `launch_args` are this process's own
    /// arguments, `messages` carries those of later launches.
    pub fn run(
        app_config: &AppConfig,
        launch_args: Vec<String>,
        messages: Receiver<InstanceMessage>,
    ) -> Result<()> {
        let base = config::executable_directory()?;
        let styles_dir = app_config.styles_dir(&base);
        let colors_dir = app_config.colors_dir(&base);

        let catalog = Catalog::load(&styles_dir, &colors_dir);
        let mut state = CrosshairState::new(catalog)?;
        args::apply(&CommandArgs::parse(&launch_args), &mut state);

        let tray = TrayMenu::new(&state).context("Failed to create tray menu")?;

        let (event_tx, event_rx) = crossbeam::channel::unbounded::<TrayIconEvent>();
        let (menu_tx, menu_rx) = crossbeam::channel::unbounded::<MenuEvent>();

        TrayIconEvent::set_event_handler(Some(move |event| {
            let _ = event_tx.send(event);
        }));
        MenuEvent::set_event_handler(Some(move |event| {
            let _ = menu_tx.send(event);
        }));

        let surface = ScreenSurface::acquire()?;
        let dpi_scale = app_config.dpi_scale.unwrap_or_else(screen::dpi_scale);
        let renderer = Renderer::start(
            surface,
            screen::primary_screen_size(),
            dpi_scale,
            state.composited(),
        );
        REDRAW.with(|job| *job.borrow_mut() = Some(RedrawJob::new(renderer, state.composited())));

        let interval = app_config.redraw_interval();
        let elapse = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX);
        let timer_id = unsafe { SetTimer(None, 0, elapse, Some(on_redraw_timer)) };
        if timer_id == 0 {
            REDRAW.with(|job| job.borrow_mut().take());
            anyhow::bail!("Failed to start the redraw timer");
        }

        let mut shell = Shell {
            state,
            tray,
            styles_dir,
            colors_dir,
        };
        let mut clicks = ClickTracker::default();
        let mut stopping = false;

        info!("Entering main loop, redraw every {:?}", interval);

        let mut msg = MSG::default();
        while !stopping {
            // Dispatching also runs the redraw timer
            unsafe {
                while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                    if msg.message == WM_QUIT {
                        info!("WM_QUIT received");
                        stopping = true;
                        break;
                    }
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }

            while let Ok(event) = event_rx.try_recv() {
                if let TrayIconEvent::Click {
                    button: MouseButton::Left,
                    button_state: MouseButtonState::Up,
                    ..
                } = event
                {
                    if clicks.click(Instant::now()) {
                        debug!("Tray double-click, cycling style");
                        shell.changed(|state| state.next_style());
                    }
                }
            }

            while let Ok(event) = menu_rx.try_recv() {
                let Some(command) = shell.tray.command(&event.id) else {
                    continue;
                };
                if shell.handle(command) == LoopState::Stopping {
                    stopping = true;
                }
            }

            while let Ok(message) = messages.try_recv() {
                shell.changed(|state| apply_message(state, &message));
            }

            publish(shell.state.composited());

            if !stopping {
                std::thread::sleep(interval);
            }
        }

        unsafe {
            let _ = KillTimer(None, timer_id);
        }
        if let Some(job) = REDRAW.with(|job| job.borrow_mut().take()) {
            job.finish();
        }
        info!("Main loop finished");
        Ok(())
    }

    thread_local! {
        /// Redraw state reachable from the timer callback. Only the main
        /// thread ever touches it.
        static REDRAW: RefCell<Option<RedrawJob<ScreenSurface>>> = const { RefCell::new(None) };
    }

    /// Ticks the overlay. Runs from `DispatchMessageW`, including the
    /// nested loops of the tray menu and of modal dialogs.
    unsafe extern "system" fn on_redraw_timer(_hwnd: HWND, _msg: u32, _id: usize, _time: u32) {
        REDRAW.with(|job| {
            if let Ok(mut job) = job.try_borrow_mut() {
                if let Some(job) = job.as_mut() {
                    job.tick();
                }
            }
        });
    }

    /// Hand the current crosshair to the redraw timer
    fn publish(bitmap: &SharedBitmap) {
        REDRAW.with(|job| {
            if let Ok(mut job) = job.try_borrow_mut() {
                if let Some(job) = job.as_mut() {
                    job.publish(bitmap);
                }
            }
        });
    }

    impl Shell {
        /// Run a state update, then refresh the tray
        fn changed(&mut self, update: impl FnOnce(&mut CrosshairState) -> bool) {
            update(&mut self.state);
            publish(self.state.composited());
            self.tray.sync(&self.state);
        }

        fn handle(&mut self, command: TrayCommand) -> LoopState {
            debug!("Tray command {:?}", command);
            match command {
                TrayCommand::SelectStyle(index) => {
                    self.changed(|state| state.select_style(index));
                }
                TrayCommand::SelectColor(index) => {
                    self.changed(|state| state.select_color(index));
                }
                TrayCommand::CustomColor => {
                    let slot = self.state.custom_slot();
                    let initial = self.state.active_color().argb();
                    let picked = dialogs::pick_color(initial);
                    self.changed(|state| match (slot, picked) {
                        (Some(slot), Some(color)) => state.assign_slot(slot, color),
                        _ => false,
                    });
                }
                TrayCommand::RandomColor => {
                    let color = random_color(&mut rand::thread_rng());
                    self.changed(|state| {
                        state
                            .random_slot()
                            .is_some_and(|slot| state.assign_slot(slot, color))
                    });
                }
                TrayCommand::About => {
                    let exe_name = std::env::current_exe()
                        .ok()
                        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                        .unwrap_or_else(|| "free_crosshair.exe".to_string());
                    dialogs::show_about(&dialogs::about_text(
                        &exe_name,
                        &self.styles_dir,
                        &self.colors_dir,
                    ));
                    // Undo the check mark toggled by the click
                    self.tray.sync(&self.state);
                }
                TrayCommand::Exit => {
                    info!("Exit requested from tray");
                    return LoopState::Stopping;
                }
            }
            LoopState::Running
        }
    }
}
