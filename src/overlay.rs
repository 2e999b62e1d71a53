//! Overlay Renderer
//!
//! Draws the composited crosshair at the center of the primary display once
//! per tick. Placement is computed once when the loop starts; DPI changes
//! while running are not tracked.
//!
//! The drawing target is abstracted behind `DrawSurface` so the loop can run
//! against the screen device context on Windows and against fakes in tests.

use crate::bitmap::SharedBitmap;
use image::RgbaImage;
use std::rc::Rc;
use tracing::{debug, info};

/// Something the crosshair can be drawn onto
pub trait DrawSurface {
    /// Draw `bitmap` with its top-left corner at (`x`, `y`). The same
    /// `Rc` is passed every tick until the crosshair changes.
    fn draw(&mut self, bitmap: &SharedBitmap, x: i32, y: i32);

    /// Give the surface back to the system. Called exactly once.
    fn release(&mut self);
}

/// Size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn of(bitmap: &RgbaImage) -> Self {
        Self::new(bitmap.width() as i32, bitmap.height() as i32)
    }

    /// Scale by a DPI factor, rounding to the nearest pixel
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(
            (self.width as f32 * factor).round() as i32,
            (self.height as f32 * factor).round() as i32,
        )
    }
}

/// Top-left corner of the crosshair on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

impl Placement {
    /// Center `bitmap` on a screen of size `screen` scaled by `dpi_scale`
    pub fn centered(screen: Size, dpi_scale: f32, bitmap: Size) -> Self {
        let screen = screen.scaled(dpi_scale);
        Self {
            x: screen.width / 2 - bitmap.width / 2,
            y: screen.height / 2 - bitmap.height / 2,
        }
    }
}

/// Redraw loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
}

/// Draws the crosshair every tick until asked to stop
pub struct Renderer<S: DrawSurface> {
    surface: S,
    placement: Placement,
    state: LoopState,
    stop_requested: bool,
    released: bool,
}

impl<S: DrawSurface> Renderer<S> {
    /// Start the loop. `first` is the crosshair that exists before the first
    /// tick; its size fixes the placement for the rest of the run.
    pub fn start(surface: S, screen: Size, dpi_scale: f32, first: &RgbaImage) -> Self {
        let placement = Placement::centered(screen, dpi_scale, Size::of(first));
        info!(
            "Overlay started: screen {}x{}, scale {:.2}, crosshair at ({}, {})",
            screen.width, screen.height, dpi_scale, placement.x, placement.y
        );

        Self {
            surface,
            placement,
            state: LoopState::Running,
            stop_requested: false,
            released: false,
        }
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Ask the loop to stop; observed at the start of the next tick
    pub fn request_stop(&mut self) {
        debug!("Overlay stop requested");
        self.stop_requested = true;
    }

    /// Run one iteration. Returns the state after the tick.
    pub fn tick(&mut self, bitmap: &SharedBitmap) -> LoopState {
        if self.stop_requested {
            self.state = LoopState::Stopping;
        }

        if self.state == LoopState::Running {
            self.surface.draw(bitmap, self.placement.x, self.placement.y);
        }

        self.state
    }

    /// Release the drawing surface. Safe to call more than once.
    pub fn finish(&mut self) {
        if !self.released {
            self.surface.release();
            self.released = true;
            info!("Overlay surface released");
        }
    }
}

impl<S: DrawSurface> Drop for Renderer<S> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// A renderer together with the crosshair it should draw next.
///
/// The shell publishes the composited bitmap after every change, and a
/// timer callback ticks the job. The callback also fires inside modal loops
/// (menus, dialogs), where the shell itself is blocked.
pub struct RedrawJob<S: DrawSurface> {
    renderer: Renderer<S>,
    current: SharedBitmap,
}

impl<S: DrawSurface> RedrawJob<S> {
    pub fn new(renderer: Renderer<S>, current: &SharedBitmap) -> Self {
        Self {
            renderer,
            current: Rc::clone(current),
        }
    }

    /// Draw `bitmap` from the next tick on
    pub fn publish(&mut self, bitmap: &SharedBitmap) {
        if !Rc::ptr_eq(&self.current, bitmap) {
            self.current = Rc::clone(bitmap);
        }
    }

    pub fn tick(&mut self) -> LoopState {
        self.renderer.tick(&self.current)
    }

    pub fn request_stop(&mut self) {
        self.renderer.request_stop();
    }

    /// Stop drawing and release the surface
    pub fn finish(mut self) {
        self.renderer.request_stop();
        self.renderer.tick(&self.current);
        self.renderer.finish();
    }
}
