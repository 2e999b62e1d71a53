//! FreeCrosshair Library
//!
//! Crosshair overlay drawn on top of the screen, driven from a tray menu.
//! Everything except the shell, tray and screen surface is platform
//! independent and tested on its own.

pub mod app;
pub mod args;
pub mod bitmap;
pub mod catalog;
pub mod color;
pub mod compat;
pub mod config;
pub mod dialogs;
pub mod instance;
pub mod menu;
pub mod overlay;
#[cfg(windows)]
pub mod screen;
pub mod state;
pub mod tray;
