//! FreeCrosshair - crosshair overlay with a tray menu
//!
//! Startup order:
//! - make sure the DPI compatibility layer is set (relaunches once if not)
//! - become the single running instance, or forward arguments to it
//! - run the tray + redraw loop

#![windows_subsystem = "windows"]

use anyhow::Result;
use free_crosshair::config;
use tracing_subscriber::EnvFilter;

fn main() {
    let app_config = config::load_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.log_level)),
        )
        .init();

    tracing::info!("FreeCrosshair {} starting...", env!("CARGO_PKG_VERSION"));

    // Leave an editable config.json behind on first run
    if config::config_path().is_ok_and(|path| !path.exists()) {
        if let Err(e) = config::save_config(&app_config) {
            tracing::warn!("Could not write default config: {:#}", e);
        }
    }

    if let Err(e) = run(&app_config) {
        tracing::error!("Startup failed: {:#}", e);
        free_crosshair::dialogs::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

#[cfg(windows)]
fn run(app_config: &config::AppConfig) -> Result<()> {
    use free_crosshair::compat::{self, CompatStatus};
    use free_crosshair::instance::{self, Instance};
    use free_crosshair::app;

    if compat::ensure_compat_layer()? == CompatStatus::Restarted {
        tracing::info!("Relaunched with compatibility layer, exiting");
        return Ok(());
    }

    let args: Vec<String> = std::env::args().skip(1).collect();

    let _guard = match instance::acquire()? {
        Instance::Primary(guard) => guard,
        Instance::Secondary => return instance::forward_args(args),
    };

    let messages = instance::spawn_listener()?;
    app::run(app_config, args, messages)
}

#[cfg(not(windows))]
fn run(_app_config: &config::AppConfig) -> Result<()> {
    anyhow::bail!("FreeCrosshair is only supported on Windows")
}
