/// Configuration module for FreeCrosshair.
///
/// This module provides functionality for managing application configuration,
/// including:
/// - The redraw interval of the overlay loop
/// - Optional overrides for the styles and colors directories
/// - An optional DPI scale override
/// - The default log level
///
/// The configuration is loaded from a `config.json` file located in the
/// platform-specific application data directory (%APPDATA%/FreeCrosshair/ on
/// Windows). A missing or malformed file means defaults.
///
/// # Example
///
/// ```rust,no_run
/// use free_crosshair::config::{load_config, save_config};
///
/// let mut config = load_config();
/// config.redraw_interval_ms = 16;
/// save_config(&config).expect("Failed to save config");
/// ```
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory next to the executable holding extra style images
pub const STYLES_DIR_NAME: &str = "Styles";
/// Directory next to the executable holding `.clr` color files
pub const COLORS_DIR_NAME: &str = "Colors";

const CONFIG_FILE_NAME: &str = "config.json";

/// Application configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Delay between overlay redraws
    pub redraw_interval_ms: u64,
    /// Overrides `<exe dir>/Styles`
    pub styles_dir: Option<PathBuf>,
    /// Overrides `<exe dir>/Colors`
    pub colors_dir: Option<PathBuf>,
    /// Fixed DPI scale instead of asking the system
    pub dpi_scale: Option<f32>,
    /// Log filter used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            redraw_interval_ms: 10,
            styles_dir: None,
            colors_dir: None,
            dpi_scale: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms.max(1))
    }

    /// Styles directory: the override, or `Styles` under `base`
    pub fn styles_dir(&self, base: &Path) -> PathBuf {
        self.styles_dir
            .clone()
            .unwrap_or_else(|| base.join(STYLES_DIR_NAME))
    }

    /// Colors directory: the override, or `Colors` under `base`
    pub fn colors_dir(&self, base: &Path) -> PathBuf {
        self.colors_dir
            .clone()
            .unwrap_or_else(|| base.join(COLORS_DIR_NAME))
    }
}

/// Directory containing the running executable
pub fn executable_directory() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("Executable path has no parent: {}", exe.display()))
}

/// Get the application's data directory
/// Returns %APPDATA%/FreeCrosshair/ on Windows
pub fn get_data_directory() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "FreeCrosshair")
        .ok_or_else(|| anyhow!("Failed to determine user data directory"))?;

    Ok(project_dirs.data_dir().to_path_buf())
}

/// Location of config.json
pub fn config_path() -> Result<PathBuf> {
    Ok(get_data_directory()?.join(CONFIG_FILE_NAME))
}

/// Load application configuration from config.json
/// Returns default config if file doesn't exist or on error
pub fn load_config() -> AppConfig {
    match config_path() {
        Ok(path) => load_config_from(&path),
        Err(_) => AppConfig::default(),
    }
}

/// Load configuration from an explicit path, falling back to defaults
pub fn load_config_from(path: &Path) -> AppConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return AppConfig::default();
    };

    serde_json::from_str(&contents).unwrap_or_default()
}

/// Save application configuration to config.json
pub fn save_config(config: &AppConfig) -> Result<()> {
    let data_dir = get_data_directory()?;

    fs::create_dir_all(&data_dir)
        .map_err(|e| anyhow!("Failed to create data directory: {}", e))?;

    save_config_to(config, &data_dir.join(CONFIG_FILE_NAME))
}

/// Save configuration to an explicit path
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    // Serialize to pretty-printed JSON
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

    fs::write(path, json).map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;

    Ok(())
}
