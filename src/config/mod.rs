//! Configuration file support for traysnap.
//!
//! This module handles loading and validating user settings from the
//! configuration file located at `~/.config/traysnap/config.toml`. Settings
//! cover capture delivery (clipboard image vs. saved path) and autostart.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod types;

pub use types::{CaptureSettings, StartupSettings};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::capture::file::expand_tilde;

/// Main configuration structure containing all user settings.
///
/// This is the root type that gets deserialized from the TOML file. All
/// fields have defaults and will use those if not specified.
///
/// # Example TOML
/// ```toml
/// [capture]
/// save_as_path = true
/// screenshot_folder = "~/Pictures/shots"
///
/// [startup]
/// run_at_startup = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Capture delivery settings
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Autostart settings
    #[serde(default)]
    pub startup: StartupSettings,
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined
    /// (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("traysnap");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from file, or returns defaults if not found.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_normalize();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Loads configuration, absorbing failures into the defaults.
    ///
    /// A broken settings file should never keep the daemon from starting;
    /// the parse error is logged and the user continues with defaults.
    pub fn load_or_default() -> Self {
        Config::load().unwrap_or_else(|err| {
            warn!("Falling back to default settings: {err:#}");
            Config::default()
        })
    }

    /// Saves the current configuration to file.
    ///
    /// Creates the parent directory if it doesn't exist. Called whenever
    /// a tray toggle changes a setting.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory cannot be created
    /// - The config cannot be serialized to TOML
    /// - The file cannot be written
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Normalizes folder settings after a load.
    ///
    /// An empty folder string falls back to the default with a warning. A
    /// folder that does not exist yet is kept; it is created the first
    /// time a capture saves into it. Tildes are expanded so the rest of
    /// the code never sees `~`.
    fn validate_and_normalize(&mut self) {
        let folder = self.capture.screenshot_folder.to_string_lossy();

        if folder.trim().is_empty() {
            warn!("Empty screenshot_folder in config, using default");
            self.capture.screenshot_folder = CaptureSettings::default().screenshot_folder;
            return;
        }

        let expanded = expand_tilde(&folder);
        if expanded != self.capture.screenshot_folder {
            debug!("Expanded screenshot_folder to {}", expanded.display());
            self.capture.screenshot_folder = expanded;
        }

        if !self.capture.screenshot_folder.exists() {
            debug!(
                "Screenshot folder {} does not exist yet; it will be created on first save",
                self.capture.screenshot_folder.display()
            );
        }
    }
}
