//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Capture delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// When true, PNG-flavoured captures save a file and put its path on
    /// the clipboard instead of the raw image. Useful for feeding
    /// screenshots into command-line tools.
    #[serde(default = "default_save_as_path")]
    pub save_as_path: bool,

    /// Directory screenshots are saved into. Created on demand when the
    /// first file capture runs.
    #[serde(default = "default_screenshot_folder")]
    pub screenshot_folder: PathBuf,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            save_as_path: default_save_as_path(),
            screenshot_folder: default_screenshot_folder(),
        }
    }
}

/// Autostart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupSettings {
    /// Install an autostart entry so the tray daemon launches with the
    /// desktop session.
    #[serde(default = "default_run_at_startup")]
    pub run_at_startup: bool,
}

impl Default for StartupSettings {
    fn default() -> Self {
        Self {
            run_at_startup: default_run_at_startup(),
        }
    }
}

fn default_save_as_path() -> bool {
    false
}

fn default_screenshot_folder() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Screenshots")
}

fn default_run_at_startup() -> bool {
    true
}
