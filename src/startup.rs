//! Login autostart via XDG desktop entries.
//!
//! Registering drops a `traysnap.desktop` file into the user's
//! `~/.config/autostart/` directory so the desktop session launches the
//! tray daemon at login. Unregistering removes that file again.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const DESKTOP_FILE_NAME: &str = "traysnap.desktop";

/// Get the autostart directory for the current user.
fn autostart_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("autostart"))
}

/// Render the desktop entry launching the given executable in tray mode.
fn desktop_entry(exe: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=traysnap\n\
         Comment=Tray screenshot utility\n\
         Exec=\"{}\" --tray\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        exe.display()
    )
}

fn register_in(dir: &Path, exe: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create autostart directory: {}", dir.display()))?;

    let path = dir.join(DESKTOP_FILE_NAME);
    fs::write(&path, desktop_entry(exe))
        .with_context(|| format!("Failed to write desktop entry: {}", path.display()))?;

    Ok(path)
}

fn unregister_in(dir: &Path) -> Result<bool> {
    let path = dir.join(DESKTOP_FILE_NAME);
    if !path.exists() {
        return Ok(false);
    }

    fs::remove_file(&path)
        .with_context(|| format!("Failed to remove desktop entry: {}", path.display()))?;

    Ok(true)
}

/// Bring the autostart entry in line with the configured setting.
///
/// Registration failures are returned; a missing entry on unregister is
/// not an error.
pub fn apply(run_at_startup: bool) -> Result<()> {
    let dir = autostart_dir()?;

    if run_at_startup {
        let exe = std::env::current_exe().context("Could not determine own executable path")?;
        let path = register_in(&dir, &exe)?;
        log::info!("Registered autostart entry: {}", path.display());
    } else if unregister_in(&dir)? {
        log::info!("Removed autostart entry");
    } else {
        log::debug!("No autostart entry to remove");
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
