//! File saving for captured screenshots.

use super::types::DeliveryError;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Timestamp pattern baked into every saved filename.
const FILENAME_TEMPLATE: &str = "screenshot_%Y%m%d_%H%M%S";

/// Generate a timestamped PNG filename for the current local time.
pub fn timestamped_filename() -> String {
    format!("{}.png", Local::now().format(FILENAME_TEMPLATE))
}

/// Ensure the screenshot directory exists, creating it if necessary.
///
/// # Returns
/// The canonicalized path to the directory.
pub fn ensure_directory_exists(directory: &Path) -> Result<PathBuf, DeliveryError> {
    if !directory.exists() {
        log::info!("Creating screenshot directory: {}", directory.display());
        fs::create_dir_all(directory)?;
    }

    // Canonicalize to resolve ~ and relative paths
    let canonical = directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf());

    Ok(canonical)
}

/// Save PNG bytes into `folder` under a timestamped name.
///
/// # Returns
/// The absolute path of the written file.
pub fn save_png(png_bytes: &[u8], folder: &Path) -> Result<PathBuf, DeliveryError> {
    let directory = ensure_directory_exists(folder)?;

    let filename = timestamped_filename();
    let file_path = directory.join(&filename);

    log::info!(
        "Saving screenshot to: {} ({} bytes)",
        file_path.display(),
        png_bytes.len()
    );

    fs::write(&file_path, png_bytes)?;

    // Verify the write
    let written_size = fs::metadata(&file_path)?.len();
    log::debug!("File written: {} bytes", written_size);

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&file_path, Permissions::from_mode(0o600))?;
    }

    Ok(file_path)
}

/// Expand tilde (~) in path strings.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}
