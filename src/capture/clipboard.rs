//! Clipboard integration for delivering screenshots.
//!
//! Images and path text both go through `arboard` first, which covers X11
//! and Wayland sessions alike. When arboard cannot reach the display
//! server the image path shells out to `wl-copy`, whose forked server
//! keeps the selection alive independently of this process.

use super::encode;
use super::types::{DeliveryError, PixelSnapshot};
use std::borrow::Cow;
use std::process::{Command, Stdio};

/// Place a captured image on the clipboard.
pub fn copy_image(snapshot: &PixelSnapshot) -> Result<(), DeliveryError> {
    log::debug!(
        "Copying {}x{} screenshot to clipboard",
        snapshot.width(),
        snapshot.height()
    );

    match copy_image_via_library(snapshot) {
        Ok(()) => {
            log::info!("Copied screenshot to clipboard via arboard");
            Ok(())
        }
        Err(lib_err) => {
            log::warn!(
                "arboard image copy failed ({}). Falling back to wl-copy",
                lib_err
            );
            let png_bytes = encode::encode_png(snapshot)
                .map_err(|e| DeliveryError::Clipboard(format!("fallback encode failed: {}", e)))?;
            match copy_png_via_command(&png_bytes) {
                Ok(()) => {
                    log::info!("Copied screenshot to clipboard via wl-copy fallback");
                    Ok(())
                }
                Err(cmd_err) => {
                    let combined =
                        format!("arboard failed: {} ; wl-copy failed: {}", lib_err, cmd_err);
                    Err(DeliveryError::Clipboard(combined))
                }
            }
        }
    }
}

/// Place a file path (or any text) on the clipboard.
pub fn copy_text(text: &str) -> Result<(), DeliveryError> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| DeliveryError::Clipboard(format!("clipboard unavailable: {}", e)))?;
    clipboard
        .set_text(text)
        .map_err(|e| DeliveryError::Clipboard(format!("failed to set text: {}", e)))?;
    log::info!("Copied path to clipboard ({} chars)", text.len());
    Ok(())
}

fn copy_image_via_library(snapshot: &PixelSnapshot) -> Result<(), DeliveryError> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| DeliveryError::Clipboard(format!("clipboard unavailable: {}", e)))?;

    let image = arboard::ImageData {
        width: snapshot.width() as usize,
        height: snapshot.height() as usize,
        bytes: Cow::Borrowed(snapshot.pixels().as_raw()),
    };
    clipboard
        .set_image(image)
        .map_err(|e| DeliveryError::Clipboard(format!("failed to set image: {}", e)))?;
    Ok(())
}

/// Copy PNG bytes to the clipboard by shelling out to wl-copy.
fn copy_png_via_command(png_bytes: &[u8]) -> Result<(), DeliveryError> {
    use std::io::Write;

    let mut child = Command::new("wl-copy")
        .arg("--type")
        .arg("image/png")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            DeliveryError::Clipboard(format!("Failed to spawn wl-copy (is it installed?): {}", e))
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(png_bytes).map_err(|e| {
            DeliveryError::Clipboard(format!("Failed to write to wl-copy stdin: {}", e))
        })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| DeliveryError::Clipboard(format!("Failed to wait for wl-copy: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DeliveryError::Clipboard(format!(
            "wl-copy failed: {}",
            stderr
        )));
    }

    log::debug!("wl-copy command completed successfully");
    Ok(())
}
