//! The capture pipeline: read pixels, then deliver them in the requested mode.

use std::path::Path;

use thiserror::Error;

use crate::capture::{
    dependencies::CaptureDependencies,
    encode,
    types::{
        CaptureError, CaptureRequest, DeliveryError, DeliveryMode, DeliveryReceipt, EncodeError,
    },
};

/// Any failure along the capture-and-deliver path.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Execute one capture request end to end.
///
/// File delivery encodes a PNG, saves it under `screenshot_folder`, and
/// places the file's absolute path on the clipboard as text. Clipboard
/// delivery skips the filesystem entirely and places raw pixels on the
/// clipboard.
pub fn dispatch(
    request: &CaptureRequest,
    screenshot_folder: &Path,
    dependencies: &CaptureDependencies,
) -> Result<DeliveryReceipt, DispatchError> {
    log::info!("Starting capture: {:?}", request);

    let snapshot = dependencies.capturer.capture(request.region)?;
    log::debug!(
        "Captured {}x{} pixels from {:?}",
        snapshot.width(),
        snapshot.height(),
        request.region
    );

    let saved_path = match request.mode {
        DeliveryMode::FilePathToClipboard => {
            let png_bytes = encode::encode_png(&snapshot)?;
            let path = dependencies.saver.save(&png_bytes, screenshot_folder)?;
            let text = path.to_string_lossy().into_owned();
            dependencies.clipboard.set_text(&text)?;
            Some(path)
        }
        DeliveryMode::ClipboardImage => {
            dependencies.clipboard.set_image(&snapshot)?;
            None
        }
    };

    Ok(DeliveryReceipt {
        mode: request.mode,
        width: snapshot.width(),
        height: snapshot.height(),
        saved_path,
    })
}
