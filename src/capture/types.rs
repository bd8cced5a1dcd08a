//! Data types for screenshot capture and delivery.

use crate::geometry::GeometryError;
use crate::util::Rect;
use image::RgbaImage;
use std::path::PathBuf;
use thiserror::Error;

/// Pixels captured from the desktop, together with the desktop-space
/// rectangle they were read from.
#[derive(Debug, Clone)]
pub struct PixelSnapshot {
    pixels: RgbaImage,
    region: Rect,
}

impl PixelSnapshot {
    /// Wrap raw RGBA pixels captured from `region`.
    pub fn new(pixels: RgbaImage, region: Rect) -> Self {
        Self { pixels, region }
    }

    /// Width of the snapshot in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height of the snapshot in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Desktop-space rectangle the pixels were captured from.
    pub fn region(&self) -> Rect {
        self.region
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }
}

/// How a captured screenshot is handed to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Place the raw image on the clipboard.
    ClipboardImage,
    /// Save a PNG file and place its absolute path on the clipboard as text.
    FilePathToClipboard,
}

impl DeliveryMode {
    /// Resolve the effective mode for one capture.
    ///
    /// Image-flavoured actions always deliver to the clipboard; the
    /// file path mode is only used when the action allows it *and* the
    /// user has enabled path delivery in their settings.
    pub fn resolve(force_clipboard_image: bool, save_as_path: bool) -> Self {
        if !force_clipboard_image && save_as_path {
            DeliveryMode::FilePathToClipboard
        } else {
            DeliveryMode::ClipboardImage
        }
    }
}

/// A single capture to perform: which desktop pixels, delivered how.
#[derive(Debug, Clone, Copy)]
pub struct CaptureRequest {
    /// Desktop-space rectangle to capture.
    pub region: Rect,
    /// Delivery mode for the result.
    pub mode: DeliveryMode,
}

/// Outcome of a successful capture, with the material needed to tell
/// the user what happened.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Mode the capture was actually delivered in.
    pub mode: DeliveryMode,
    /// Captured width in pixels.
    pub width: u32,
    /// Captured height in pixels.
    pub height: u32,
    /// Path of the saved file, when one was written.
    pub saved_path: Option<PathBuf>,
}

impl DeliveryReceipt {
    /// Short headline for a desktop notification.
    pub fn summary(&self) -> &'static str {
        match self.mode {
            DeliveryMode::FilePathToClipboard => "Screenshot Saved!",
            DeliveryMode::ClipboardImage => "Screenshot Captured!",
        }
    }

    /// Notification body describing where the screenshot went.
    pub fn body(&self) -> String {
        match &self.saved_path {
            Some(path) => format!("Path copied to clipboard:\n{}", path.display()),
            None => format!("Copied to clipboard ({}x{})", self.width, self.height),
        }
    }

    /// How long the notification should stay visible, in milliseconds.
    pub fn expire_ms(&self) -> i32 {
        match self.mode {
            DeliveryMode::FilePathToClipboard => 2000,
            DeliveryMode::ClipboardImage => 1500,
        }
    }
}

/// Errors that can occur while reading pixels off the screen.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Monitor layout unavailable: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Screen capture failed: {0}")]
    Backend(String),

    #[error("Capture region is empty ({width}x{height})")]
    EmptyRegion { width: i32, height: i32 },

    #[error("Capture region {0:?} does not overlap any monitor")]
    OutOfBounds(Rect),
}

/// Errors that can occur while encoding pixels to PNG.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// Errors that can occur while handing the result to the user.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to save screenshot: {0}")]
    Save(#[from] std::io::Error),

    #[error("Clipboard operation failed: {0}")]
    Clipboard(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_honours_force_flag() {
        assert_eq!(
            DeliveryMode::resolve(true, true),
            DeliveryMode::ClipboardImage
        );
        assert_eq!(
            DeliveryMode::resolve(true, false),
            DeliveryMode::ClipboardImage
        );
    }

    #[test]
    fn resolve_honours_path_setting() {
        assert_eq!(
            DeliveryMode::resolve(false, true),
            DeliveryMode::FilePathToClipboard
        );
        assert_eq!(
            DeliveryMode::resolve(false, false),
            DeliveryMode::ClipboardImage
        );
    }

    #[test]
    fn receipt_text_for_clipboard_delivery() {
        let receipt = DeliveryReceipt {
            mode: DeliveryMode::ClipboardImage,
            width: 800,
            height: 600,
            saved_path: None,
        };
        assert_eq!(receipt.summary(), "Screenshot Captured!");
        assert_eq!(receipt.body(), "Copied to clipboard (800x600)");
        assert_eq!(receipt.expire_ms(), 1500);
    }

    #[test]
    fn receipt_text_for_file_delivery() {
        let receipt = DeliveryReceipt {
            mode: DeliveryMode::FilePathToClipboard,
            width: 800,
            height: 600,
            saved_path: Some(PathBuf::from("/tmp/screenshot_20250101_120000.png")),
        };
        assert_eq!(receipt.summary(), "Screenshot Saved!");
        assert!(receipt.body().starts_with("Path copied to clipboard:\n"));
        assert!(receipt.body().ends_with("screenshot_20250101_120000.png"));
        assert_eq!(receipt.expire_ms(), 2000);
    }
}
