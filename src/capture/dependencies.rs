use std::{path::Path, path::PathBuf, sync::Arc};

use crate::capture::{
    clipboard, file, sources,
    types::{CaptureError, DeliveryError, PixelSnapshot},
};
use crate::util::Rect;

/// Abstraction over reading pixels off the screen.
pub trait ScreenCapturer: Send + Sync {
    fn capture(&self, region: Rect) -> Result<PixelSnapshot, CaptureError>;
}

/// Abstraction over writing encoded screenshots to disk.
pub trait SnapshotSaver: Send + Sync {
    fn save(&self, png_bytes: &[u8], folder: &Path) -> Result<PathBuf, DeliveryError>;
}

/// Abstraction over handing results to the clipboard.
pub trait ClipboardSink: Send + Sync {
    fn set_image(&self, snapshot: &PixelSnapshot) -> Result<(), DeliveryError>;
    fn set_text(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Bundle of dependencies used by the capture pipeline. Each component can be mocked in tests.
#[derive(Clone)]
pub struct CaptureDependencies {
    pub capturer: Arc<dyn ScreenCapturer>,
    pub saver: Arc<dyn SnapshotSaver>,
    pub clipboard: Arc<dyn ClipboardSink>,
}

impl Default for CaptureDependencies {
    fn default() -> Self {
        Self {
            capturer: Arc::new(DefaultCapturer),
            saver: Arc::new(DefaultSaver),
            clipboard: Arc::new(DefaultClipboard),
        }
    }
}

struct DefaultCapturer;
struct DefaultSaver;
struct DefaultClipboard;

impl ScreenCapturer for DefaultCapturer {
    fn capture(&self, region: Rect) -> Result<PixelSnapshot, CaptureError> {
        sources::capture_region(region)
    }
}

impl SnapshotSaver for DefaultSaver {
    fn save(&self, png_bytes: &[u8], folder: &Path) -> Result<PathBuf, DeliveryError> {
        file::save_png(png_bytes, folder)
    }
}

impl ClipboardSink for DefaultClipboard {
    fn set_image(&self, snapshot: &PixelSnapshot) -> Result<(), DeliveryError> {
        clipboard::copy_image(snapshot)
    }

    fn set_text(&self, text: &str) -> Result<(), DeliveryError> {
        clipboard::copy_text(text)
    }
}
