//! Screenshot capture functionality for traysnap.
//!
//! This module provides the capture-and-deliver pipeline:
//! - Full virtual-desktop and region capture with multi-monitor stitching
//! - PNG encoding
//! - Clipboard delivery (raw image, or saved-file path as text)
//! - Timestamped file saving

pub mod clipboard;
pub mod file;
pub mod types;

mod dependencies;
mod encode;
mod pipeline;
mod sources;

pub use dependencies::{CaptureDependencies, ClipboardSink, ScreenCapturer, SnapshotSaver};
pub use encode::encode_png;
pub use pipeline::{DispatchError, dispatch};
pub use sources::capture_region;
#[allow(unused_imports)]
pub use types::{
    CaptureError, CaptureRequest, DeliveryError, DeliveryMode, DeliveryReceipt, EncodeError,
    PixelSnapshot,
};
