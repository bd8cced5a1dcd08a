//! Pixel sources for screenshot capture.

use crate::capture::types::{CaptureError, PixelSnapshot};
use crate::util::Rect;

mod xcap;

/// Read the pixels of a desktop-space region from the screen.
///
/// Regions spanning several monitors are stitched together; regions
/// extending past every monitor keep their requested size, with the
/// uncovered area left black.
pub fn capture_region(region: Rect) -> Result<PixelSnapshot, CaptureError> {
    xcap::capture_region(region)
}
