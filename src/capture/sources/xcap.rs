//! Screen capture backed by `xcap`, with multi-monitor stitching.
//!
//! Each monitor is captured separately and blitted into a canvas at its
//! offset relative to the requested region, so a region spanning two
//! monitors (or sitting entirely on a negative-origin monitor) comes out
//! as one contiguous image.

use crate::capture::types::{CaptureError, PixelSnapshot};
use crate::util::Rect;
use image::{Rgba, RgbaImage, imageops};
use log::{debug, warn};
use xcap::Monitor;

/// Capture the pixels of a desktop-space region.
pub fn capture_region(region: Rect) -> Result<PixelSnapshot, CaptureError> {
    if !region.is_valid() {
        return Err(CaptureError::EmptyRegion {
            width: region.width,
            height: region.height,
        });
    }

    let monitors = Monitor::all().map_err(|err| CaptureError::Backend(err.to_string()))?;

    let mut frames = Vec::new();
    for monitor in &monitors {
        let bounds = match monitor_bounds(monitor) {
            Ok(bounds) => bounds,
            Err(err) => {
                warn!("Skipping monitor with unreadable geometry: {err}");
                continue;
            }
        };
        if region.intersect(&bounds).is_none() {
            debug!(
                "Monitor at ({}, {}) does not overlap capture region, skipping",
                bounds.x, bounds.y
            );
            continue;
        }
        let image = monitor
            .capture_image()
            .map_err(|err| CaptureError::Backend(err.to_string()))?;
        frames.push((bounds, image));
    }

    let pixels = stitch(&frames, region)?;
    Ok(PixelSnapshot::new(pixels, region))
}

fn monitor_bounds(monitor: &Monitor) -> Result<Rect, xcap::XCapError> {
    Ok(Rect {
        x: monitor.x()?,
        y: monitor.y()?,
        width: monitor.width()? as i32,
        height: monitor.height()? as i32,
    })
}

/// Compose per-monitor frames into a single image covering `region`.
///
/// Each frame lands at its monitor's offset relative to the region origin;
/// `replace` clips frames that extend past the canvas. Pixels no monitor
/// covers stay opaque black.
fn stitch(frames: &[(Rect, RgbaImage)], region: Rect) -> Result<RgbaImage, CaptureError> {
    if frames.is_empty() {
        return Err(CaptureError::OutOfBounds(region));
    }

    let mut canvas = RgbaImage::from_pixel(
        region.width as u32,
        region.height as u32,
        Rgba([0, 0, 0, 255]),
    );
    for (bounds, image) in frames {
        let dx = (bounds.x - region.x) as i64;
        let dy = (bounds.y - region.y) as i64;
        imageops::replace(&mut canvas, image, dx, dy);
    }
    Ok(canvas)
}
