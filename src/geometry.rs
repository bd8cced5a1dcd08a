//! Display metrics: per-monitor geometry and the virtual-desktop bounding box.
//!
//! The virtual desktop is the union of all monitor rectangles in physical
//! pixels. Monitors left of or above the primary give the union a negative
//! origin. Bounds are recomputed on every query so monitor hotplug between
//! captures is picked up without a restart.

use log::{debug, warn};
use thiserror::Error;

use crate::util::Rect;

/// Errors raised by display enumeration.
///
/// A degraded union (zero-area bounding box) is not an error; it falls back
/// to the primary monitor's resolution with a logged warning.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("failed to enumerate monitors: {0}")]
    Enumeration(String),

    #[error("display server reported no usable monitors")]
    NoMonitors,
}

/// Geometry and identity of one attached monitor.
#[derive(Debug, Clone)]
pub struct MonitorGeometry {
    pub bounds: Rect,
    pub is_primary: bool,
    pub scale_factor: f32,
    pub name: String,
}

/// Source of monitor geometry, kept behind a trait so selection and capture
/// logic can be exercised against synthetic monitor layouts.
pub trait DisplayMetricsProvider: Send + Sync {
    fn monitors(&self) -> Result<Vec<MonitorGeometry>, GeometryError>;

    /// Resolution of the primary monitor, consulted when the reported
    /// monitor rectangles fold to a degenerate union.
    fn primary_resolution(&self) -> Option<(i32, i32)> {
        let monitors = self.monitors().ok()?;
        let primary = monitors
            .iter()
            .find(|m| m.is_primary)
            .or_else(|| monitors.first())?;
        if primary.bounds.width > 0 && primary.bounds.height > 0 {
            Some((primary.bounds.width, primary.bounds.height))
        } else {
            None
        }
    }
}

/// Production metrics provider backed by `xcap`.
pub struct XcapMetrics;

impl DisplayMetricsProvider for XcapMetrics {
    fn monitors(&self) -> Result<Vec<MonitorGeometry>, GeometryError> {
        let monitors =
            xcap::Monitor::all().map_err(|err| GeometryError::Enumeration(err.to_string()))?;

        let mut out = Vec::with_capacity(monitors.len());
        for monitor in &monitors {
            match read_monitor(monitor) {
                Ok(geometry) => out.push(geometry),
                Err(err) => {
                    // Skip monitors with unreadable geometry; the rest of the
                    // desktop stays usable.
                    warn!("Skipping monitor with unreadable geometry: {err}");
                }
            }
        }

        if out.is_empty() {
            return Err(GeometryError::NoMonitors);
        }
        Ok(out)
    }
}

fn read_monitor(monitor: &xcap::Monitor) -> Result<MonitorGeometry, xcap::XCapError> {
    let x = monitor.x()?;
    let y = monitor.y()?;
    let width = monitor.width()? as i32;
    let height = monitor.height()? as i32;
    let name = monitor.name().unwrap_or_else(|_| "unknown".into());
    let is_primary = monitor.is_primary().unwrap_or(false);
    let scale_factor = monitor.scale_factor().unwrap_or(1.0);

    Ok(MonitorGeometry {
        bounds: Rect {
            x,
            y,
            width,
            height,
        },
        is_primary,
        scale_factor,
        name,
    })
}

/// Computes the bounding box of all monitors in virtual-desktop coordinates.
///
/// A degenerate union falls back to the primary monitor's resolution at
/// origin (0,0) with a logged warning rather than failing; only total
/// enumeration failure is an error.
pub fn virtual_desktop_bounds(
    provider: &dyn DisplayMetricsProvider,
) -> Result<Rect, GeometryError> {
    let monitors = provider.monitors()?;
    if monitors.is_empty() {
        return Err(GeometryError::NoMonitors);
    }

    let min_x = monitors.iter().map(|m| m.bounds.x).min().unwrap_or(0);
    let min_y = monitors.iter().map(|m| m.bounds.y).min().unwrap_or(0);
    let max_x = monitors.iter().map(|m| m.bounds.right()).max().unwrap_or(0);
    let max_y = monitors
        .iter()
        .map(|m| m.bounds.bottom())
        .max()
        .unwrap_or(0);

    if let Some(bounds) = Rect::from_min_max(min_x, min_y, max_x, max_y) {
        debug!(
            "Virtual desktop bounds: {}x{} at ({}, {}) across {} monitor(s)",
            bounds.width,
            bounds.height,
            bounds.x,
            bounds.y,
            monitors.len()
        );
        return Ok(bounds);
    }

    let (width, height) = provider
        .primary_resolution()
        .ok_or(GeometryError::NoMonitors)?;
    warn!(
        "Degenerate virtual desktop union, falling back to primary monitor {width}x{height} at origin"
    );
    Rect::new(0, 0, width, height).ok_or(GeometryError::NoMonitors)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMetrics {
        monitors: Vec<MonitorGeometry>,
        primary: Option<(i32, i32)>,
    }

    impl DisplayMetricsProvider for FixedMetrics {
        fn monitors(&self) -> Result<Vec<MonitorGeometry>, GeometryError> {
            if self.monitors.is_empty() {
                return Err(GeometryError::NoMonitors);
            }
            Ok(self.monitors.clone())
        }

        fn primary_resolution(&self) -> Option<(i32, i32)> {
            self.primary
        }
    }

    fn monitor(x: i32, y: i32, width: i32, height: i32, is_primary: bool) -> MonitorGeometry {
        MonitorGeometry {
            bounds: Rect {
                x,
                y,
                width,
                height,
            },
            is_primary,
            scale_factor: 1.0,
            name: format!("monitor-{x}-{y}"),
        }
    }

    #[test]
    fn single_monitor_bounds_start_at_origin() {
        let provider = FixedMetrics {
            monitors: vec![monitor(0, 0, 1920, 1080, true)],
            primary: None,
        };
        let bounds = virtual_desktop_bounds(&provider).unwrap();
        assert_eq!(
            bounds,
            Rect {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn left_secondary_monitor_yields_negative_origin() {
        let provider = FixedMetrics {
            monitors: vec![
                monitor(0, 0, 2560, 1440, true),
                monitor(-1920, 0, 1920, 1440, false),
            ],
            primary: None,
        };
        let bounds = virtual_desktop_bounds(&provider).unwrap();
        assert_eq!(bounds.x, -1920);
        assert_eq!(bounds.y, 0);
        assert_eq!(bounds.width, 1920 + 2560);
        assert_eq!(bounds.height, 1440);
    }

    #[test]
    fn degenerate_union_falls_back_to_primary_resolution() {
        let provider = FixedMetrics {
            monitors: vec![monitor(0, 0, 0, 0, true)],
            primary: Some((1280, 720)),
        };
        let bounds = virtual_desktop_bounds(&provider).unwrap();
        assert_eq!(
            bounds,
            Rect {
                x: 0,
                y: 0,
                width: 1280,
                height: 720
            }
        );
    }

    #[test]
    fn degenerate_union_without_primary_is_an_error() {
        let provider = FixedMetrics {
            monitors: vec![monitor(0, 0, 0, 0, true)],
            primary: None,
        };
        assert!(matches!(
            virtual_desktop_bounds(&provider),
            Err(GeometryError::NoMonitors)
        ));
    }

    #[test]
    fn enumeration_failure_propagates() {
        let provider = FixedMetrics {
            monitors: vec![],
            primary: None,
        };
        assert!(matches!(
            virtual_desktop_bounds(&provider),
            Err(GeometryError::NoMonitors)
        ));
    }
}
