//! Geometry primitives shared across capture, selection, and display metrics.
//!
//! This module provides:
//! - `Point` for pointer positions in overlay or desktop coordinates
//! - `Rect` for capture regions in virtual-desktop coordinates
//!
//! Virtual-desktop coordinates may be negative: a monitor positioned left of
//! or above the primary puts the desktop origin below zero.

// ============================================================================
// Point
// ============================================================================

/// A pixel position. Negative coordinates are legal on multi-monitor desktops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle in pixel coordinates.
///
/// `width`/`height` describe extent, never direction; construction from a
/// drag normalizes so both are non-negative regardless of drag direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle with a guaranteed positive area.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            None
        } else {
            Some(Self {
                x,
                y,
                width,
                height,
            })
        }
    }

    /// Builds a rectangle from min/max bounds (inclusive min, exclusive max).
    pub fn from_min_max(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Option<Self> {
        let width = max_x - min_x;
        let height = max_y - min_y;
        Self::new(min_x, min_y, width, height)
    }

    /// Normalizes a drag gesture into a rectangle.
    ///
    /// The anchor is where the pointer went down; `pointer` is where it is
    /// now. Works for all four drag directions: the origin is the
    /// component-wise minimum and the extent the absolute delta. The result
    /// may have zero width or height (a click without movement), which
    /// callers filter before capture.
    pub fn from_drag(anchor: Point, pointer: Point) -> Self {
        let (x, width) = if pointer.x >= anchor.x {
            (anchor.x, pointer.x - anchor.x)
        } else {
            (pointer.x, anchor.x - pointer.x)
        };
        let (y, height) = if pointer.y >= anchor.y {
            (anchor.y, pointer.y - anchor.y)
        } else {
            (pointer.y, anchor.y - pointer.y)
        };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns this rectangle shifted by the given offset.
    ///
    /// Used to translate overlay-local selections into desktop coordinates
    /// by adding the overlay's desktop origin.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Intersects two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let min_x = self.x.max(other.x);
        let min_y = self.y.max(other.y);
        let max_x = self.right().min(other.right());
        let max_y = self.bottom().min(other.bottom());
        Rect::from_min_max(min_x, min_y, max_x, max_y)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns true if the rectangle has a positive area.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
