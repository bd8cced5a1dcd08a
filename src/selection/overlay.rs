//! Fullscreen selection overlay.
//!
//! The overlay freezes the desktop into a snapshot, opens a borderless
//! topmost window covering the whole virtual desktop, and drives the
//! selection machine from polled pointer and key state. Commits are
//! translated back into desktop coordinates, and the window is torn down
//! before the caller re-captures so the dimmed frame never ends up in the
//! screenshot.

use std::thread;
use std::time::Duration;

use log::{debug, info};
use minifb::{CursorStyle, Key, MouseButton, MouseMode, Window, WindowOptions};

use super::SelectionError;
use super::render::OverlayScene;
use super::state::{SelectionEvent, SelectionPhase, SelectionState};
use crate::capture::ScreenCapturer;
use crate::geometry::{self, DisplayMetricsProvider};
use crate::util::{Point, Rect};

const OVERLAY_TITLE: &str = "traysnap selection";
const OVERLAY_FPS: usize = 60;

/// How long to wait after tearing the overlay down before the caller may
/// re-capture. The compositor needs a moment to unmap the window.
const UNMAP_SETTLE: Duration = Duration::from_millis(150);

/// Run one interactive region selection over the whole virtual desktop.
///
/// Returns the committed rectangle in desktop coordinates, or `None` when
/// the user cancelled (Escape, a micro-drag, or closing the overlay).
pub fn select_region(
    metrics: &dyn DisplayMetricsProvider,
    capturer: &dyn ScreenCapturer,
) -> Result<Option<Rect>, SelectionError> {
    let bounds = geometry::virtual_desktop_bounds(metrics)?;
    let snapshot = capturer.capture(bounds)?;
    let mut scene = OverlayScene::new(&snapshot)?;

    let mut window = Window::new(
        OVERLAY_TITLE,
        scene.width(),
        scene.height(),
        WindowOptions {
            borderless: true,
            title: false,
            resize: false,
            topmost: true,
            ..Default::default()
        },
    )?;
    window.set_position(bounds.x as isize, bounds.y as isize);
    window.set_cursor_style(CursorStyle::Crosshair);
    window.set_target_fps(OVERLAY_FPS);

    debug!(
        "Selection overlay opened at ({}, {}) sized {}x{}",
        bounds.x, bounds.y, bounds.width, bounds.height
    );

    let mut machine = SelectionState::new();
    let mut frame: Vec<u32> = Vec::new();
    let mut was_down = false;

    while window.is_open() && !machine.is_terminal() {
        if machine.take_redraw() {
            frame = scene.render(machine.drag_rect().filter(|r| r.is_valid()))?;
        }
        window.update_with_buffer(&frame, scene.width(), scene.height())?;

        if window.is_key_down(Key::Escape) {
            machine.handle(SelectionEvent::Cancel);
        }

        let down = window.get_mouse_down(MouseButton::Left);
        if let Some((x, y)) = window.get_mouse_pos(MouseMode::Clamp) {
            let point = Point::new(x as i32, y as i32);
            if down && !was_down {
                machine.handle(SelectionEvent::PointerDown(point));
            } else if down {
                machine.handle(SelectionEvent::PointerMove(point));
            } else if was_down {
                machine.handle(SelectionEvent::PointerUp(point));
            }
        }
        was_down = down;
    }

    let committed = match machine.phase() {
        SelectionPhase::Committed(rect) => {
            let desktop_rect = rect.translated(bounds.x, bounds.y);
            info!(
                "Selection committed: {}x{} at ({}, {})",
                desktop_rect.width, desktop_rect.height, desktop_rect.x, desktop_rect.y
            );
            Some(desktop_rect)
        }
        _ => {
            info!("Selection cancelled");
            None
        }
    };

    drop(window);
    thread::sleep(UNMAP_SETTLE);

    Ok(committed)
}
