//! Interactive region selection.
//!
//! This module provides:
//! - A pure drag-selection state machine ([`state`])
//! - Cairo frame composition for the dimmed overlay ([`render`], private)
//! - The fullscreen minifb overlay session ([`select_region`])
//! - A guard ensuring at most one selection session at a time

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

mod overlay;
mod render;
pub mod state;

pub use overlay::select_region;
pub use state::{SelectionEvent, SelectionPhase, SelectionState};

use crate::capture::CaptureError;
use crate::geometry::GeometryError;

/// Errors that can occur while running a selection session.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Monitor layout unavailable: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Failed to freeze the desktop: {0}")]
    Capture(#[from] CaptureError),

    #[error("Overlay window error: {0}")]
    Window(#[from] minifb::Error),

    #[error("Overlay rendering failed: {0}")]
    Render(#[from] cairo::Error),

    #[error("Overlay surface access failed: {0}")]
    Surface(#[from] cairo::BorrowError),
}

/// RAII guard keeping selection sessions exclusive.
///
/// A hotkey or tray action arriving while an overlay is already up must be
/// dropped, not queued; the guard's lifetime marks the busy window.
pub struct SessionGuard {
    flag: Arc<AtomicBool>,
}

impl SessionGuard {
    /// Claim the session slot. Returns `None` when a session is already
    /// running.
    pub fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(Self {
                flag: Arc::clone(flag),
            })
        } else {
            None
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
