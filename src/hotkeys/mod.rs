//! Global hotkey bindings, registration, and event routing.
//!
//! The four bindings are fixed:
//! - `Ctrl+Alt+S` full screen, PNG flavour
//! - `Alt+S` region, PNG flavour
//! - `Ctrl+Alt+Q` full screen, clipboard image flavour
//! - `Alt+Q` region, clipboard image flavour
//!
//! PNG-flavoured actions honor the save-as-path setting; image-flavoured
//! actions always deliver a clipboard image. Registration is best effort:
//! combos another application already grabbed are reported and skipped,
//! and the tray menu stays available as a fallback trigger.

use std::fmt;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

mod backend;

pub use backend::GlobalHotkeyBackend;

/// Pause between unregistering old combos and registering new ones, giving
/// the display server time to release the grabs.
const REGISTER_SETTLE: Duration = Duration::from_millis(100);

/// Extra pause before a menu-driven re-registration.
const REREGISTER_SETTLE: Duration = Duration::from_millis(200);

/// What a triggered hotkey (or tray menu entry) should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    /// Whole virtual desktop, honoring the delivery setting.
    FullScreenPng,
    /// Interactive region, honoring the delivery setting.
    RegionPng,
    /// Whole virtual desktop, always a clipboard image.
    FullScreenImage,
    /// Interactive region, always a clipboard image.
    RegionImage,
}

impl HotkeyAction {
    /// Whether the action runs the interactive selection overlay.
    pub fn is_region(self) -> bool {
        matches!(self, HotkeyAction::RegionPng | HotkeyAction::RegionImage)
    }

    /// Whether the action overrides the save-as-path setting.
    pub fn forces_clipboard_image(self) -> bool {
        matches!(
            self,
            HotkeyAction::FullScreenImage | HotkeyAction::RegionImage
        )
    }
}

/// A modifier-plus-key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub ctrl: bool,
    pub alt: bool,
    /// Uppercase latin key cap.
    pub key: char,
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// The fixed binding table, in registration order.
pub const BINDINGS: [(KeyCombo, HotkeyAction); 4] = [
    (
        KeyCombo {
            ctrl: true,
            alt: true,
            key: 'S',
        },
        HotkeyAction::FullScreenPng,
    ),
    (
        KeyCombo {
            ctrl: false,
            alt: true,
            key: 'S',
        },
        HotkeyAction::RegionPng,
    ),
    (
        KeyCombo {
            ctrl: true,
            alt: true,
            key: 'Q',
        },
        HotkeyAction::FullScreenImage,
    ),
    (
        KeyCombo {
            ctrl: false,
            alt: true,
            key: 'Q',
        },
        HotkeyAction::RegionImage,
    ),
];

/// Look up the action bound to a combo.
pub fn action_for(combo: KeyCombo) -> Option<HotkeyAction> {
    BINDINGS
        .iter()
        .find(|(bound, _)| *bound == combo)
        .map(|(_, action)| *action)
}

/// Errors raised by the hotkey backend.
#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("hotkey backend unavailable: {0}")]
    Backend(String),

    #[error("failed to register {combo}: {reason}")]
    Registration { combo: KeyCombo, reason: String },
}

/// Platform layer the router drives, kept behind a trait so registration
/// and routing logic can run against a scripted backend in tests.
pub trait HotkeyBackend: Send {
    fn register(&mut self, combo: KeyCombo) -> Result<(), HotkeyError>;
    fn unregister(&mut self, combo: KeyCombo);
    /// Next pressed combo, if any. Never blocks.
    fn poll(&mut self) -> Option<KeyCombo>;
    /// Discard queued presses, e.g. those accumulated behind an overlay.
    fn drain(&mut self);
}

/// Outcome of one registration pass.
#[derive(Debug)]
pub struct RegistrationReport {
    failures: Vec<(KeyCombo, String)>,
}

impl RegistrationReport {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[(KeyCombo, String)] {
        &self.failures
    }

    /// Notification body listing every binding, shown when all four took.
    pub fn ready_body() -> String {
        format!(
            "PNG: {} / {}\nImage: {} / {}",
            BINDINGS[0].0, BINDINGS[1].0, BINDINGS[2].0, BINDINGS[3].0
        )
    }

    /// Notification body naming each failed combo.
    pub fn failure_body(&self) -> String {
        let mut body = String::new();
        for (combo, _) in &self.failures {
            body.push_str(&format!("{} failed. ", combo));
        }
        body.push_str("Use tray menu.");
        body
    }
}

/// Owns the binding lifecycle: registration passes and event routing.
pub struct HotkeyRouter<B: HotkeyBackend> {
    backend: B,
    registered: Vec<KeyCombo>,
    settle: Duration,
    menu_settle: Duration,
}

impl<B: HotkeyBackend> HotkeyRouter<B> {
    pub fn new(backend: B) -> Self {
        Self::with_settle(backend, REGISTER_SETTLE, REREGISTER_SETTLE)
    }

    /// Router with explicit settle pauses; tests pass `Duration::ZERO`.
    pub fn with_settle(backend: B, settle: Duration, menu_settle: Duration) -> Self {
        Self {
            backend,
            registered: Vec::new(),
            settle,
            menu_settle,
        }
    }

    /// Unregister everything we hold, wait for the grabs to clear, then
    /// register the full binding table. Failures are collected, not fatal.
    pub fn register_all(&mut self) -> RegistrationReport {
        for combo in std::mem::take(&mut self.registered) {
            self.backend.unregister(combo);
        }
        thread::sleep(self.settle);

        let mut failures = Vec::new();
        for (combo, action) in BINDINGS {
            match self.backend.register(combo) {
                Ok(()) => {
                    info!("Registered {combo} for {action:?}");
                    self.registered.push(combo);
                }
                Err(err) => {
                    warn!("Failed to register {combo}: {err}");
                    failures.push((combo, err.to_string()));
                }
            }
        }
        RegistrationReport { failures }
    }

    /// Menu-driven re-registration, with a longer settle so a combo the
    /// user just released has time to clear.
    pub fn reregister(&mut self) -> RegistrationReport {
        thread::sleep(self.menu_settle);
        self.register_all()
    }

    /// Next pending action, if a bound combo was pressed.
    pub fn poll_action(&mut self) -> Option<HotkeyAction> {
        loop {
            let combo = self.backend.poll()?;
            match action_for(combo) {
                Some(action) => return Some(action),
                None => warn!("Ignoring press of unbound combo {combo}"),
            }
        }
    }

    /// Discard presses queued while a selection overlay was up.
    pub fn drain(&mut self) {
        self.backend.drain();
    }
}
