//! Library exports for reusing traysnap subsystems.
//!
//! Exposes the capture pipeline, selection state machine, and configuration
//! types alongside the supporting modules they rely on so that integration
//! tests and external tooling can exercise them without the tray daemon.

pub mod capture;
pub mod config;
pub mod geometry;
pub mod hotkeys;
pub mod selection;
pub mod util;

pub use config::Config;
