//! Single-instance enforcement via an advisory file lock.
//!
//! The tray daemon takes an exclusive lock on a file in the user's runtime
//! directory. A second launch fails to take the lock and exits instead of
//! fighting over the hotkey registrations.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

const LOCK_FILE_NAME: &str = "traysnap.lock";

/// Held for the lifetime of the daemon; the lock is released on drop.
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Try to become the single running instance.
    ///
    /// Returns `Ok(None)` when another process already holds the lock.
    pub fn acquire() -> Result<Option<Self>> {
        Self::acquire_at(lock_path())
    }

    fn acquire_at(path: PathBuf) -> Result<Option<Self>> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                log::debug!("Lock held by another instance: {}", path.display());
                return Ok(None);
            }
            return Err(e)
                .with_context(|| format!("Failed to lock instance file: {}", path.display()));
        }

        // Record our pid for diagnostics; stale contents are harmless since
        // only the lock itself is authoritative.
        file.set_len(0)
            .with_context(|| format!("Failed to truncate lock file: {}", path.display()))?;
        writeln!(file, "{}", std::process::id())
            .with_context(|| format!("Failed to write pid to lock file: {}", path.display()))?;

        log::debug!("Acquired instance lock: {}", path.display());
        Ok(Some(Self { file, path }))
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        self.file.unlock().unwrap_or_else(|e| {
            log::warn!("Failed to unlock {}: {}", self.path.display(), e);
        });
    }
}

fn lock_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::state_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(LOCK_FILE_NAME)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let held = InstanceLock::acquire_at(path.clone()).unwrap();
        assert!(held.is_some());

        let second = InstanceLock::acquire_at(path).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let held = InstanceLock::acquire_at(path.clone()).unwrap();
        drop(held);

        let reacquired = InstanceLock::acquire_at(path).unwrap();
        assert!(reacquired.is_some());
    }

    #[test]
    fn lock_file_records_pid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let _held = InstanceLock::acquire_at(path.clone()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim().parse::<u32>().unwrap(), std::process::id());
    }
}
