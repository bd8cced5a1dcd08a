//! Production hotkey backend on top of the `global-hotkey` crate.

use std::collections::HashMap;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use log::warn;

use super::{HotkeyBackend, HotkeyError, KeyCombo};

/// System-wide hotkey grabs via `global-hotkey`.
///
/// The manager must stay alive for the grabs to hold, so the backend owns
/// it for the daemon's lifetime. Creation fails on display servers without
/// a global shortcut facility; callers treat that as a degraded state and
/// fall back to the tray menu.
pub struct GlobalHotkeyBackend {
    manager: GlobalHotKeyManager,
    ids: HashMap<u32, KeyCombo>,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Result<Self, HotkeyError> {
        let manager =
            GlobalHotKeyManager::new().map_err(|err| HotkeyError::Backend(err.to_string()))?;
        Ok(Self {
            manager,
            ids: HashMap::new(),
        })
    }

    fn to_hotkey(combo: KeyCombo) -> Result<HotKey, HotkeyError> {
        let mut modifiers = Modifiers::empty();
        if combo.ctrl {
            modifiers |= Modifiers::CONTROL;
        }
        if combo.alt {
            modifiers |= Modifiers::ALT;
        }
        let code = match combo.key {
            'S' => Code::KeyS,
            'Q' => Code::KeyQ,
            other => {
                return Err(HotkeyError::Backend(format!(
                    "no key code mapping for '{other}'"
                )));
            }
        };
        Ok(HotKey::new(Some(modifiers), code))
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn register(&mut self, combo: KeyCombo) -> Result<(), HotkeyError> {
        let hotkey = Self::to_hotkey(combo)?;
        self.manager
            .register(hotkey)
            .map_err(|err| HotkeyError::Registration {
                combo,
                reason: err.to_string(),
            })?;
        self.ids.insert(hotkey.id(), combo);
        Ok(())
    }

    fn unregister(&mut self, combo: KeyCombo) {
        let Ok(hotkey) = Self::to_hotkey(combo) else {
            return;
        };
        if let Err(err) = self.manager.unregister(hotkey) {
            warn!("Failed to unregister {combo}: {err}");
        }
        self.ids.remove(&hotkey.id());
    }

    fn poll(&mut self) -> Option<KeyCombo> {
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.state() != HotKeyState::Pressed {
                continue;
            }
            match self.ids.get(&event.id()) {
                Some(combo) => return Some(*combo),
                None => warn!("Hotkey event for unknown id {}", event.id()),
            }
        }
        None
    }

    fn drain(&mut self) {
        let mut discarded = 0usize;
        while GlobalHotKeyEvent::receiver().try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            log::debug!("Discarded {discarded} queued hotkey event(s)");
        }
    }
}
