//! Transactional hotkey registration over `global_hotkey::GlobalHotKeyManager`.
//!
//! A refresh first tears down every currently-registered binding, then
//! registers the new filtered set, so a mid-refresh failure never leaves two
//! conflicting generations of hotkeys active at once.

use std::collections::HashMap;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::GlobalHotKeyManager;

use super::parser::{self, MOD_COMMAND, MOD_CONTROL, MOD_OPTION, MOD_SHIFT};
use crate::error::{DaemonError, Result};
use crate::key_pipeline::HotkeyBinding;

fn code_for_keycode(keycode: u16) -> Option<Code> {
    Some(match keycode {
        0 => Code::KeyA, 1 => Code::KeyS, 2 => Code::KeyD, 3 => Code::KeyF, 4 => Code::KeyH,
        5 => Code::KeyG, 6 => Code::KeyZ, 7 => Code::KeyX, 8 => Code::KeyC, 9 => Code::KeyV,
        11 => Code::KeyB, 12 => Code::KeyQ, 13 => Code::KeyW, 14 => Code::KeyE, 15 => Code::KeyR,
        16 => Code::KeyY, 17 => Code::KeyT, 31 => Code::KeyO, 32 => Code::KeyU, 34 => Code::KeyI,
        35 => Code::KeyP, 37 => Code::KeyL, 38 => Code::KeyJ, 40 => Code::KeyK, 45 => Code::KeyN,
        46 => Code::KeyM,
        18 => Code::Digit1, 19 => Code::Digit2, 20 => Code::Digit3, 21 => Code::Digit4,
        23 => Code::Digit5, 22 => Code::Digit6, 26 => Code::Digit7, 28 => Code::Digit8,
        25 => Code::Digit9, 29 => Code::Digit0,
        49 => Code::Space,
        36 => Code::Enter,
        53 => Code::Escape,
        48 => Code::Tab,
        51 => Code::Backspace,
        123 => Code::ArrowLeft,
        124 => Code::ArrowRight,
        125 => Code::ArrowDown,
        126 => Code::ArrowUp,
        122 => Code::F1, 120 => Code::F2, 99 => Code::F3, 118 => Code::F4, 96 => Code::F5,
        97 => Code::F6, 98 => Code::F7, 100 => Code::F8, 101 => Code::F9, 109 => Code::F10,
        103 => Code::F11, 111 => Code::F12,
        _ => return None,
    })
}

fn modifiers_for_mask(mask: u8) -> Modifiers {
    let mut mods = Modifiers::empty();
    if mask & MOD_SHIFT != 0 {
        mods |= Modifiers::SHIFT;
    }
    if mask & MOD_CONTROL != 0 {
        mods |= Modifiers::CONTROL;
    }
    if mask & MOD_OPTION != 0 {
        mods |= Modifiers::ALT;
    }
    if mask & MOD_COMMAND != 0 {
        mods |= Modifiers::META;
    }
    mods
}

struct Registered {
    binding: HotkeyBinding,
    action: String,
    hotkey: HotKey,
}

/// Owns the live hotkey set. `refresh` is the only mutating entry point
/// callers should use in steady state; it is transactional (unregister old,
/// then register new).
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    registered: Vec<Registered>,
}

impl HotkeyManager {
    pub fn new() -> Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| DaemonError::Activation(format!("failed to create hotkey manager: {e}")))?;
        Ok(Self {
            manager,
            registered: Vec::new(),
        })
    }

    /// Replace the active set with `bindings` (hotkey spec string -> action
    /// string). The caller is expected to have already filtered out entries
    /// for the currently-excluded focused app.
    pub fn refresh(&mut self, bindings: &HashMap<String, String>) -> Result<()> {
        self.unregister_all();

        for (spec, action) in bindings {
            let binding = parser::parse_shortcut(spec)
                .map_err(|e| DaemonError::Config(format!("{spec}: {e}")))?;
            let code = code_for_keycode(binding.keycode)
                .ok_or_else(|| DaemonError::Config(format!("unsupported key in hotkey {spec}")))?;
            let hotkey = HotKey::new(Some(modifiers_for_mask(binding.modifier_mask)), code);

            self.manager
                .register(hotkey)
                .map_err(|e| DaemonError::Activation(format!("failed to register {spec}: {e}")))?;

            self.registered.push(Registered {
                binding,
                action: action.clone(),
                hotkey,
            });
        }
        Ok(())
    }

    pub fn unregister_all(&mut self) {
        for r in self.registered.drain(..) {
            let _ = self.manager.unregister(r.hotkey);
        }
    }

    pub fn action_for(&self, id: u32) -> Option<&str> {
        self.registered
            .iter()
            .find(|r| r.hotkey.id() == id)
            .map(|r| r.action.as_str())
    }

    pub fn bindings(&self) -> Vec<HotkeyBinding> {
        self.registered.iter().map(|r| r.binding).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_for_keycode_covers_letters_and_specials() {
        assert_eq!(code_for_keycode(0), Some(Code::KeyA));
        assert_eq!(code_for_keycode(49), Some(Code::Space));
        assert_eq!(code_for_keycode(9999), None);
    }

    #[test]
    fn modifiers_for_mask_combines_bits() {
        let mods = modifiers_for_mask(MOD_COMMAND | MOD_SHIFT);
        assert!(mods.contains(Modifiers::META));
        assert!(mods.contains(Modifiers::SHIFT));
        assert!(!mods.contains(Modifiers::CONTROL));
    }
}
