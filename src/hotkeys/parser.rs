//! Hotkey binding-syntax parser: `"Mod1+Mod2+Key"` into the platform-facing
//! `(modifier_mask, keycode)` pair already used by `key_pipeline`, plus the
//! action-string grammar (mode name, action name, `exec <cmd>`).

use std::fmt;

use crate::key_pipeline::HotkeyBinding;

pub const MOD_SHIFT: u8 = 0b0001;
pub const MOD_CONTROL: u8 = 0b0010;
pub const MOD_OPTION: u8 = 0b0100;
pub const MOD_COMMAND: u8 = 0b1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyAction {
    Mode(String),
    Action(String),
    Exec(String),
}

fn key_to_code(key: &str) -> Option<u16> {
    Some(match key {
        "a" => 0, "s" => 1, "d" => 2, "f" => 3, "h" => 4, "g" => 5, "z" => 6, "x" => 7, "c" => 8,
        "v" => 9, "b" => 11, "q" => 12, "w" => 13, "e" => 14, "r" => 15, "y" => 16, "t" => 17,
        "o" => 31, "u" => 32, "i" => 34, "p" => 35, "l" => 37, "j" => 38, "k" => 40, "n" => 45,
        "m" => 46,
        "1" => 18, "2" => 19, "3" => 20, "4" => 21, "5" => 23, "6" => 22, "7" => 26, "8" => 28,
        "9" => 25, "0" => 29,
        "space" => 49,
        "return" | "enter" => 36,
        "escape" => 53,
        "tab" => 48,
        "delete" | "backspace" => 51,
        "left" => 123,
        "right" => 124,
        "down" => 125,
        "up" => 126,
        "f1" => 122, "f2" => 120, "f3" => 99, "f4" => 118, "f5" => 96, "f6" => 97,
        "f7" => 98, "f8" => 100, "f9" => 101, "f10" => 109, "f11" => 103, "f12" => 111,
        _ => return None,
    })
}

/// Parse `"Cmd+Shift+Space"` into a `HotkeyBinding`. Modifier tokens are
/// case-insensitive and may appear in any order; exactly one non-modifier
/// token (the key) is required.
pub fn parse_shortcut(spec: &str) -> Result<HotkeyBinding, ParseError> {
    let parts: Vec<&str> = spec.split('+').map(str::trim).filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        return Err(ParseError("empty hotkey spec".to_string()));
    }

    let mut mask = 0u8;
    let mut key_code = None;
    for part in &parts {
        match part.to_ascii_lowercase().as_str() {
            "cmd" | "command" => mask |= MOD_COMMAND,
            "ctrl" | "control" => mask |= MOD_CONTROL,
            "alt" | "option" => mask |= MOD_OPTION,
            "shift" => mask |= MOD_SHIFT,
            other => {
                if key_code.is_some() {
                    return Err(ParseError(format!("multiple keys in hotkey spec: {spec}")));
                }
                key_code = Some(
                    key_to_code(other).ok_or_else(|| ParseError(format!("unrecognised key: {other}")))?,
                );
            }
        }
    }

    let keycode = key_code.ok_or_else(|| ParseError(format!("hotkey spec has no key: {spec}")))?;
    Ok(HotkeyBinding { keycode, modifier_mask: mask })
}

/// Canonical string form, used as a stable map key regardless of how the
/// user ordered modifiers in the config file.
pub fn normalize_shortcut(spec: &str) -> Result<String, ParseError> {
    let binding = parse_shortcut(spec)?;
    Ok(format!("{}:{}", binding.modifier_mask, binding.keycode))
}

/// Parse the action-string grammar: a mode name, an action name, or
/// `exec <shell-command>`.
pub fn parse_action(spec: &str) -> HotkeyAction {
    let trimmed = spec.trim();
    if let Some(cmd) = trimmed.strip_prefix("exec ") {
        return HotkeyAction::Exec(cmd.trim().to_string());
    }
    match trimmed {
        "hints" | "grid" | "idle" => HotkeyAction::Mode(trimmed.to_string()),
        other => HotkeyAction::Action(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifiers_and_key_in_any_order() {
        let a = parse_shortcut("Cmd+Shift+Space").unwrap();
        let b = parse_shortcut("Space+Shift+Cmd").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.keycode, 49);
        assert_eq!(a.modifier_mask, MOD_COMMAND | MOD_SHIFT);
    }

    #[test]
    fn rejects_unknown_key_and_multiple_keys() {
        assert!(parse_shortcut("Cmd+Whatever").is_err());
        assert!(parse_shortcut("A+B").is_err());
        assert!(parse_shortcut("Cmd+Shift").is_err());
    }

    #[test]
    fn parses_mode_action_and_exec() {
        assert_eq!(parse_action("hints"), HotkeyAction::Mode("hints".to_string()));
        assert_eq!(parse_action("left_click"), HotkeyAction::Action("left_click".to_string()));
        assert_eq!(
            parse_action("exec open -a Terminal"),
            HotkeyAction::Exec("open -a Terminal".to_string())
        );
    }
}
