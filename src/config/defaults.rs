//! Built-in defaults applied when a field is absent from the config file
//! or the file itself is absent.

use std::collections::HashMap;

use crate::hint::HintGenerator;

pub const HINT_CHARACTERS: &str = HintGenerator::DEFAULT_ALPHABET;
pub const RESTORE_CURSOR_POSITION: bool = true;
pub const SCROLL_STEP: f64 = 60.0;
pub const SCROLL_STEP_HALF: f64 = 400.0;
pub const SCROLL_STEP_FULL: f64 = 2000.0;

pub fn clickable_roles() -> Vec<String> {
    ["AXButton", "AXLink", "AXMenuItem", "AXCheckBox", "AXRadioButton", "AXTextField"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn action_bindings() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("f".to_string(), "left_click".to_string());
    map.insert("d".to_string(), "right_click".to_string());
    map
}

pub fn hotkeys() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("Cmd+Shift+Space".to_string(), "hints".to_string());
    map.insert("Cmd+Shift+G".to_string(), "grid".to_string());
    map
}
