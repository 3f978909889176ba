//! Configuration entity: one struct per section, all `Deserialize` with
//! per-field defaults so a TOML file only has to name what it overrides.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub restore_cursor_position: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            restore_cursor_position: defaults::RESTORE_CURSOR_POSITION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HintsConfig {
    pub enabled: bool,
    pub hint_characters: String,
    pub clickable_roles: Vec<String>,
    pub role_overrides: HashMap<String, Vec<String>>,
    pub include_menubar_hints: bool,
    pub include_dock_hints: bool,
    pub include_notification_center_hints: bool,
    pub additional_menubar_hints_targets: Vec<String>,
    /// Per-bundle extra accessibility roles to probe on top of
    /// `clickable_roles`/`role_overrides`, for apps whose AX tree exposes
    /// clickable elements under non-standard roles.
    pub additional_ax_support: HashMap<String, Vec<String>>,
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hint_characters: defaults::HINT_CHARACTERS.to_string(),
            clickable_roles: defaults::clickable_roles(),
            role_overrides: HashMap::new(),
            include_menubar_hints: false,
            include_dock_hints: false,
            include_notification_center_hints: false,
            additional_menubar_hints_targets: Vec::new(),
            additional_ax_support: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub enabled: bool,
    pub characters: String,
    pub sublayer_keys: String,
    pub hide_unmatched: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            characters: defaults::HINT_CHARACTERS.to_string(),
            sublayer_keys: defaults::HINT_CHARACTERS.to_string(),
            hide_unmatched: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub scroll_step: f64,
    pub scroll_step_half: f64,
    pub scroll_step_full: f64,
    pub highlight_scroll_area: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            scroll_step: defaults::SCROLL_STEP,
            scroll_step_half: defaults::SCROLL_STEP_HALF,
            scroll_step_full: defaults::SCROLL_STEP_FULL,
            highlight_scroll_area: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Translated-key string (e.g. `"f"`) -> action name (e.g. `"left_click"`).
    pub bindings: HashMap<String, String>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            bindings: defaults::action_bindings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub hints: HintsConfig,
    pub grid: GridConfig,
    pub scroll: ScrollConfig,
    pub action: ActionConfig,
    /// Hotkey spec string (e.g. `"Cmd+Shift+Space"`) -> action string.
    pub hotkeys: HashMap<String, String>,
    pub excluded_bundle_ids: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            hints: HintsConfig::default(),
            grid: GridConfig::default(),
            scroll: ScrollConfig::default(),
            action: ActionConfig::default(),
            hotkeys: defaults::hotkeys(),
            excluded_bundle_ids: Vec::new(),
        }
    }
}
