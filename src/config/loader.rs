//! Config search-path resolution and per-section-fallback TOML loading.
//! A malformed section logs a warning and falls back to that section's
//! defaults rather than rejecting the whole file.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::types::Config;

pub const ENV_CONFIG_PATH: &str = "MOUSE_HINTER_CONFIG";

/// `$MOUSE_HINTER_CONFIG` -> `$XDG_CONFIG_HOME/mouse-hinter/config.toml` ->
/// `~/.config/mouse-hinter/config.toml`. Returns `None` only if none of
/// those can be resolved (e.g. no home directory).
pub fn search_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(explicit));
    }
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("mouse-hinter").join("config.toml"));
    }
    dirs::home_dir().map(|home| home.join(".config").join("mouse-hinter").join("config.toml"))
}

/// Resolves the search path, loads it if present, and falls back to
/// built-in defaults on a missing file or parse failure. Returns the path
/// that was consulted (even if it didn't exist) so callers can surface it
/// via `status`/`config` IPC responses.
pub fn load() -> (Config, Option<PathBuf>) {
    let Some(path) = search_path() else {
        return (Config::default(), None);
    };
    if !path.exists() {
        return (Config::default(), None);
    }
    match load_from_path(&path) {
        Ok(config) => (config, Some(path)),
        Err(err) => {
            warn!(target: "CONFIG", error = %err, path = %path.display(), "failed to parse config file, using defaults");
            (Config::default(), Some(path))
        }
    }
}

pub fn load_from_path(path: &Path) -> Result<Config, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    parse(&text)
}

fn parse_section<T>(root: &toml::Value, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match root.get(key) {
        Some(value) => match value.clone().try_into::<T>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(target: "CONFIG", section = key, error = %err, "malformed config section, using defaults");
                T::default()
            }
        },
        None => T::default(),
    }
}

pub fn parse(text: &str) -> Result<Config, String> {
    let root: toml::Value = text.parse().map_err(|e: toml::de::Error| e.to_string())?;

    let hotkeys = root
        .get("hotkeys")
        .and_then(|v| v.clone().try_into::<HashMap<String, String>>().ok())
        .unwrap_or_else(|| {
            if root.get("hotkeys").is_some() {
                warn!(target: "CONFIG", section = "hotkeys", "malformed hotkeys table, using defaults");
            }
            Config::default().hotkeys
        });

    let excluded_bundle_ids = root
        .get("excluded_bundle_ids")
        .and_then(|v| v.clone().try_into::<Vec<String>>().ok())
        .unwrap_or_default();

    Ok(Config {
        general: parse_section(&root, "general"),
        hints: parse_section(&root, "hints"),
        grid: parse_section(&root, "grid"),
        scroll: parse_section(&root, "scroll"),
        action: parse_section(&root, "action"),
        hotkeys,
        excluded_bundle_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_partial_toml_falling_back_per_section() {
        let text = r#"
            [general]
            restore_cursor_position = false

            [hints]
            hint_characters = "abc"
        "#;
        let config = parse(text).unwrap();
        assert!(!config.general.restore_cursor_position);
        assert_eq!(config.hints.hint_characters, "abc");
        assert!(config.grid.enabled);
    }

    #[test]
    fn parses_per_bundle_additional_ax_support() {
        let text = r#"
            [hints.additional_ax_support]
            "com.example.app" = ["AXCustomButton"]
        "#;
        let config = parse(text).unwrap();
        assert_eq!(
            config.hints.additional_ax_support.get("com.example.app"),
            Some(&vec!["AXCustomButton".to_string()])
        );
    }

    #[test]
    fn malformed_section_falls_back_to_defaults() {
        let text = r#"
            [scroll]
            scroll_step = "not a number"
        "#;
        let config = parse(text).unwrap();
        assert_eq!(config.scroll.scroll_step, super::super::defaults::SCROLL_STEP);
    }

    #[test]
    fn load_from_path_reads_a_real_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general]\nrestore_cursor_position = false").unwrap();
        let config = load_from_path(file.path()).unwrap();
        assert!(!config.general.restore_cursor_position);
    }

    #[test]
    fn search_path_prefers_explicit_env_var() {
        let guard = std::env::var(ENV_CONFIG_PATH).ok();
        std::env::set_var(ENV_CONFIG_PATH, "/tmp/explicit-config.toml");
        assert_eq!(search_path(), Some(PathBuf::from("/tmp/explicit-config.toml")));
        match guard {
            Some(v) => std::env::set_var(ENV_CONFIG_PATH, v),
            None => std::env::remove_var(ENV_CONFIG_PATH),
        }
    }
}
