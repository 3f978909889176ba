//! KeyPipeline: translates raw key-down events from the platform's
//! low-level tap into the daemon's key model, gates hotkey pass-through,
//! and dispatches the translated key against the current mode's router.
//!
//! Everything here runs synchronously on the main loop; there is no
//! cooperative suspension inside the dispatch.

use std::collections::HashMap;

use crate::grid::Grid;
use crate::hint::Hint;
use crate::hint_collection::HintCollection;
use crate::mode::Mode;
use crate::platform::RawKeyEvent;
use crate::router::{GridPoint, GridRouter, HintRouter, RouterOutcome, BACKSPACE, ESCAPE};
use crate::scroll::{parse_scroll_key, ScrollOp};

pub const KEYCODE_BACKSPACE: u16 = 51;
pub const KEYCODE_ESCAPE: u16 = 53;
pub const KEYCODE_TAB: u16 = 48;

/// A registered application hotkey, as matched against raw (keycode,
/// modifier) pairs in step 1 of the pipeline policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub keycode: u16,
    pub modifier_mask: u8,
}

fn base_char(keycode: u16) -> Option<char> {
    Some(match keycode {
        0 => 'a',
        1 => 's',
        2 => 'd',
        3 => 'f',
        4 => 'h',
        5 => 'g',
        6 => 'z',
        7 => 'x',
        8 => 'c',
        9 => 'v',
        11 => 'b',
        12 => 'q',
        13 => 'w',
        14 => 'e',
        15 => 'r',
        16 => 'y',
        17 => 't',
        31 => 'o',
        32 => 'u',
        34 => 'i',
        35 => 'p',
        37 => 'l',
        38 => 'j',
        40 => 'k',
        45 => 'n',
        46 => 'm',
        49 => ' ',
        18 => '1',
        19 => '2',
        20 => '3',
        21 => '4',
        23 => '5',
        22 => '6',
        26 => '7',
        28 => '8',
        25 => '9',
        29 => '0',
        _ => return None,
    })
}

/// Stable US-layout translation: special codes first, then the base-char
/// table with shift/control applied. Returns `None` for keys the daemon
/// has no use for (caps-lock is ignored per spec, never consulted here).
pub fn translate(event: RawKeyEvent) -> Option<String> {
    match event.keycode {
        KEYCODE_BACKSPACE => return Some(BACKSPACE.to_string()),
        KEYCODE_ESCAPE => return Some(ESCAPE.to_string()),
        KEYCODE_TAB => return Some("\t".to_string()),
        _ => {}
    }

    let base = base_char(event.keycode)?;
    if event.control {
        return match base {
            'd' => Some(crate::scroll::CTRL_D.to_string()),
            'u' => Some(crate::scroll::CTRL_U.to_string()),
            _ => None,
        };
    }
    let ch = if event.shift { base.to_ascii_uppercase() } else { base };
    Some(ch.to_string())
}

pub fn hotkey_matches(event: RawKeyEvent, hotkeys: &[HotkeyBinding]) -> bool {
    hotkeys
        .iter()
        .any(|h| h.keycode == event.keycode && h.modifier_mask == event.modifier_mask())
}

/// What the Coordinator should do with one dispatched key. `KeyPipeline`
/// never returns an error: unmatched input is `Dropped`.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome<H> {
    PassThrough,
    Dropped,
    Tab,
    ExitToIdle,
    ActionKey(String),
    Hint(RouterOutcome<Hint<H>>),
    Grid(RouterOutcome<GridPoint>),
    Scroll(Option<ScrollOp>),
}

/// Owns the per-activation router state (hint/grid accumulators); the
/// Coordinator rebuilds a fresh `KeyPipeline` on each Hints/Grid activation
/// (or calls `reset_*` when re-arming after an `Exact` hit).
pub struct KeyPipeline<H: Clone> {
    hint_router: HintRouter<H>,
    grid_router: GridRouter,
}

impl<H: Clone> KeyPipeline<H> {
    pub fn new(sublayer_keys: impl Into<String>) -> Self {
        Self {
            hint_router: HintRouter::new(),
            grid_router: GridRouter::new(sublayer_keys),
        }
    }

    pub fn reset_hint_router(&mut self) {
        self.hint_router.reset();
    }

    /// One raw event through the full pipeline policy. `action_bindings`
    /// maps a translated key string to a configured action name, consulted
    /// only while `action_sub` is set.
    pub fn handle_event(
        &mut self,
        event: RawKeyEvent,
        hotkeys: &[HotkeyBinding],
        mode: Mode,
        action_sub: bool,
        scroll_last_key: &str,
        action_bindings: &HashMap<String, String>,
        hints: Option<&HintCollection<H>>,
        grid: Option<&Grid>,
    ) -> (KeyOutcome<H>, String) {
        if hotkey_matches(event, hotkeys) {
            return (KeyOutcome::PassThrough, scroll_last_key.to_string());
        }

        let Some(key) = translate(event) else {
            return (KeyOutcome::Dropped, scroll_last_key.to_string());
        };

        match mode {
            Mode::Idle => {
                if key == ESCAPE {
                    return (KeyOutcome::Dropped, String::new());
                }
                let (op, new_last, recognised) = parse_scroll_key(&key, scroll_last_key);
                if recognised {
                    (KeyOutcome::Scroll(op), new_last)
                } else {
                    (KeyOutcome::Dropped, String::new())
                }
            }
            Mode::Hints | Mode::Grid => {
                if key == "\t" {
                    return (KeyOutcome::Tab, scroll_last_key.to_string());
                }
                if key == ESCAPE {
                    self.hint_router.reset();
                    return (KeyOutcome::ExitToIdle, scroll_last_key.to_string());
                }
                if action_sub {
                    return match action_bindings.get(&key) {
                        Some(action) => (KeyOutcome::ActionKey(action.clone()), scroll_last_key.to_string()),
                        None => (KeyOutcome::Dropped, scroll_last_key.to_string()),
                    };
                }
                match mode {
                    Mode::Hints => {
                        let Some(collection) = hints else {
                            return (KeyOutcome::Dropped, scroll_last_key.to_string());
                        };
                        let outcome = self.hint_router.handle_key(&key, collection);
                        (KeyOutcome::Hint(outcome), scroll_last_key.to_string())
                    }
                    Mode::Grid => {
                        let Some(grid) = grid else {
                            return (KeyOutcome::Dropped, scroll_last_key.to_string());
                        };
                        let outcome = self.grid_router.handle_key(&key, grid);
                        (KeyOutcome::Grid(outcome), scroll_last_key.to_string())
                    }
                    _ => unreachable!(),
                }
            }
            Mode::Scroll => {
                if key == ESCAPE {
                    return (KeyOutcome::ExitToIdle, String::new());
                }
                let (op, new_last, recognised) = parse_scroll_key(&key, scroll_last_key);
                if recognised {
                    (KeyOutcome::Scroll(op), new_last)
                } else {
                    (KeyOutcome::Dropped, scroll_last_key.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn key(keycode: u16, shift: bool, control: bool) -> RawKeyEvent {
        RawKeyEvent { keycode, shift, control, option: false, command: false }
    }

    #[test]
    fn translates_special_codes() {
        assert_eq!(translate(key(KEYCODE_BACKSPACE, false, false)), Some(BACKSPACE.to_string()));
        assert_eq!(translate(key(KEYCODE_ESCAPE, false, false)), Some(ESCAPE.to_string()));
        assert_eq!(translate(key(KEYCODE_TAB, false, false)), Some("\t".to_string()));
    }

    #[test]
    fn translates_letters_with_shift() {
        assert_eq!(translate(key(0, false, false)), Some("a".to_string()));
        assert_eq!(translate(key(0, true, false)), Some("A".to_string()));
    }

    #[test]
    fn control_d_and_u_map_to_scroll_controls() {
        assert_eq!(translate(key(2, false, true)), Some(crate::scroll::CTRL_D.to_string()));
        assert_eq!(translate(key(32, false, true)), Some(crate::scroll::CTRL_U.to_string()));
    }

    #[test]
    fn s4_hotkey_matching_event_is_passed_through_unchanged() {
        let hotkeys = vec![HotkeyBinding { keycode: 49, modifier_mask: 0b1010 }];
        let event = RawKeyEvent { keycode: 49, shift: false, control: false, option: false, command: true };
        assert!(hotkey_matches(event, &hotkeys));

        let mut pipeline: KeyPipeline<u64> = KeyPipeline::new("asdfghjkl");
        let (outcome, _) = pipeline.handle_event(
            event,
            &hotkeys,
            Mode::Hints,
            false,
            "",
            &HashMap::new(),
            None,
            None,
        );
        assert_eq!(outcome, KeyOutcome::PassThrough);
    }

    #[test]
    fn idle_mode_routes_recognised_scroll_keys_and_drops_others() {
        let mut pipeline: KeyPipeline<u64> = KeyPipeline::new("asdfghjkl");
        let (outcome, last) = pipeline.handle_event(
            key(38, false, false), // 'j'
            &[],
            Mode::Idle,
            false,
            "",
            &HashMap::new(),
            None,
            None,
        );
        assert_eq!(outcome, KeyOutcome::Scroll(Some(ScrollOp::Down)));
        assert_eq!(last, "");

        let (outcome, _) = pipeline.handle_event(
            key(14, false, false), // 'e', unrecognised
            &[],
            Mode::Idle,
            false,
            "",
            &HashMap::new(),
            None,
            None,
        );
        assert_eq!(outcome, KeyOutcome::Dropped);
    }

    #[test]
    fn tab_toggles_and_escape_exits_in_hints_mode() {
        let mut pipeline: KeyPipeline<u64> = KeyPipeline::new("asdfghjkl");
        let (outcome, _) = pipeline.handle_event(
            key(KEYCODE_TAB, false, false),
            &[],
            Mode::Hints,
            false,
            "",
            &HashMap::new(),
            None,
            None,
        );
        assert_eq!(outcome, KeyOutcome::Tab);

        let (outcome, _) = pipeline.handle_event(
            key(KEYCODE_ESCAPE, false, false),
            &[],
            Mode::Hints,
            true,
            "",
            &HashMap::new(),
            None,
            None,
        );
        assert_eq!(outcome, KeyOutcome::ExitToIdle);
    }

    #[test]
    fn action_sub_mode_matches_configured_action_keys() {
        let mut pipeline: KeyPipeline<u64> = KeyPipeline::new("asdfghjkl");
        let mut bindings = HashMap::new();
        bindings.insert("f".to_string(), "left_click".to_string());

        let (outcome, _) = pipeline.handle_event(
            key(3, false, false), // 'f'
            &[],
            Mode::Hints,
            true,
            "",
            &bindings,
            None,
            None,
        );
        assert_eq!(outcome, KeyOutcome::ActionKey("left_click".to_string()));
    }

    #[test]
    fn hints_mode_routes_to_hint_router() {
        let mut pipeline: KeyPipeline<u64> = KeyPipeline::new("asdfghjkl");
        let collection = HintCollection::new(vec![Hint {
            label: "A".to_string(),
            element: 0u64,
            center: Point::new(1.0, 1.0),
            size: Point::new(10.0, 10.0),
        }]);
        let (outcome, _) = pipeline.handle_event(
            key(0, false, false), // 'a'
            &[],
            Mode::Hints,
            false,
            "",
            &HashMap::new(),
            Some(&collection),
            None,
        );
        match outcome {
            KeyOutcome::Hint(RouterOutcome::Exact(hint)) => assert_eq!(hint.label, "A"),
            other => panic!("expected Exact hint outcome, got {:?}", other),
        }
    }
}
