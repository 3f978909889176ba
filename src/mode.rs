//! ModeMachine: the `Mode × ActionSubMode` tag, the process-wide
//! `AppState`/`CursorState` records, the validated transition function, and
//! the cursor-rescaling law applied on return to Idle.

use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Hints,
    Grid,
    Scroll,
}

/// Inputs the Coordinator feeds into `transition`. A trigger with no
/// matching transition for the current state is rejected as `NotApplicable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Activate(Mode),
    ActivateScroll,
    Tab,
    ActionKey,
    Escape,
    RouterExact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    Disabled,
    ModeDisabled,
    FocusedAppExcluded,
    NotApplicable,
}

/// Preconditions evaluated against current config/focus state; the
/// Coordinator assembles this fresh for each `transition` call.
#[derive(Debug, Clone, Copy)]
pub struct Preconditions {
    pub enabled: bool,
    pub hints_enabled: bool,
    pub grid_enabled: bool,
    pub focused_app_excluded: bool,
}

/// Pure, validated mode transition. Returns
/// the new `(mode, action_sub)` pair or the reason the transition was
/// rejected; rejection never mutates anything, so the caller's current
/// state stands unchanged.
pub fn transition(
    current: Mode,
    action_sub: bool,
    trigger: Trigger,
    pre: &Preconditions,
) -> Result<(Mode, bool), TransitionError> {
    use Mode::*;
    use Trigger::*;

    match (current, trigger) {
        (_, Activate(Idle)) => Ok((Idle, false)),
        (Idle, Activate(Hints)) => {
            if !pre.enabled {
                Err(TransitionError::Disabled)
            } else if !pre.hints_enabled {
                Err(TransitionError::ModeDisabled)
            } else if pre.focused_app_excluded {
                Err(TransitionError::FocusedAppExcluded)
            } else {
                Ok((Hints, false))
            }
        }
        (Idle, Activate(Grid)) => {
            if !pre.enabled {
                Err(TransitionError::Disabled)
            } else if !pre.grid_enabled {
                Err(TransitionError::ModeDisabled)
            } else if pre.focused_app_excluded {
                Err(TransitionError::FocusedAppExcluded)
            } else {
                Ok((Grid, false))
            }
        }
        (Idle, ActivateScroll) => {
            if pre.enabled {
                Ok((Scroll, false))
            } else {
                Err(TransitionError::Disabled)
            }
        }
        (Hints, Tab) | (Grid, Tab) => Ok((current, !action_sub)),
        (Hints, ActionKey) | (Grid, ActionKey) if action_sub => Ok((current, action_sub)),
        (Hints, Escape) | (Grid, Escape) | (Scroll, Escape) => Ok((Idle, false)),
        (Hints, RouterExact) | (Grid, RouterExact) => Ok((current, action_sub)),
        _ => Err(TransitionError::NotApplicable),
    }
}

/// Process-wide state mutated by the Coordinator; kept behind a
/// `parking_lot::RwLock` by its owner (see `coordinator`).
#[derive(Debug, Clone)]
pub struct AppState {
    pub enabled: bool,
    pub mode: Mode,
    pub action_sub: bool,
    pub screen_change_in_progress: bool,
    pub hotkey_refresh_pending: bool,
    pub grid_overlay_dirty: bool,
    pub hint_overlay_dirty: bool,
    pub scroll_last_key: String,
    pub scrolling_active: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: Mode::Idle,
            action_sub: false,
            screen_change_in_progress: false,
            hotkey_refresh_pending: false,
            grid_overlay_dirty: false,
            hint_overlay_dirty: false,
            scroll_last_key: String::new(),
            scrolling_active: false,
        }
    }
}

/// Cursor-capture/restoration bookkeeping; lifecycle is capture-at-first-
/// activation, consume-on-return-to-Idle.
#[derive(Debug, Clone)]
pub struct CursorState {
    pub restore_enabled: bool,
    pub captured: bool,
    pub initial_position: Point,
    pub initial_screen_bounds: Rect,
    pub skip_next_restore: bool,
}

impl CursorState {
    pub fn new(restore_enabled: bool) -> Self {
        Self {
            restore_enabled,
            captured: false,
            initial_position: Point::new(0.0, 0.0),
            initial_screen_bounds: Rect::new(Point::new(0.0, 0.0), 0.0, 0.0),
            skip_next_restore: false,
        }
    }

    pub fn capture(&mut self, position: Point, screen_bounds: Rect) {
        self.captured = true;
        self.initial_position = position;
        self.initial_screen_bounds = screen_bounds;
    }

    /// Whether `compute_restored` should run on this return to Idle.
    /// `scrolling_active` is read off `AppState` by the caller since it is
    /// not this struct's field.
    pub fn should_restore(&self, scrolling_active: bool) -> bool {
        self.restore_enabled && self.captured && !scrolling_active && !self.skip_next_restore
    }

    /// Consumes the capture (and the one-shot skip flag) on return to Idle.
    pub fn consume(&mut self) {
        self.captured = false;
        self.skip_next_restore = false;
    }
}

/// The cursor-rescaling law: a point captured at `init` on screen `from`,
/// re-expressed on screen `to` at the same relative position, clamped into
/// `to`'s bounds.
pub fn compute_restored(init: Point, from: Rect, to: Rect) -> Point {
    let (rx, ry) = from.relative_position(init);
    to.clamp_point(to.point_at(rx, ry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pre_all_enabled() -> Preconditions {
        Preconditions {
            enabled: true,
            hints_enabled: true,
            grid_enabled: true,
            focused_app_excluded: false,
        }
    }

    #[test]
    fn idle_activates_hints_when_enabled() {
        let pre = pre_all_enabled();
        assert_eq!(
            transition(Mode::Idle, false, Trigger::Activate(Mode::Hints), &pre),
            Ok((Mode::Hints, false))
        );
    }

    #[test]
    fn activation_rejected_when_master_disabled() {
        let mut pre = pre_all_enabled();
        pre.enabled = false;
        assert_eq!(
            transition(Mode::Idle, false, Trigger::Activate(Mode::Hints), &pre),
            Err(TransitionError::Disabled)
        );
    }

    #[test]
    fn activation_rejected_when_mode_disabled_in_config() {
        let mut pre = pre_all_enabled();
        pre.grid_enabled = false;
        assert_eq!(
            transition(Mode::Idle, false, Trigger::Activate(Mode::Grid), &pre),
            Err(TransitionError::ModeDisabled)
        );
    }

    #[test]
    fn activation_rejected_for_excluded_focused_app() {
        let mut pre = pre_all_enabled();
        pre.focused_app_excluded = true;
        assert_eq!(
            transition(Mode::Idle, false, Trigger::Activate(Mode::Hints), &pre),
            Err(TransitionError::FocusedAppExcluded)
        );
    }

    #[test]
    fn tab_toggles_action_sub_mode() {
        let pre = pre_all_enabled();
        let (mode, action_sub) = transition(Mode::Hints, false, Trigger::Tab, &pre).unwrap();
        assert_eq!(mode, Mode::Hints);
        assert!(action_sub);
        let (mode, action_sub) = transition(mode, action_sub, Trigger::Tab, &pre).unwrap();
        assert_eq!(mode, Mode::Hints);
        assert!(!action_sub);
    }

    #[test]
    fn mode_machine_closure_two_escapes_from_any_state_reaches_idle() {
        let pre = pre_all_enabled();
        for start in [Mode::Idle, Mode::Hints, Mode::Grid, Mode::Scroll] {
            let after_first = transition(start, true, Trigger::Escape, &pre)
                .unwrap_or((Mode::Idle, false));
            let (mode, action_sub) = transition(after_first.0, after_first.1, Trigger::Escape, &pre)
                .unwrap_or((Mode::Idle, false));
            assert_eq!(mode, Mode::Idle);
            assert!(!action_sub);
        }
    }

    #[test]
    fn compute_restored_is_identity_for_same_screen() {
        let from = Rect::new(Point::new(0.0, 0.0), 1920.0, 1080.0);
        let init = Point::new(500.0, 300.0);
        assert_eq!(compute_restored(init, from, from), init);
    }

    #[test]
    fn compute_restored_always_lies_within_destination() {
        let from = Rect::new(Point::new(0.0, 0.0), 1920.0, 1080.0);
        let to = Rect::new(Point::new(1920.0, 0.0), 1280.0, 720.0);
        let init = Point::new(1900.0, 50.0);
        let restored = compute_restored(init, from, to);
        assert!(to.contains(restored));
    }

    #[test]
    fn compute_restored_is_continuous_as_destination_approaches_source() {
        let from = Rect::new(Point::new(0.0, 0.0), 1920.0, 1080.0);
        let init = Point::new(960.0, 540.0);
        let almost_from = Rect::new(Point::new(0.0, 0.0), 1919.9, 1079.9);
        let restored = compute_restored(init, from, almost_from);
        assert!((restored.x - init.x).abs() < 0.2);
        assert!((restored.y - init.y).abs() < 0.2);
    }

    #[test]
    fn cursor_state_should_restore_respects_all_gates() {
        let mut state = CursorState::new(true);
        assert!(!state.should_restore(false));
        state.capture(Point::new(0.0, 0.0), Rect::new(Point::new(0.0, 0.0), 100.0, 100.0));
        assert!(state.should_restore(false));
        assert!(!state.should_restore(true));
        state.skip_next_restore = true;
        assert!(!state.should_restore(false));
    }
}
