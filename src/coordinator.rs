//! Coordinator: owns configuration, component state, the platform
//! handle, the event tap, and the overlay renderer handle. This is the only
//! place mode transitions, cursor capture/restoration, and hotkey refreshes
//! actually happen; every other component is a pure function or a thin
//! query over `Platform`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::config::Config;
use crate::error::{DaemonError, Result};
use crate::geometry::{Point, Rect};
use crate::grid::Grid;
use crate::hint::{HintGenerator, ScoredElement};
use crate::hint_collection::HintCollection;
use crate::hotkeys::HotkeyManager;
use crate::key_pipeline::{HotkeyBinding, KeyOutcome, KeyPipeline};
use crate::mode::{compute_restored, transition, AppState, CursorState, Mode, Preconditions, Trigger};
use crate::platform::{ClickButton, ElementId, EventTap, Platform, RawKeyEvent};
use crate::router::RouterOutcome;
use crate::scroll::{ScrollController, ScrollDistances};

/// Overlay drawing surface. Like the macOS `Platform` binding, this is a
/// collaborator the Coordinator depends on through a trait; its own test
/// coverage runs against `NullRenderer`.
pub trait Renderer: Send {
    fn draw_hints(&mut self, hints: &HintCollection<ElementId>, accumulator: &str);
    fn draw_grid(&mut self, grid: &Grid, accumulator: &str);
    fn draw_scroll_highlight(&mut self, bounds: Rect);
    fn hide(&mut self);
    fn resize(&mut self, bounds: Rect);
}

pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_hints(&mut self, _hints: &HintCollection<ElementId>, _accumulator: &str) {}
    fn draw_grid(&mut self, _grid: &Grid, _accumulator: &str) {}
    fn draw_scroll_highlight(&mut self, _bounds: Rect) {}
    fn hide(&mut self) {}
    fn resize(&mut self, _bounds: Rect) {}
}

pub struct Coordinator<P: Platform> {
    config: Config,
    config_path: Option<PathBuf>,
    platform: Arc<P>,
    event_tap: Box<dyn EventTap>,
    renderer: Box<dyn Renderer>,
    hotkeys: HotkeyManager,
    app_state: Arc<RwLock<AppState>>,
    cursor_state: Arc<RwLock<CursorState>>,
    key_pipeline: KeyPipeline<ElementId>,
    hints: Option<HintCollection<ElementId>>,
    grid: Option<Grid>,
    focused_bundle_id: Option<String>,
}

impl<P: Platform + 'static> Coordinator<P> {
    /// `key_tx` is the main-thread end of the channel the event tap's
    /// callback posts `RawKeyEvent`s onto; this is the only thing about the
    /// tap that needs to be `Sync` (the tap callback runs off the main
    /// thread, `Coordinator` itself never leaves it).
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        platform: Arc<P>,
        mut event_tap: Box<dyn EventTap>,
        renderer: Box<dyn Renderer>,
        hotkeys: HotkeyManager,
        key_tx: std_mpsc::Sender<RawKeyEvent>,
    ) -> Self {
        let restore_enabled = config.general.restore_cursor_position;
        let sublayer_keys = config.grid.sublayer_keys.clone();
        let key_tx = Arc::new(Mutex::new(key_tx));
        event_tap.set_handler(Box::new(move |event| {
            let _ = key_tx.lock().send(event);
        }));
        Self {
            config,
            config_path,
            platform,
            event_tap,
            renderer,
            hotkeys,
            app_state: Arc::new(RwLock::new(AppState::default())),
            cursor_state: Arc::new(RwLock::new(CursorState::new(restore_enabled))),
            key_pipeline: KeyPipeline::new(sublayer_keys),
            hints: None,
            grid: None,
            focused_bundle_id: None,
        }
    }

    pub fn config_path(&self) -> Option<&std::path::Path> {
        self.config_path.as_deref()
    }

    pub fn app_state(&self) -> Arc<RwLock<AppState>> {
        self.app_state.clone()
    }

    pub fn cursor_state(&self) -> Arc<RwLock<CursorState>> {
        self.cursor_state.clone()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.app_state.write().enabled = enabled;
        if !enabled {
            self.exit_mode();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.app_state.read().enabled
    }

    pub fn current_mode(&self) -> Mode {
        self.app_state.read().mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn preconditions(&self) -> Preconditions {
        let enabled = self.app_state.read().enabled;
        Preconditions {
            enabled,
            hints_enabled: self.config.hints.enabled,
            grid_enabled: self.config.grid.enabled,
            focused_app_excluded: self.focused_app_excluded(),
        }
    }

    fn focused_app_excluded(&self) -> bool {
        self.focused_bundle_id
            .as_ref()
            .map(|id| self.config.excluded_bundle_ids.iter().any(|e| e == id))
            .unwrap_or(false)
    }

    fn capture_cursor_if_needed(&mut self) {
        let mut cursor = self.cursor_state.write();
        if !cursor.captured {
            let position = self.platform.cursor_position();
            let bounds = self.platform.active_screen_bounds();
            cursor.capture(position, bounds);
        }
    }

    /// Drives one `ModeMachine` transition and its entry action. Rejection
    /// (precondition not met) leaves every piece of state untouched.
    pub fn activate_mode(&mut self, target: Mode) -> Result<()> {
        let pre = self.preconditions();
        let (current, action_sub) = {
            let state = self.app_state.read();
            (state.mode, state.action_sub)
        };
        let trigger = match target {
            Mode::Scroll => Trigger::ActivateScroll,
            other => Trigger::Activate(other),
        };
        let (new_mode, new_action_sub) = transition(current, action_sub, trigger, &pre)
            .map_err(|e| DaemonError::Activation(format!("{target:?} activation rejected: {e:?}")))?;

        self.capture_cursor_if_needed();

        match new_mode {
            Mode::Hints => self.enter_hints()?,
            Mode::Grid => self.enter_grid(),
            Mode::Scroll => self.enter_scroll(),
            Mode::Idle => self.enter_idle(),
        }

        let mut state = self.app_state.write();
        state.mode = new_mode;
        state.action_sub = new_action_sub;
        Ok(())
    }

    fn enter_hints(&mut self) -> Result<()> {
        let roles = self.clickable_roles();
        let elements = self.platform.clickable_elements(&roles)?;
        if elements.is_empty() {
            warn!(target: "MODE", "no clickable elements found, staying in Idle");
            return Err(DaemonError::Activation("no clickable elements".into()));
        }
        let scored = elements
            .into_iter()
            .map(|e| ScoredElement { handle: e.id, position: e.position, size: e.size })
            .collect();
        let generator = HintGenerator::new(&self.config.hints.hint_characters);
        let result = generator.generate(scored);
        if let Some(original) = result.truncated_from {
            warn!(target: "HINT", original, kept = result.hints.len(), "hint set truncated");
        }
        let collection = HintCollection::new(result.hints);
        self.renderer.resize(self.platform.active_screen_bounds());
        self.renderer.draw_hints(&collection, "");
        self.hints = Some(collection);
        self.key_pipeline.reset_hint_router();
        self.event_tap.enable();
        Ok(())
    }

    fn enter_grid(&mut self) {
        let bounds = self.platform.active_screen_bounds();
        let local = Rect::new(Point::new(0.0, 0.0), bounds.width, bounds.height);
        let grid = Grid::new(local, &self.config.grid.characters);
        self.renderer.resize(bounds);
        self.renderer.draw_grid(&grid, "");
        self.grid = Some(grid);
        self.event_tap.enable();
    }

    fn enter_scroll(&mut self) {
        if self.config.scroll.highlight_scroll_area {
            self.renderer.draw_scroll_highlight(self.platform.active_screen_bounds());
        }
        self.app_state.write().scrolling_active = true;
        self.event_tap.enable();
    }

    fn enter_idle(&mut self) {
        self.renderer.hide();
        self.event_tap.disable();
        self.hints = None;
        self.grid = None;

        let scrolling_active = {
            let mut state = self.app_state.write();
            let was_scrolling = state.scrolling_active;
            state.scrolling_active = false;
            state.scroll_last_key.clear();
            was_scrolling
        };

        {
            let mut cursor = self.cursor_state.write();
            if cursor.should_restore(scrolling_active) {
                let to = self.platform.active_screen_bounds();
                let restored = compute_restored(cursor.initial_position, cursor.initial_screen_bounds, to);
                if let Err(err) = self.platform.move_cursor(restored) {
                    warn!(target: "CURSOR", %err, "failed to restore cursor position");
                }
            }
            cursor.consume();
        }

        let pending = {
            let mut state = self.app_state.write();
            std::mem::take(&mut state.hotkey_refresh_pending)
        };
        if pending {
            if let Err(err) = self.refresh_hotkeys() {
                warn!(target: "HOTKEY", %err, "deferred hotkey refresh failed");
            }
        }
    }

    pub fn exit_mode(&mut self) {
        let _ = self.activate_mode(Mode::Idle);
    }

    fn clickable_roles(&self) -> Vec<String> {
        let mut roles = self.config.hints.clickable_roles.clone();
        if let Some(bundle) = &self.focused_bundle_id {
            if let Some(overrides) = self.config.hints.role_overrides.get(bundle) {
                for r in overrides {
                    if !roles.contains(r) {
                        roles.push(r.clone());
                    }
                }
            }
            if let Some(extra) = self.config.hints.additional_ax_support.get(bundle) {
                for r in extra {
                    if !roles.contains(r) {
                        roles.push(r.clone());
                    }
                }
            }
        }
        roles
    }

    pub fn refresh_hotkeys(&mut self) -> Result<()> {
        if self.focused_app_excluded() {
            self.hotkeys.unregister_all();
            return Ok(());
        }
        self.hotkeys.refresh(&self.config.hotkeys)
    }

    /// On Idle, refresh immediately; otherwise defer to the next return to
    /// Idle.
    pub fn on_focused_app_changed(&mut self, bundle_id: Option<String>) {
        self.focused_bundle_id = bundle_id;
        let mode_is_idle = self.app_state.read().mode == Mode::Idle;
        if mode_is_idle {
            if let Err(err) = self.refresh_hotkeys() {
                warn!(target: "HOTKEY", %err, "hotkey refresh on focus change failed");
            }
        } else {
            self.app_state.write().hotkey_refresh_pending = true;
        }
    }

    /// Resize/regenerate immediately in Grid/Hints, otherwise mark the
    /// corresponding dirty flag for the next activation.
    pub fn on_screen_changed(&mut self) {
        let mut state = self.app_state.write();
        if state.screen_change_in_progress {
            return;
        }
        state.screen_change_in_progress = true;
        let mode = state.mode;
        drop(state);

        match mode {
            Mode::Hints => {
                self.renderer.resize(self.platform.active_screen_bounds());
                let _ = self.enter_hints();
            }
            Mode::Grid => {
                self.enter_grid();
            }
            Mode::Idle => {
                let mut state = self.app_state.write();
                state.hint_overlay_dirty = true;
                state.grid_overlay_dirty = true;
            }
            Mode::Scroll => {}
        }

        self.app_state.write().screen_change_in_progress = false;
    }

    fn action_bindings(&self) -> HashMap<String, String> {
        self.config.action.bindings.clone()
    }

    /// Entry point for one raw key-down event; the event tap's callback
    /// posts these onto the main thread per the concurrency model.
    pub fn handle_key(&mut self, event: RawKeyEvent) {
        let (mode, action_sub, scroll_last_key) = {
            let state = self.app_state.read();
            (state.mode, state.action_sub, state.scroll_last_key.clone())
        };
        let hotkeys: Vec<HotkeyBinding> = self.hotkeys.bindings();
        let bindings = self.action_bindings();

        let (outcome, new_last_key) = self.key_pipeline.handle_event(
            event,
            &hotkeys,
            mode,
            action_sub,
            &scroll_last_key,
            &bindings,
            self.hints.as_ref(),
            self.grid.as_ref(),
        );

        self.app_state.write().scroll_last_key = new_last_key;

        match outcome {
            KeyOutcome::PassThrough | KeyOutcome::Dropped => {}
            KeyOutcome::Tab => self.toggle_action_sub(),
            KeyOutcome::ExitToIdle => self.exit_mode(),
            KeyOutcome::ActionKey(action) => {
                if let Err(err) = self.perform_action(&action) {
                    warn!(target: "ACTION", %err, action, "action failed");
                }
            }
            KeyOutcome::Hint(RouterOutcome::Exact(hint)) => self.move_and_rearm(hint.center),
            KeyOutcome::Hint(_) => {}
            KeyOutcome::Grid(RouterOutcome::Exact(point)) => self.move_and_rearm(point.center),
            KeyOutcome::Grid(_) => {}
            KeyOutcome::Scroll(Some(op)) => self.run_scroll_op(op),
            KeyOutcome::Scroll(None) => {}
        }
    }

    fn toggle_action_sub(&mut self) {
        let pre = self.preconditions();
        let (current, action_sub) = {
            let state = self.app_state.read();
            (state.mode, state.action_sub)
        };
        if let Ok((mode, action_sub)) = transition(current, action_sub, Trigger::Tab, &pre) {
            let mut state = self.app_state.write();
            state.mode = mode;
            state.action_sub = action_sub;
        }
    }

    fn run_scroll_op(&mut self, op: crate::scroll::ScrollOp) {
        let distances = ScrollDistances {
            step: self.config.scroll.scroll_step,
            half_page: self.config.scroll.scroll_step_half,
            full_page: self.config.scroll.scroll_step_full,
        };
        let command = ScrollController::new(distances).command_for(op);
        if let Err(err) = self.platform.scroll(command.dx, command.dy) {
            warn!(target: "SCROLL", %err, "scroll primitive failed");
        }
    }

    fn move_and_rearm(&mut self, local_point: Point) {
        let bounds = self.platform.active_screen_bounds();
        let absolute = local_point.translated(bounds.origin.x, bounds.origin.y);
        if let Err(err) = self.platform.move_cursor(absolute) {
            warn!(target: "CURSOR", %err, "failed to move cursor");
        }
    }

    pub fn perform_action(&mut self, action: &str) -> Result<()> {
        let at = self.platform.cursor_position();
        match action {
            "left_click" => self.platform.click(ClickButton::Left, at),
            "right_click" => self.platform.click(ClickButton::Right, at),
            "middle_click" => self.platform.click(ClickButton::Middle, at),
            "mouse_down" => self.platform.mouse_down(ClickButton::Left, at),
            "mouse_up" => self.platform.mouse_up(ClickButton::Left, at),
            "scroll" => {
                self.cursor_state.write().skip_next_restore = true;
                self.activate_mode(Mode::Scroll)
            }
            other => Err(DaemonError::Protocol(format!("unknown action: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;
    use crate::platform::{ClickableElement, KeyEventCallback};

    struct MockEventTap {
        enabled: bool,
    }

    impl EventTap for MockEventTap {
        fn set_handler(&mut self, _handler: KeyEventCallback) {}
        fn enable(&mut self) {
            self.enabled = true;
        }
        fn disable(&mut self) {
            self.enabled = false;
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    fn coordinator_with(platform: Arc<MockPlatform>) -> Coordinator<MockPlatform> {
        let mut config = Config::default();
        config.hints.clickable_roles = vec!["AXButton".to_string()];
        Coordinator::new(
            config,
            None,
            platform,
            Box::new(MockEventTap { enabled: false }),
            Box::new(NullRenderer),
            HotkeyManager::new().expect("mock hotkey manager"),
            std::sync::mpsc::channel().0,
        )
    }

    #[test]
    fn activate_hints_populates_collection_and_enables_tap() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_elements(vec![ClickableElement {
            id: 1,
            position: Point::new(0.0, 0.0),
            size: Point::new(10.0, 10.0),
            role: "AXButton".to_string(),
        }]);
        let mut coordinator = coordinator_with(platform);
        coordinator.activate_mode(Mode::Hints).unwrap();
        assert_eq!(coordinator.app_state().read().mode, Mode::Hints);
        assert!(coordinator.hints.is_some());
    }

    #[test]
    fn activation_fails_without_clickable_elements() {
        let platform = Arc::new(MockPlatform::new());
        let mut coordinator = coordinator_with(platform);
        assert!(coordinator.activate_mode(Mode::Hints).is_err());
        assert_eq!(coordinator.app_state().read().mode, Mode::Idle);
    }

    #[test]
    fn hint_exact_hit_moves_cursor_to_absolute_position() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_elements(vec![ClickableElement {
            id: 1,
            position: Point::new(10.0, 10.0),
            size: Point::new(10.0, 10.0),
            role: "AXButton".to_string(),
        }]);
        let mut coordinator = coordinator_with(platform.clone());
        coordinator.activate_mode(Mode::Hints).unwrap();
        coordinator.handle_key(RawKeyEvent { keycode: 0, shift: false, control: false, option: false, command: false });
        assert_eq!(platform.moves().len(), 1);
    }

    #[test]
    fn cursor_restores_on_return_to_idle() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_cursor(Point::new(500.0, 500.0));
        platform.set_elements(vec![ClickableElement {
            id: 1,
            position: Point::new(10.0, 10.0),
            size: Point::new(10.0, 10.0),
            role: "AXButton".to_string(),
        }]);
        let mut coordinator = coordinator_with(platform.clone());
        coordinator.activate_mode(Mode::Hints).unwrap();
        coordinator.exit_mode();
        assert_eq!(platform.cursor_position(), Point::new(500.0, 500.0));
    }
}
