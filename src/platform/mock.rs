//! Deterministic in-memory `Platform` used by every test above the trait
//! boundary (mode machine, key pipeline, coordinator, IPC dispatcher,
//! lifecycle supervisor) so none of them need real accessibility
//! permissions or a real display.

use parking_lot::Mutex;

use super::{ClickButton, ClickableElement, Platform};
use crate::error::{DaemonError, Result};
use crate::geometry::{Point, Rect};

struct State {
    cursor: Point,
    screens: Vec<Rect>,
    elements: Vec<ClickableElement>,
    focused_bundle_id: Option<String>,
    has_permission: bool,
    moves: Vec<Point>,
    clicks: Vec<(ClickButton, Point)>,
    scrolls: Vec<(f64, f64)>,
    fail_next_platform_op: bool,
}

/// A scriptable mock: tests set up screens/elements/focused app up front,
/// then assert on recorded moves/clicks/scrolls after driving the code
/// under test.
pub struct MockPlatform {
    state: Mutex<State>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                cursor: Point::new(0.0, 0.0),
                screens: vec![Rect::new(Point::new(0.0, 0.0), 1920.0, 1080.0)],
                elements: Vec::new(),
                focused_bundle_id: None,
                has_permission: true,
                moves: Vec::new(),
                clicks: Vec::new(),
                scrolls: Vec::new(),
                fail_next_platform_op: false,
            }),
        }
    }

    pub fn set_cursor(&self, p: Point) {
        self.state.lock().cursor = p;
    }

    pub fn set_screens(&self, screens: Vec<Rect>) {
        self.state.lock().screens = screens;
    }

    pub fn set_elements(&self, elements: Vec<ClickableElement>) {
        self.state.lock().elements = elements;
    }

    pub fn set_focused_bundle_id(&self, id: Option<String>) {
        self.state.lock().focused_bundle_id = id;
    }

    pub fn set_has_permission(&self, has: bool) {
        self.state.lock().has_permission = has;
    }

    pub fn fail_next_platform_op(&self) {
        self.state.lock().fail_next_platform_op = true;
    }

    pub fn moves(&self) -> Vec<Point> {
        self.state.lock().moves.clone()
    }

    pub fn clicks(&self) -> Vec<(ClickButton, Point)> {
        self.state.lock().clicks.clone()
    }

    pub fn scrolls(&self) -> Vec<(f64, f64)> {
        self.state.lock().scrolls.clone()
    }

    fn maybe_fail(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_next_platform_op {
            state.fail_next_platform_op = false;
            return Err(DaemonError::Platform("mock platform op failed".into()));
        }
        Ok(())
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MockPlatform {
    fn has_accessibility_permission(&self) -> bool {
        self.state.lock().has_permission
    }

    fn screen_bounds_containing(&self, point: Point) -> Option<Rect> {
        self.state
            .lock()
            .screens
            .iter()
            .find(|r| r.contains(point))
            .copied()
    }

    fn cursor_position(&self) -> Point {
        self.state.lock().cursor
    }

    fn move_cursor(&self, to: Point) -> Result<()> {
        self.maybe_fail()?;
        let mut state = self.state.lock();
        state.cursor = to;
        state.moves.push(to);
        Ok(())
    }

    fn click(&self, button: ClickButton, at: Point) -> Result<()> {
        self.maybe_fail()?;
        self.state.lock().clicks.push((button, at));
        Ok(())
    }

    fn mouse_down(&self, button: ClickButton, at: Point) -> Result<()> {
        self.click(button, at)
    }

    fn mouse_up(&self, button: ClickButton, at: Point) -> Result<()> {
        self.click(button, at)
    }

    fn scroll(&self, dx: f64, dy: f64) -> Result<()> {
        self.maybe_fail()?;
        self.state.lock().scrolls.push((dx, dy));
        Ok(())
    }

    fn clickable_elements(&self, roles: &[String]) -> Result<Vec<ClickableElement>> {
        self.maybe_fail()?;
        let state = self.state.lock();
        if roles.is_empty() {
            return Ok(state.elements.clone());
        }
        Ok(state
            .elements
            .iter()
            .filter(|e| roles.iter().any(|r| r == &e.role))
            .cloned()
            .collect())
    }

    fn focused_bundle_id(&self) -> Option<String> {
        self.state.lock().focused_bundle_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_cursor_updates_position_and_records_call() {
        let platform = MockPlatform::new();
        platform.move_cursor(Point::new(10.0, 20.0)).unwrap();
        assert_eq!(platform.cursor_position(), Point::new(10.0, 20.0));
        assert_eq!(platform.moves(), vec![Point::new(10.0, 20.0)]);
    }

    #[test]
    fn fail_next_platform_op_fails_exactly_once() {
        let platform = MockPlatform::new();
        platform.fail_next_platform_op();
        assert!(platform.move_cursor(Point::new(0.0, 0.0)).is_err());
        assert!(platform.move_cursor(Point::new(0.0, 0.0)).is_ok());
    }
}
