//! Platform abstraction traits.
//!
//! Everything the core state machine needs from the OS — accessibility-tree
//! enumeration, cursor/click/scroll injection, screen-bounds queries, the
//! low-level key-event tap, and app-activation/display-change notifications —
//! is expressed here as traits. Core code (`coordinator`, `mode`, `key_pipeline`,
//! `lifecycle`) depends only on these traits, never on a concrete binding.
//!
//! The macOS binding (`macos`) is a thin, mostly pass-through implementation;
//! it is a collaborator, not the object of this crate's test coverage. Tests
//! exercise the trait boundary through `mock`.

use crate::error::Result;
use crate::geometry::{Point, Rect};

#[cfg(target_os = "macos")]
pub mod macos;
pub mod mock;

/// Opaque accessibility-element identity. The core never interprets this
/// beyond carrying it alongside a hint's computed center/size.
pub type ElementId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickButton {
    Left,
    Right,
    Middle,
}

/// A clickable element as reported by the accessibility tree, before
/// hint-label assignment.
#[derive(Debug, Clone)]
pub struct ClickableElement {
    pub id: ElementId,
    pub position: Point,
    pub size: Point,
    pub role: String,
}

/// A raw key-down event as delivered by the low-level event tap, before
/// translation to a character string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub keycode: u16,
    pub shift: bool,
    pub control: bool,
    pub option: bool,
    pub command: bool,
}

impl RawKeyEvent {
    pub fn modifier_mask(&self) -> u8 {
        (self.shift as u8) | ((self.control as u8) << 1) | ((self.option as u8) << 2) | ((self.command as u8) << 3)
    }
}

/// Callback invoked by the event tap for every key-down while enabled.
pub type KeyEventCallback = Box<dyn Fn(RawKeyEvent) + Send + Sync + 'static>;

/// The platform-provided low-level key interception facility. When enabled
/// it delivers every key-down to the installed callback; the KeyPipeline
/// (not this trait) decides hotkey pass-through vs. swallow.
pub trait EventTap: Send {
    fn set_handler(&mut self, handler: KeyEventCallback);
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
}

/// Platform-global operations needed by the Coordinator and its components.
/// All methods must be safe to call from worker threads for queries, but
/// overlay/tap-affecting operations are main-thread-only by convention;
/// this trait does not enforce that itself (the Coordinator
/// does, by construction — it owns the only handle).
pub trait Platform: Send + Sync {
    /// Whether the process has been granted accessibility permissions.
    fn has_accessibility_permission(&self) -> bool;

    /// The display whose bounds contain `point`, if any.
    fn screen_bounds_containing(&self, point: Point) -> Option<Rect>;

    /// The display containing the current mouse cursor ("active screen").
    fn active_screen_bounds(&self) -> Rect {
        self.screen_bounds_containing(self.cursor_position())
            .unwrap_or(Rect::new(Point::new(0.0, 0.0), 0.0, 0.0))
    }

    fn cursor_position(&self) -> Point;
    fn move_cursor(&self, to: Point) -> Result<()>;
    fn click(&self, button: ClickButton, at: Point) -> Result<()>;
    fn mouse_down(&self, button: ClickButton, at: Point) -> Result<()>;
    fn mouse_up(&self, button: ClickButton, at: Point) -> Result<()>;
    fn scroll(&self, dx: f64, dy: f64) -> Result<()>;

    /// Enumerate clickable elements of the focused application whose
    /// accessibility role is in `roles`.
    fn clickable_elements(&self, roles: &[String]) -> Result<Vec<ClickableElement>>;

    /// Bundle identifier of the OS-reported frontmost application, if any.
    fn focused_bundle_id(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_mask_is_distinct_per_combination() {
        let a = RawKeyEvent { keycode: 0, shift: true, control: false, option: false, command: false };
        let b = RawKeyEvent { keycode: 0, shift: false, control: true, option: false, command: false };
        assert_ne!(a.modifier_mask(), b.modifier_mask());
    }
}
