//! In-memory desktop
//!
//! A [`DisplayProvider`] and [`CursorActuator`] backed by plain data. Drives
//! the `simulate` command and every controller test without touching the OS.

use std::cell::{Cell, RefCell};

use super::events::{DisplayId, DisplayInfo};
use super::traits::{CursorActuator, DisplayProvider, InputError, InputResult};
use crate::config::DesktopLayout;
use crate::screen::{Point, Rect};

type WarpObserver = Box<dyn Fn(Point)>;

/// A scripted set of displays and a pointer
pub struct VirtualDesktop {
    displays: RefCell<Vec<DisplayInfo>>,
    cursor: Cell<Point>,
    warps: RefCell<Vec<Point>>,
    fail_enumeration: Cell<bool>,
    fail_warp: Cell<bool>,
    warp_observer: RefCell<Option<WarpObserver>>,
}

impl VirtualDesktop {
    pub fn new() -> Self {
        Self {
            displays: RefCell::new(Vec::new()),
            cursor: Cell::new(Point::new(0, 0)),
            warps: RefCell::new(Vec::new()),
            fail_enumeration: Cell::new(false),
            fail_warp: Cell::new(false),
            warp_observer: RefCell::new(None),
        }
    }

    /// Add a display; identities are assigned sequentially from 1
    pub fn with_display(self, name: &str, rect: Rect, primary: bool) -> Self {
        {
            let mut displays = self.displays.borrow_mut();
            let id = DisplayId(displays.len() as isize + 1);
            displays.push(DisplayInfo::new(id, rect, primary, name));
        }
        self
    }

    pub fn from_layout(layout: &DesktopLayout) -> Self {
        layout.displays.iter().fold(Self::new(), |desktop, d| {
            desktop.with_display(&d.name, d.rect(), d.primary)
        })
    }

    /// Replace the display set, as if the user rearranged monitors
    pub fn set_displays(&self, displays: Vec<DisplayInfo>) {
        *self.displays.borrow_mut() = displays;
    }

    pub fn fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.set(fail);
    }

    pub fn fail_warp(&self, fail: bool) {
        self.fail_warp.set(fail);
    }

    /// Called with the target after every successful warp, before `warp`
    /// returns, the way an OS reports a programmatic move to its hooks
    pub fn set_warp_observer(&self, observer: impl Fn(Point) + 'static) {
        *self.warp_observer.borrow_mut() = Some(Box::new(observer));
    }

    /// Record a hardware move of the pointer
    pub fn move_cursor(&self, to: Point) {
        self.cursor.set(to);
    }

    pub fn cursor(&self) -> Point {
        self.cursor.get()
    }

    /// Every successful warp target, oldest first
    pub fn warps(&self) -> Vec<Point> {
        self.warps.borrow().clone()
    }

    pub fn name_of(&self, id: DisplayId) -> Option<String> {
        self.displays
            .borrow()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.device_name.clone())
    }
}

impl Default for VirtualDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayProvider for VirtualDesktop {
    fn enumerate(&self) -> InputResult<Vec<DisplayInfo>> {
        if self.fail_enumeration.get() {
            return Err(InputError::Platform("enumeration unavailable".to_string()));
        }
        Ok(self.displays.borrow().clone())
    }

    fn display_at(&self, p: Point) -> Option<DisplayId> {
        self.displays
            .borrow()
            .iter()
            .find(|d| d.rect.contains(p))
            .map(|d| d.id)
    }
}

impl CursorActuator for VirtualDesktop {
    fn warp(&self, to: Point) -> InputResult<()> {
        if self.fail_warp.get() {
            return Err(InputError::RelocationFailed(to));
        }
        self.cursor.set(to);
        self.warps.borrow_mut().push(to);

        if let Some(observer) = self.warp_observer.borrow().as_ref() {
            observer(to);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;

    #[test]
    fn test_display_at_uses_half_open_rects() {
        let desktop = VirtualDesktop::new()
            .with_display("A", Rect::new(0, 0, 100, 100), true)
            .with_display("B", Rect::new(100, 0, 200, 100), false);

        assert_eq!(desktop.display_at(Point::new(99, 50)), Some(DisplayId(1)));
        assert_eq!(desktop.display_at(Point::new(100, 50)), Some(DisplayId(2)));
        assert_eq!(desktop.display_at(Point::new(200, 50)), None);
    }

    #[test]
    fn test_warp_records_and_moves() {
        let desktop = VirtualDesktop::new().with_display("A", Rect::new(0, 0, 100, 100), true);

        desktop.warp(Point::new(5, 6)).unwrap();

        assert_eq!(desktop.cursor(), Point::new(5, 6));
        assert_eq!(desktop.warps(), vec![Point::new(5, 6)]);
    }

    #[test]
    fn test_failed_warp_leaves_cursor() {
        let desktop = VirtualDesktop::new();
        desktop.move_cursor(Point::new(1, 1));
        desktop.fail_warp(true);

        assert!(matches!(
            desktop.warp(Point::new(5, 6)),
            Err(InputError::RelocationFailed(_))
        ));
        assert_eq!(desktop.cursor(), Point::new(1, 1));
        assert!(desktop.warps().is_empty());
    }

    #[test]
    fn test_from_layout() {
        let layout = DesktopLayout {
            displays: vec![DisplayConfig {
                name: "main".to_string(),
                left: -100,
                top: 0,
                width: 100,
                height: 50,
                primary: true,
            }],
        };

        let desktop = VirtualDesktop::from_layout(&layout);
        let displays = desktop.enumerate().unwrap();

        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].rect, Rect::new(-100, 0, 0, 50));
        assert_eq!(desktop.name_of(DisplayId(1)).as_deref(), Some("main"));
    }
}
