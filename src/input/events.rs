//! Input event types
//!
//! Platform-independent representation of the events and display records that
//! cross the boundary between the OS facilities and the crossing engine.

use serde::Serialize;

use crate::screen::{Point, Rect};

/// Milliseconds since system start, as stamped by the OS
pub type EventTimestamp = u32;

/// Opaque OS-assigned display handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DisplayId(pub isize);

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A display as reported by enumeration, in no particular order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub rect: Rect,
    pub primary: bool,
    pub device_name: String,
}

impl DisplayInfo {
    pub fn new(id: DisplayId, rect: Rect, primary: bool, device_name: &str) -> Self {
        Self {
            id,
            rect,
            primary,
            device_name: device_name.to_string(),
        }
    }
}

/// A raw pointer-move event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseMoveEvent {
    /// Absolute position in virtual-screen coordinates
    pub position: Point,
    /// Set by the OS for synthetic moves, including our own relocations
    pub injected: bool,
    pub timestamp: EventTimestamp,
}

impl MouseMoveEvent {
    pub fn new(position: Point, injected: bool) -> Self {
        Self {
            position,
            injected,
            timestamp: 0,
        }
    }

    /// A move coming from physical hardware
    pub fn physical(position: Point) -> Self {
        Self::new(position, false)
    }
}

/// What the event source should do with a move event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveVerdict {
    /// Forward the event unchanged
    PassThrough,
    /// The cursor was relocated; the original event must be swallowed
    Relocated(Point),
}

impl MoveVerdict {
    pub fn suppresses(&self) -> bool {
        matches!(self, MoveVerdict::Relocated(_))
    }
}

/// Why a topology refresh was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    DisplayChange,
    SettingChange,
    Timer,
    Manual,
}

impl std::fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RefreshReason::DisplayChange => "display change",
            RefreshReason::SettingChange => "setting change",
            RefreshReason::Timer => "timer",
            RefreshReason::Manual => "manual",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_relocation_suppresses() {
        assert!(!MoveVerdict::PassThrough.suppresses());
        assert!(MoveVerdict::Relocated(Point::new(1, 1)).suppresses());
    }

    #[test]
    fn test_physical_event_is_not_injected() {
        let event = MouseMoveEvent::physical(Point::new(10, 20));

        assert!(!event.injected);
        assert_eq!(event.position, Point::new(10, 20));
    }
}
