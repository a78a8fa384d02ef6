//! Input trait definitions
//!
//! Defines the small capability interfaces that platform-specific
//! implementations must provide.

use std::rc::Rc;

use thiserror::Error;

use super::events::{DisplayId, DisplayInfo, MouseMoveEvent, MoveVerdict, RefreshReason};
use crate::screen::Point;

/// Errors that can occur at the OS boundary
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Not supported on this platform")]
    NotSupported,

    #[error("Event source already running")]
    AlreadyStarted,

    #[error("Cursor relocation to {0} failed")]
    RelocationFailed(Point),
}

pub type InputResult<T> = Result<T, InputError>;

/// Enumerates displays and answers point queries
pub trait DisplayProvider {
    /// All connected displays, in whatever order the OS reports them
    fn enumerate(&self) -> InputResult<Vec<DisplayInfo>>;

    /// The display containing `p`, if any
    fn display_at(&self, p: Point) -> Option<DisplayId>;
}

/// Moves the system pointer.
///
/// Implementations may synchronously re-enter the move handler before
/// returning, because the OS reports the relocation as a new move.
pub trait CursorActuator {
    fn warp(&self, to: Point) -> InputResult<()>;
}

/// Receives events from an [`EventSource`] on the dispatch thread
pub trait EventHandler {
    /// Must return quickly; the OS may drop a slow interception hook
    fn on_pointer_move(&self, event: &MouseMoveEvent) -> MoveVerdict;

    fn on_refresh(&self, reason: RefreshReason);
}

/// Delivers move events and refresh triggers until shut down
pub trait EventSource {
    /// Install interception, dispatch until a quit request, then tear down
    fn run(&mut self, handler: Rc<dyn EventHandler>) -> InputResult<()>;
}

impl<T: DisplayProvider + ?Sized> DisplayProvider for Rc<T> {
    fn enumerate(&self) -> InputResult<Vec<DisplayInfo>> {
        (**self).enumerate()
    }

    fn display_at(&self, p: Point) -> Option<DisplayId> {
        (**self).display_at(p)
    }
}

impl<T: DisplayProvider + ?Sized> DisplayProvider for Box<T> {
    fn enumerate(&self) -> InputResult<Vec<DisplayInfo>> {
        (**self).enumerate()
    }

    fn display_at(&self, p: Point) -> Option<DisplayId> {
        (**self).display_at(p)
    }
}

impl<T: CursorActuator + ?Sized> CursorActuator for Rc<T> {
    fn warp(&self, to: Point) -> InputResult<()> {
        (**self).warp(to)
    }
}
