//! Cursor crossing
//!
//! Watches raw pointer moves, notices when the pointer has passed from one
//! display to another, and relocates it to the proportionally matching spot
//! on the destination edge.
//!
//! All state lives in `Cell`s and every method takes `&self`: relocating the
//! cursor re-enters the move handler synchronously, and that nested call must
//! be able to observe the suppression flag and return.

mod session;

pub use session::Session;

use std::cell::Cell;

use crate::input::{CursorActuator, DisplayId, DisplayProvider, MouseMoveEvent, MoveVerdict};
use crate::screen::{find_exit_edge, remap, MonitorTopology, Point};

/// Last known display and position of the pointer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorState {
    pub last_display: Option<DisplayId>,
    pub last_position: Option<Point>,
}

impl CursorState {
    /// No display or position recorded
    pub const UNKNOWN: CursorState = CursorState {
        last_display: None,
        last_position: None,
    };

    pub fn tracking(display: DisplayId, position: Point) -> Self {
        Self {
            last_display: Some(display),
            last_position: Some(position),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.last_display.is_some() && self.last_position.is_some()
    }
}

/// Holds the suppression flag for as long as it lives
pub struct SuppressionGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> SuppressionGuard<'a> {
    pub fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Decides per move event whether a display crossing needs remapping
#[derive(Debug, Default)]
pub struct CrossingController {
    state: Cell<CursorState>,
    suppressing: Cell<bool>,
}

impl CrossingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CursorState {
        self.state.get()
    }

    /// Whether a relocation issued by this controller is in flight
    pub fn is_suppressing(&self) -> bool {
        self.suppressing.get()
    }

    /// Forget the tracked display and position
    pub fn reset(&self) {
        self.state.set(CursorState::UNKNOWN);
    }

    /// Process one raw move event.
    ///
    /// Every lookup miss or geometric failure degrades to "no remap": the event
    /// passes through and tracking advances.
    pub fn handle_move(
        &self,
        event: &MouseMoveEvent,
        topology: &MonitorTopology,
        displays: &dyn DisplayProvider,
        cursor: &dyn CursorActuator,
    ) -> MoveVerdict {
        if event.injected || self.suppressing.get() {
            return MoveVerdict::PassThrough;
        }

        let p = event.position;
        let Some(current) = displays.display_at(p) else {
            tracing::trace!("No display at {}", p);
            return MoveVerdict::PassThrough;
        };

        if let Some(mapped) = self.crossing_target(topology, current, p) {
            let relocated = {
                let _guard = SuppressionGuard::engage(&self.suppressing);
                cursor.warp(mapped)
            };
            match relocated {
                Ok(()) => {
                    self.state.set(CursorState {
                        last_display: displays.display_at(mapped),
                        last_position: Some(mapped),
                    });
                    return MoveVerdict::Relocated(mapped);
                }
                Err(e) => tracing::warn!("Cursor relocation abandoned: {}", e),
            }
        }

        self.state.set(CursorState::tracking(current, p));
        MoveVerdict::PassThrough
    }

    /// The relocation target if the pointer just left the tracked display
    fn crossing_target(
        &self,
        topology: &MonitorTopology,
        current: DisplayId,
        p: Point,
    ) -> Option<Point> {
        let state = self.state.get();
        let last_display = state.last_display?;
        let last_position = state.last_position?;
        if last_display == current {
            return None;
        }

        self.plan_crossing(topology, last_display, last_position, current, p)
            .filter(|&mapped| mapped != p)
    }

    /// Where the pointer should land after moving from `from_position` on
    /// `from` to `to_position` on `to`
    fn plan_crossing(
        &self,
        topology: &MonitorTopology,
        from: DisplayId,
        from_position: Point,
        to: DisplayId,
        to_position: Point,
    ) -> Option<Point> {
        let (Some(source), Some(dest)) = (topology.lookup(from), topology.lookup(to)) else {
            tracing::debug!("Crossing {} -> {} skipped: display no longer known", from, to);
            return None;
        };

        let hit = find_exit_edge(from_position, to_position, &source.rect)?;
        let mapped = remap(&source.rect, &dest.rect, hit.edge, hit.coord);

        tracing::debug!(
            "Crossing {} {} -> {} {}: {} edge t={:.6} coord={:.1} mapped={:?} current={}",
            source.device_name,
            source.rect,
            dest.device_name,
            dest.rect,
            hit.edge,
            hit.t,
            hit.coord,
            mapped,
            to_position
        );
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{DisplayInfo, VirtualDesktop};
    use crate::screen::{Rect, RefreshOutcome};

    const LEFT: DisplayId = DisplayId(1);
    const RIGHT: DisplayId = DisplayId(2);

    /// 1920x1080 on the left, 2560x1440 on the right, tops aligned
    fn setup() -> (VirtualDesktop, MonitorTopology, CrossingController) {
        let desktop = VirtualDesktop::new()
            .with_display("DISPLAY1", Rect::new(0, 0, 1920, 1080), true)
            .with_display("DISPLAY2", Rect::new(1920, 0, 4480, 1440), false);
        let mut topology = MonitorTopology::new();
        topology.refresh(&desktop).unwrap();
        (desktop, topology, CrossingController::new())
    }

    fn step(
        controller: &CrossingController,
        topology: &MonitorTopology,
        desktop: &VirtualDesktop,
        x: i32,
        y: i32,
    ) -> MoveVerdict {
        let event = MouseMoveEvent::physical(Point::new(x, y));
        controller.handle_move(&event, topology, desktop, desktop)
    }

    #[test]
    fn test_first_event_starts_tracking() {
        let (desktop, topology, controller) = setup();

        assert_eq!(controller.state(), CursorState::UNKNOWN);
        assert_eq!(step(&controller, &topology, &desktop, 100, 200), MoveVerdict::PassThrough);
        assert_eq!(
            controller.state(),
            CursorState::tracking(LEFT, Point::new(100, 200))
        );
    }

    #[test]
    fn test_crossing_right_is_remapped() {
        let (desktop, topology, controller) = setup();

        step(&controller, &topology, &desktop, 1915, 540);
        let verdict = step(&controller, &topology, &desktop, 1925, 540);

        assert_eq!(verdict, MoveVerdict::Relocated(Point::new(1921, 720)));
        assert_eq!(desktop.warps(), vec![Point::new(1921, 720)]);
        assert_eq!(
            controller.state(),
            CursorState::tracking(RIGHT, Point::new(1921, 720))
        );
        assert!(!controller.is_suppressing());
    }

    #[test]
    fn test_crossing_left_is_remapped() {
        let (desktop, topology, controller) = setup();

        step(&controller, &topology, &desktop, 1925, 720);
        let verdict = step(&controller, &topology, &desktop, 1915, 720);

        assert_eq!(verdict, MoveVerdict::Relocated(Point::new(1918, 540)));
    }

    #[test]
    fn test_movement_within_display_is_untouched() {
        let (desktop, topology, controller) = setup();

        step(&controller, &topology, &desktop, 100, 100);
        assert_eq!(step(&controller, &topology, &desktop, 900, 500), MoveVerdict::PassThrough);
        assert!(desktop.warps().is_empty());
    }

    #[test]
    fn test_injected_event_never_changes_state() {
        let (desktop, topology, controller) = setup();
        step(&controller, &topology, &desktop, 1915, 540);
        let before = controller.state();

        let injected = MouseMoveEvent::new(Point::new(1925, 540), true);
        let verdict = controller.handle_move(&injected, &topology, &desktop, &desktop);

        assert_eq!(verdict, MoveVerdict::PassThrough);
        assert_eq!(controller.state(), before);
        assert!(desktop.warps().is_empty());
    }

    #[test]
    fn test_active_suppression_passes_through() {
        let (desktop, topology, controller) = setup();
        step(&controller, &topology, &desktop, 1915, 540);
        let before = controller.state();

        let verdict = {
            let _guard = SuppressionGuard::engage(&controller.suppressing);
            step(&controller, &topology, &desktop, 1925, 540)
        };

        assert_eq!(verdict, MoveVerdict::PassThrough);
        assert_eq!(controller.state(), before);
        assert!(!controller.is_suppressing());
    }

    #[test]
    fn test_point_outside_all_displays_keeps_state() {
        let (desktop, topology, controller) = setup();
        step(&controller, &topology, &desktop, 1915, 540);
        let before = controller.state();

        // Below the shorter display, left of the taller one
        assert_eq!(step(&controller, &topology, &desktop, 1000, 1300), MoveVerdict::PassThrough);
        assert_eq!(controller.state(), before);
    }

    #[test]
    fn test_failed_relocation_still_advances_tracking() {
        let (desktop, topology, controller) = setup();
        desktop.fail_warp(true);

        step(&controller, &topology, &desktop, 1915, 540);
        let verdict = step(&controller, &topology, &desktop, 1925, 540);

        assert_eq!(verdict, MoveVerdict::PassThrough);
        assert_eq!(
            controller.state(),
            CursorState::tracking(RIGHT, Point::new(1925, 540))
        );
        assert!(!controller.is_suppressing());
    }

    #[test]
    fn test_mapped_point_equal_to_current_is_not_relocated() {
        // Identical heights: 1919,500 -> 1921,500 maps to 1921,500 already
        let desktop = VirtualDesktop::new()
            .with_display("A", Rect::new(0, 0, 1920, 1080), true)
            .with_display("B", Rect::new(1920, 0, 3840, 1080), false);
        let mut topology = MonitorTopology::new();
        topology.refresh(&desktop).unwrap();
        let controller = CrossingController::new();

        step(&controller, &topology, &desktop, 1919, 500);
        let verdict = step(&controller, &topology, &desktop, 1921, 500);

        assert_eq!(verdict, MoveVerdict::PassThrough);
        assert!(desktop.warps().is_empty());
        assert_eq!(
            controller.state(),
            CursorState::tracking(DisplayId(2), Point::new(1921, 500))
        );
    }

    #[test]
    fn test_stale_display_identity_is_not_crossed() {
        let (desktop, topology, controller) = setup();
        step(&controller, &topology, &desktop, 1915, 540);

        // The OS now reports a handle the topology has never seen
        desktop.set_displays(vec![
            DisplayInfo::new(LEFT, Rect::new(0, 0, 1920, 1080), true, "DISPLAY1"),
            DisplayInfo::new(DisplayId(7), Rect::new(1920, 0, 4480, 1440), false, "DISPLAY2"),
        ]);
        let verdict = step(&controller, &topology, &desktop, 1925, 540);

        assert_eq!(verdict, MoveVerdict::PassThrough);
        assert_eq!(
            controller.state(),
            CursorState::tracking(DisplayId(7), Point::new(1925, 540))
        );
    }

    #[test]
    fn test_reset_prevents_crossing_on_next_event() {
        let (desktop, mut topology, controller) = setup();
        step(&controller, &topology, &desktop, 1915, 540);

        desktop.set_displays(vec![
            DisplayInfo::new(LEFT, Rect::new(0, 0, 1920, 1080), true, "DISPLAY1"),
            DisplayInfo::new(RIGHT, Rect::new(1920, 0, 4480, 1600), false, "DISPLAY2"),
        ]);
        assert_eq!(topology.refresh(&desktop).unwrap(), RefreshOutcome::Changed);
        controller.reset();

        assert_eq!(step(&controller, &topology, &desktop, 1925, 540), MoveVerdict::PassThrough);
        assert!(desktop.warps().is_empty());
    }

    #[test]
    fn test_non_adjacent_displays_are_not_remapped() {
        // Second display floats below-right with no shared vertical span
        let desktop = VirtualDesktop::new()
            .with_display("A", Rect::new(0, 0, 1920, 1080), true)
            .with_display("B", Rect::new(1920, 1080, 3840, 2160), false);
        let mut topology = MonitorTopology::new();
        topology.refresh(&desktop).unwrap();
        let controller = CrossingController::new();

        step(&controller, &topology, &desktop, 1915, 1075);
        let verdict = step(&controller, &topology, &desktop, 1925, 1085);

        assert_eq!(verdict, MoveVerdict::PassThrough);
        assert!(desktop.warps().is_empty());
    }

    #[test]
    fn test_suppression_guard_clears_on_drop() {
        let flag = Cell::new(false);
        {
            let _guard = SuppressionGuard::engage(&flag);
            assert!(flag.get());
        }
        assert!(!flag.get());
    }
}
