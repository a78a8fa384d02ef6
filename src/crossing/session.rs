//! Crossing session
//!
//! The single context object handed to the event source: owns the topology,
//! the controller and the platform capabilities, and routes move events and
//! refresh triggers between them.

use std::cell::{Ref, RefCell};

use super::CrossingController;
use crate::input::{
    CursorActuator, DisplayProvider, EventHandler, MouseMoveEvent, MoveVerdict, RefreshReason,
};
use crate::screen::{MonitorTopology, RefreshOutcome, TopologyError};

pub struct Session<D, C> {
    displays: D,
    cursor: C,
    topology: RefCell<MonitorTopology>,
    controller: CrossingController,
}

impl<D: DisplayProvider, C: CursorActuator> Session<D, C> {
    /// Enumerate displays and start in the unknown state.
    ///
    /// Fails if no display can be found.
    pub fn new(displays: D, cursor: C) -> Result<Self, TopologyError> {
        let mut topology = MonitorTopology::new();
        topology.refresh(&displays)?;

        Ok(Self {
            displays,
            cursor,
            topology: RefCell::new(topology),
            controller: CrossingController::new(),
        })
    }

    pub fn on_move(&self, event: &MouseMoveEvent) -> MoveVerdict {
        // Nested delivery of our own relocation; skip the topology borrow too
        if self.controller.is_suppressing() {
            return MoveVerdict::PassThrough;
        }
        let topology = self.topology.borrow();
        self.controller
            .handle_move(event, &topology, &self.displays, &self.cursor)
    }

    /// Re-enumerate displays; a real change discards the cursor tracking
    pub fn refresh(&self, reason: RefreshReason) -> RefreshOutcome {
        let outcome = match self.topology.try_borrow_mut() {
            Ok(mut topology) => topology.refresh(&self.displays),
            Err(_) => {
                tracing::debug!("Topology busy, {} refresh skipped", reason);
                return RefreshOutcome::Unchanged;
            }
        };

        match outcome {
            Ok(RefreshOutcome::Changed) => {
                tracing::debug!("Topology changed ({}), tracking reset", reason);
                self.controller.reset();
                RefreshOutcome::Changed
            }
            Ok(RefreshOutcome::Unchanged) => RefreshOutcome::Unchanged,
            Err(e) => {
                tracing::warn!("Topology refresh ({}) failed: {}", reason, e);
                RefreshOutcome::Unchanged
            }
        }
    }

    pub fn topology(&self) -> Ref<'_, MonitorTopology> {
        self.topology.borrow()
    }

    pub fn controller(&self) -> &CrossingController {
        &self.controller
    }
}

impl<D: DisplayProvider, C: CursorActuator> EventHandler for Session<D, C> {
    fn on_pointer_move(&self, event: &MouseMoveEvent) -> MoveVerdict {
        self.on_move(event)
    }

    fn on_refresh(&self, reason: RefreshReason) {
        self.refresh(reason);
    }
}
