//! Display topology tracking
//!
//! Holds the current set of connected displays in a canonical order, together
//! with a signature string that makes "did anything actually change?" a single
//! string comparison.

use std::fmt::Write as _;

use serde::Serialize;
use thiserror::Error;

use super::{Point, Rect};
use crate::input::{DisplayId, DisplayInfo, DisplayProvider, InputError};

/// Maximum device-name length kept per display
pub const DEVICE_NAME_CAPACITY: usize = 32;

/// Topology errors
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("No displays detected")]
    NoDisplays,

    #[error("Display enumeration failed: {0}")]
    Enumeration(#[from] InputError),
}

/// One connected display, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorRecord {
    /// OS-assigned identity, only meaningful until the next refresh
    pub id: DisplayId,
    pub rect: Rect,
    pub primary: bool,
    pub device_name: String,
}

impl MonitorRecord {
    pub fn new(id: DisplayId, rect: Rect, primary: bool, device_name: &str) -> Self {
        Self {
            id,
            rect,
            primary,
            device_name: device_name.chars().take(DEVICE_NAME_CAPACITY).collect(),
        }
    }
}

impl From<DisplayInfo> for MonitorRecord {
    fn from(info: DisplayInfo) -> Self {
        Self::new(info.id, info.rect, info.primary, &info.device_name)
    }
}

/// Outcome of a topology refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Unchanged,
    Changed,
}

/// A canonically ordered set of displays plus its signature
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopologySnapshot {
    monitors: Vec<MonitorRecord>,
    signature: String,
}

impl TopologySnapshot {
    /// Sort `monitors` into canonical order and compute the signature
    pub fn new(mut monitors: Vec<MonitorRecord>) -> Self {
        monitors.sort_by(|a, b| {
            a.device_name
                .cmp(&b.device_name)
                .then(a.rect.left.cmp(&b.rect.left))
                .then(a.rect.top.cmp(&b.rect.top))
                .then(a.rect.right.cmp(&b.rect.right))
                .then(a.rect.bottom.cmp(&b.rect.bottom))
                .then(a.primary.cmp(&b.primary))
        });
        let signature = build_signature(&monitors);
        Self {
            monitors,
            signature,
        }
    }

    pub fn monitors(&self) -> &[MonitorRecord] {
        &self.monitors
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Encode every record's geometry, primary flag and device name.
///
/// Numeric fields are comma-separated and the name is length-prefixed, so no
/// two distinct records can produce the same text. Callers must pass records
/// in canonical order.
pub fn build_signature(monitors: &[MonitorRecord]) -> String {
    let mut signature = String::with_capacity(monitors.len() * 48);
    for m in monitors {
        let _ = write!(
            signature,
            "{},{},{},{},{},{}:{};",
            m.rect.left,
            m.rect.top,
            m.rect.right,
            m.rect.bottom,
            u8::from(m.primary),
            m.device_name.len(),
            m.device_name
        );
    }
    signature
}

/// Tracks the connected displays and detects real configuration changes
#[derive(Debug, Default)]
pub struct MonitorTopology {
    snapshot: TopologySnapshot,
    initialized: bool,
}

impl MonitorTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-enumerate displays and replace the held snapshot if it differs.
    ///
    /// An empty or failed enumeration is an error on the first call. Later it
    /// is logged and the previous snapshot is kept.
    pub fn refresh(
        &mut self,
        provider: &dyn DisplayProvider,
    ) -> Result<RefreshOutcome, TopologyError> {
        let displays = match provider.enumerate() {
            Ok(displays) => displays,
            Err(e) if self.initialized => {
                tracing::warn!("Display enumeration failed, keeping previous topology: {}", e);
                return Ok(RefreshOutcome::Unchanged);
            }
            Err(e) => return Err(e.into()),
        };

        if displays.is_empty() {
            if !self.initialized {
                return Err(TopologyError::NoDisplays);
            }
            tracing::warn!("Display enumeration returned no displays, keeping previous topology");
            return Ok(RefreshOutcome::Unchanged);
        }

        let fresh = TopologySnapshot::new(displays.into_iter().map(MonitorRecord::from).collect());
        if self.initialized && fresh.signature == self.snapshot.signature {
            return Ok(RefreshOutcome::Unchanged);
        }

        tracing::info!("Monitors refreshed ({} detected)", fresh.monitors.len());
        for m in &fresh.monitors {
            tracing::debug!(
                "  {} {}{}",
                m.device_name,
                m.rect,
                if m.primary { " primary" } else { "" }
            );
        }

        self.snapshot = fresh;
        self.initialized = true;
        Ok(RefreshOutcome::Changed)
    }

    /// Find the record for a display identity from the current snapshot
    pub fn lookup(&self, id: DisplayId) -> Option<&MonitorRecord> {
        self.snapshot.monitors.iter().find(|m| m.id == id)
    }

    /// Find the display whose rectangle contains `p`
    pub fn monitor_at(&self, p: Point) -> Option<&MonitorRecord> {
        self.snapshot.monitors.iter().find(|m| m.rect.contains(p))
    }

    pub fn snapshot(&self) -> &TopologySnapshot {
        &self.snapshot
    }

    pub fn signature(&self) -> &str {
        &self.snapshot.signature
    }

    pub fn len(&self) -> usize {
        self.snapshot.monitors.len()
    }
}
