//! Screen geometry module
//!
//! Handles:
//! - Virtual-screen geometry primitives (points, display rectangles, edges)
//! - Display topology tracking and change detection
//! - Exit-edge detection for cursor movement segments
//! - Proportional remapping from one display edge to another

mod edge_detector;
mod mapper;
mod topology;

pub use edge_detector::find_exit_edge;
pub use mapper::remap;
pub use topology::{MonitorTopology, RefreshOutcome, TopologyError};

use serde::{Deserialize, Serialize};

/// A position in virtual-screen integer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A display rectangle in virtual-screen coordinates.
///
/// `right` and `bottom` are exclusive for containment tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from its origin and size
    pub const fn from_origin(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Half-open containment: the right and bottom bounds are outside
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Start and end of the extent that runs along `edge`
    pub fn extent_along(&self, edge: Edge) -> (i32, i32) {
        match edge {
            Edge::Left | Edge::Right => (self.top, self.bottom),
            Edge::Top | Edge::Bottom => (self.left, self.right),
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Rectangle edge identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Edge {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
}

impl Edge {
    /// Left and right edges are crossed by horizontal motion
    pub fn is_horizontal_exit(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Edge::Left => "left",
            Edge::Right => "right",
            Edge::Top => "top",
            Edge::Bottom => "bottom",
        };
        f.write_str(name)
    }
}
