//! Proportional edge remapping
//!
//! Converts a position along the exit edge of one display into the
//! corresponding position just inside the entry edge of its neighbour.

use super::{Edge, Point, Rect};

/// Map `hit_coord` on `edge` of `source` onto the facing edge of `dest`.
///
/// The fraction along the full source extent is carried onto the full
/// destination extent, then inset by one pixel so the result lands strictly
/// inside `dest`. Returns `None` when the two rectangles do not share any of
/// the axis running along `edge`, or either extent is empty.
pub fn remap(source: &Rect, dest: &Rect, edge: Edge, hit_coord: f64) -> Option<Point> {
    let (src_start, src_end) = source.extent_along(edge);
    let (dst_start, dst_end) = dest.extent_along(edge);

    // Overlap only proves adjacency; it does not feed the mapped value
    let overlap = src_end.min(dst_end) - src_start.max(dst_start);
    let src_len = src_end - src_start;
    let dst_len = dst_end - dst_start;
    if overlap <= 0 || src_len <= 0 || dst_len <= 0 {
        return None;
    }

    let pct = ((hit_coord - f64::from(src_start)) / f64::from(src_len)).clamp(0.0, 1.0);
    let offset = (pct * f64::from(dst_len)).round() as i32;
    let mapped = (dst_start + offset).max(dst_start + 1).min(dst_end - 2);

    let point = match edge {
        Edge::Right => Point::new(dest.left + 1, mapped),
        Edge::Left => Point::new(dest.right - 2, mapped),
        Edge::Bottom => Point::new(mapped, dest.top + 1),
        Edge::Top => Point::new(mapped, dest.bottom - 2),
    };
    Some(point)
}
