//! 2D containment primitives shared by shapes and the draw list.
//!
//! Convention: the boundary is inclusive. A point lying on an edge or a
//! vertex (within [`EDGE_EPSILON`]) is inside.

use glam::Vec2;

/// Tolerance for the on-edge test, in world units.
pub const EDGE_EPSILON: f32 = 1e-5;

/// Crossing-number point-in-polygon test over a closed ring.
///
/// Only edges that straddle the horizontal line through `point` are counted,
/// using the half-open rule `(a.y > p.y) != (b.y > p.y)`. Horizontal edges
/// therefore never produce a crossing and a vertex shared by two edges is
/// counted once. Points on the boundary are caught by an explicit on-segment
/// check before counting.
pub fn point_in_ring(point: Vec2, ring: &[Vec2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[j];
        let b = ring[i];

        if on_segment(point, a, b) {
            return true;
        }

        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// True when `p` lies on the closed segment `a..b`.
pub fn on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    let ab = b - a;
    let len = ab.length();
    if len <= EDGE_EPSILON {
        return p.distance(a) <= EDGE_EPSILON;
    }
    // Distance from the supporting line.
    if (ab.perp_dot(p - a) / len).abs() > EDGE_EPSILON {
        return false;
    }
    p.x >= a.x.min(b.x) - EDGE_EPSILON
        && p.x <= a.x.max(b.x) + EDGE_EPSILON
        && p.y >= a.y.min(b.y) - EDGE_EPSILON
        && p.y <= a.y.max(b.y) + EDGE_EPSILON
}
