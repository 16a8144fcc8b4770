use glam::Vec2;

/// Smallest extent a drag box is given along either axis.
const MIN_DRAG_EXTENT: f32 = 1.0;

/// Converts a drag from `start` to `end` into `(center, half_extent)`.
///
/// Each axis extent is raised to at least one unit so a click without
/// movement still yields a usable box.
pub fn drag_region(start: Vec2, end: Vec2) -> (Vec2, Vec2) {
    let center = (start + end) * 0.5;
    let extent = (end - start).abs().max(Vec2::splat(MIN_DRAG_EXTENT));
    (center, extent * 0.5)
}
