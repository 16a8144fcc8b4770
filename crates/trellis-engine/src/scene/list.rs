use core::fmt;

use glam::{Vec2, Vec3};

use super::hit::point_in_ring;
use super::ShapeModel;

/// Stable handle to a shape owned by a [`DrawList`].
///
/// Handles come from a per-list counter and are never reused by that list,
/// so a stale handle can be detected instead of aliasing a newer shape.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ShapeId(u32);

impl ShapeId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// A shape together with its handle.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub id: ShapeId,
    pub shape: ShapeModel,
}

/// Ordered collection of shapes.
///
/// Order is paint order: later items are drawn on top, so 2D queries walk the
/// list tail-to-head to find the frontmost shape. This relies on an
/// orthographic view where depth does not reorder overlapping flat shapes.
///
/// Queries are linear in the number of shapes; there is no acceleration
/// structure.
///
/// # Panics
/// Every method taking a [`ShapeId`] that must be present (`remove`,
/// `promote_to_front`, `index_of`, the undo/redo appliers) panics when the id
/// is absent. Those are caller contract violations.
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
    next_id: u32,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `shape` and appends it (frontmost).
    pub fn add(&mut self, shape: ShapeModel) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .expect("DrawList exhausted its shape id space");
        log::debug!("add {id} ({:?})", shape.kind());
        self.items.push(DrawItem { id, shape });
        id
    }

    /// Removes and drops the shape.
    pub fn remove(&mut self, id: ShapeId) -> ShapeModel {
        let index = self.index_of(id);
        log::debug!("remove {id}");
        self.items.remove(index).shape
    }

    /// Moves the shape to the end of the paint order.
    pub fn promote_to_front(&mut self, id: ShapeId) {
        let index = self.index_of(id);
        let item = self.items.remove(index);
        self.items.push(item);
    }

    /// Position of `id` in paint order.
    pub fn index_of(&self, id: ShapeId) -> usize {
        match self.position(id) {
            Some(i) => i,
            None => panic!("{id} is not in this draw list"),
        }
    }

    #[inline]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.position(id).is_some()
    }

    #[inline]
    pub fn get(&self, id: ShapeId) -> Option<&ShapeModel> {
        self.position(id).map(|i| &self.items[i].shape)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut ShapeModel> {
        self.position(id).map(|i| &mut self.items[i].shape)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in paint order (back to front), hidden ones included.
    #[inline]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    /// Shapes in paint order, hidden ones included.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &ShapeModel)> {
        self.items.iter().map(|it| (it.id, &it.shape))
    }

    /// Visible shapes in paint order.
    pub fn iter_visible(&self) -> impl Iterator<Item = (ShapeId, &ShapeModel)> {
        self.iter().filter(|(_, s)| !s.hidden)
    }

    /// Frontmost visible shape containing `point`.
    pub fn frontmost_hit(&self, point: Vec2) -> Option<ShapeId> {
        self.items
            .iter()
            .rev()
            .filter(|it| !it.shape.hidden)
            .find(|it| it.shape.contains_2d(point))
            .map(|it| it.id)
    }

    /// Visible shapes overlapping the axis-aligned region around `center`.
    ///
    /// A shape matches when one of its true vertices lies inside the region or
    /// one of the region's corners lies inside the shape. This is a vertex
    /// test, not polygon intersection: two shapes crossing like a plus sign
    /// with no vertex inside each other are not reported, and a region that
    /// only catches a far-away vertex of a long shape does select it.
    pub fn entities_within(&self, center: Vec2, half_extent: Vec2) -> Vec<ShapeId> {
        let half = half_extent.abs();
        let region = [
            center + Vec2::new(-half.x, -half.y),
            center + Vec2::new(half.x, -half.y),
            center + Vec2::new(half.x, half.y),
            center + Vec2::new(-half.x, half.y),
        ];

        self.items
            .iter()
            .filter(|it| !it.shape.hidden)
            .filter(|it| {
                let shape = &it.shape;
                shape
                    .model_coords()
                    .iter()
                    .any(|v| point_in_ring(v.truncate(), &region))
                    || region.iter().any(|c| shape.contains_2d(*c))
            })
            .map(|it| it.id)
            .collect()
    }

    // ── selection ─────────────────────────────────────────────────────────

    pub fn selected_ids(&self) -> Vec<ShapeId> {
        self.iter_visible()
            .filter(|(_, s)| s.selected)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn clear_selection(&mut self) {
        for it in &mut self.items {
            it.shape.selected = false;
        }
    }

    /// Clears the selection, then selects each of `ids`.
    pub fn select_only(&mut self, ids: &[ShapeId]) {
        for it in &mut self.items {
            it.shape.selected = ids.contains(&it.id);
        }
    }

    pub fn toggle_selected(&mut self, id: ShapeId) {
        let shape = self.expect_mut(id);
        shape.selected = !shape.selected;
    }

    // ── undo / redo appliers ──────────────────────────────────────────────
    //
    // Additions are soft: undo hides the shape, redo shows the same instance
    // again. Transforms replay deltas; they do not restore snapshots.

    pub fn undo_add(&mut self, id: ShapeId) {
        self.expect_mut(id).hidden = true;
    }

    pub fn redo_add(&mut self, id: ShapeId) {
        self.expect_mut(id).hidden = false;
    }

    pub fn undo_finish_polygon(&mut self, id: ShapeId) {
        self.expect_mut(id).hidden = true;
    }

    pub fn redo_finish_polygon(&mut self, id: ShapeId) {
        self.expect_mut(id).hidden = false;
    }

    pub fn undo_move(&mut self, id: ShapeId, delta: Vec3) {
        self.expect_mut(id).pose.position -= delta;
    }

    pub fn redo_move(&mut self, id: ShapeId, delta: Vec3) {
        self.expect_mut(id).pose.position += delta;
    }

    pub fn undo_rotate(&mut self, id: ShapeId, delta: Vec3) {
        self.expect_mut(id).pose.rotation -= delta;
    }

    pub fn redo_rotate(&mut self, id: ShapeId, delta: Vec3) {
        self.expect_mut(id).pose.rotation += delta;
    }

    /// Drops every shape.
    ///
    /// Geometry here is CPU-side; GPU buffers derived from it belong to the
    /// renderers, which must be torn down while their device is alive.
    pub fn shutdown(&mut self) {
        log::debug!("draw list shutdown ({} shapes)", self.items.len());
        self.items.clear();
    }

    fn position(&self, id: ShapeId) -> Option<usize> {
        self.items.iter().position(|it| it.id == id)
    }

    fn expect_mut(&mut self, id: ShapeId) -> &mut ShapeModel {
        let index = self.index_of(id);
        &mut self.items[index].shape
    }
}
