use std::collections::VecDeque;

use crate::scene::{DrawList, ShapeId};

use super::Operation;

/// Number of operations kept when no capacity is given.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Sizing for [`UndoRedoStack`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Operations kept on the undo side before the oldest is dropped.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_HISTORY_CAPACITY }
    }
}

/// Undo stack of the most recent operations plus the redo stack they feed.
///
/// The undo side is a ring: once full, recording drops the oldest entry.
#[derive(Debug)]
pub struct UndoRedoStack {
    undo: VecDeque<Operation>,
    redo: Vec<Operation>,
    capacity: usize,
}

impl Default for UndoRedoStack {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl UndoRedoStack {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be at least 1");
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: Vec::new(),
            capacity,
        }
    }

    pub fn from_config(config: HistoryConfig) -> Self {
        Self::with_capacity(config.capacity)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[inline]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[inline]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &Operation> {
        self.undo.iter()
    }

    /// Records an operation that has already been applied to `list`.
    ///
    /// Invalidates the redo stack. Shapes that only a discarded redo entry
    /// could bring back are removed from `list` for good, except the target
    /// of `op` itself, which the new entry still refers to.
    pub fn record(&mut self, op: Operation, list: &mut DrawList) {
        if self.undo.len() == self.capacity {
            let evicted = self.undo.pop_front();
            log::debug!("history full; evicted {evicted:?}");
        }
        self.undo.push_back(op);
        self.drop_redo(list, Some(op.shape()));
    }

    /// Reverts the most recent operation. No-op when there is nothing to undo.
    pub fn undo(&mut self, list: &mut DrawList) {
        let Some(op) = self.undo.pop_back() else { return };
        match op {
            Operation::AddPredefined(id) => list.undo_add(id),
            Operation::FinishPolygon(id) => list.undo_finish_polygon(id),
            Operation::Move { shape, delta } => list.undo_move(shape, delta),
            Operation::Rotate { shape, delta } => list.undo_rotate(shape, delta),
        }
        self.redo.push(op);
    }

    /// Re-applies the most recently undone operation. No-op when empty.
    pub fn redo(&mut self, list: &mut DrawList) {
        let Some(op) = self.redo.pop() else { return };
        match op {
            Operation::AddPredefined(id) => list.redo_add(id),
            Operation::FinishPolygon(id) => list.redo_finish_polygon(id),
            Operation::Move { shape, delta } => list.redo_move(shape, delta),
            Operation::Rotate { shape, delta } => list.redo_rotate(shape, delta),
        }
        // Redo never overflows: the entry came off a stack that fit.
        self.undo.push_back(op);
    }

    /// Forgets both stacks without touching any shape.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Forgets both stacks, first removing the shapes only a redo entry could
    /// have brought back.
    pub fn reset(&mut self, list: &mut DrawList) {
        self.drop_redo(list, None);
        self.undo.clear();
    }

    fn drop_redo(&mut self, list: &mut DrawList, keep: Option<ShapeId>) {
        for stale in self.redo.drain(..) {
            let id = stale.shape();
            if stale.creates_shape() && Some(id) != keep && list.contains(id) {
                log::debug!("dropping unreachable {id}");
                list.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::coords::ColorRgba;
    use crate::scene::{GeometryRegistry, Pose, ShapeKind, ShapeModel};

    fn setup() -> (DrawList, ShapeId) {
        let reg = GeometryRegistry::new();
        let mut list = DrawList::new();
        let id = list.add(ShapeModel::predefined(
            &reg,
            ShapeKind::Rectangle,
            Pose::rest(ShapeKind::Rectangle),
            ColorRgba::white(),
        ));
        (list, id)
    }

    fn nudge(shape: ShapeId, x: f32) -> Operation {
        Operation::Move { shape, delta: Vec3::new(x, 0.0, 0.0) }
    }

    // ── inverse law ───────────────────────────────────────────────────────

    #[test]
    fn move_undo_redo_round_trips_position() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::new();
        let before = list.get(id).unwrap().pose.position;
        let delta = Vec3::new(3.0, -2.0, 0.5);

        list.get_mut(id).unwrap().pose.position += delta;
        history.record(Operation::Move { shape: id, delta }, &mut list);
        let after = list.get(id).unwrap().pose.position;

        history.undo(&mut list);
        assert_eq!(list.get(id).unwrap().pose.position, before);
        history.redo(&mut list);
        assert_eq!(list.get(id).unwrap().pose.position, after);
    }

    #[test]
    fn rotate_undo_subtracts_delta() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::new();
        let delta = Vec3::new(0.0, 0.0, 90.0);
        list.get_mut(id).unwrap().pose.rotation += delta;
        history.record(Operation::Rotate { shape: id, delta }, &mut list);
        history.undo(&mut list);
        assert_eq!(list.get(id).unwrap().pose.rotation, Vec3::ZERO);
    }

    #[test]
    fn undo_after_external_edit_does_not_restore_snapshot() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::new();
        let start = list.get(id).unwrap().pose.position;
        list.get_mut(id).unwrap().pose.position.x += 1.0;
        history.record(nudge(id, 1.0), &mut list);

        // Some other path moves the shape without recording.
        list.get_mut(id).unwrap().pose.position.x += 10.0;
        history.undo(&mut list);
        assert_eq!(list.get(id).unwrap().pose.position.x, start.x + 10.0);
    }

    // ── bound ─────────────────────────────────────────────────────────────

    #[test]
    fn keeps_only_the_last_five() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::new();
        for i in 1..=6 {
            history.record(nudge(id, i as f32), &mut list);
        }
        assert_eq!(history.undo_len(), 5);
        assert_eq!(history.undo_entries().next(), Some(&nudge(id, 2.0)));

        for _ in 0..5 {
            history.undo(&mut list);
        }
        assert!(!history.can_undo());
        assert_eq!(history.redo_len(), 5);
        // The evicted first move (x + 1) is never undone.
        let x = list.get(id).unwrap().pose.position.x;
        assert_eq!(x, 0.5 - (2.0 + 3.0 + 4.0 + 5.0 + 6.0));
    }

    #[test]
    fn configured_capacity_bounds_the_stack() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::from_config(HistoryConfig { capacity: 2 });
        for i in 1..=4 {
            history.record(nudge(id, i as f32), &mut list);
        }
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.undo_entries().next(), Some(&nudge(id, 3.0)));
    }

    #[test]
    fn undo_and_redo_on_empty_are_noops() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::new();
        history.undo(&mut list);
        history.redo(&mut list);
        assert!(list.get(id).is_some());
        assert!(!history.can_undo() && !history.can_redo());
    }

    // ── redo invalidation ─────────────────────────────────────────────────

    #[test]
    fn recording_drops_shapes_only_redo_could_restore() {
        let reg = GeometryRegistry::new();
        let (mut list, other) = setup();
        let mut history = UndoRedoStack::new();

        let added = list.add(ShapeModel::predefined(
            &reg,
            ShapeKind::IsoscelesTriangle,
            Pose::rest(ShapeKind::IsoscelesTriangle),
            ColorRgba::black(),
        ));
        history.record(Operation::AddPredefined(added), &mut list);
        history.undo(&mut list);
        assert!(list.get(added).unwrap().hidden);

        history.record(nudge(other, 1.0), &mut list);
        assert!(!list.contains(added));
        assert!(!history.can_redo());

        history.redo(&mut list);
        assert!(!list.contains(added));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn discarded_moves_leave_shapes_alive() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::new();
        history.record(nudge(id, 1.0), &mut list);
        history.undo(&mut list);
        history.record(nudge(id, 2.0), &mut list);
        assert!(list.contains(id));
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn recording_against_an_undone_shape_keeps_it() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::new();
        history.record(Operation::AddPredefined(id), &mut list);
        history.undo(&mut list);

        list.get_mut(id).unwrap().pose.position.x += 1.0;
        history.record(nudge(id, 1.0), &mut list);
        assert!(list.contains(id));
        history.undo(&mut list);
        assert_eq!(list.get(id).unwrap().pose.position.x, 0.5);
    }

    #[test]
    fn reset_drops_shapes_only_redo_could_restore() {
        let reg = GeometryRegistry::new();
        let (mut list, kept) = setup();
        let mut history = UndoRedoStack::new();
        let added = list.add(ShapeModel::predefined(
            &reg,
            ShapeKind::Rectangle,
            Pose::default(),
            ColorRgba::white(),
        ));
        history.record(Operation::AddPredefined(added), &mut list);
        history.undo(&mut list);

        history.reset(&mut list);
        assert!(!list.contains(added));
        assert!(list.contains(kept));
        assert!(!history.can_undo() && !history.can_redo());
    }

    #[test]
    fn clear_touches_nothing() {
        let (mut list, id) = setup();
        let mut history = UndoRedoStack::new();
        history.record(Operation::AddPredefined(id), &mut list);
        history.undo(&mut list);
        history.clear();
        assert!(list.contains(id));
        assert!(list.get(id).unwrap().hidden);
        assert!(!history.can_undo() && !history.can_redo());
    }
}
