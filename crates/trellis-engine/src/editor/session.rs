use std::io::Write;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};

use crate::coords::ColorRgba;
use crate::history::{HistoryConfig, Operation, UndoRedoStack};
use crate::scene::{
    bounding_cube, BoundingCube, DrawList, GeometryRegistry, Pose, ShapeId, ShapeKind, ShapeModel,
    TextureRef,
};
use crate::serialize::{read_scene, write_scene, SceneParseError};

use super::drag::drag_region;

/// Result of [`SceneEditor::load`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadOutcome {
    /// The scene was replaced by this many shapes.
    Loaded(usize),
    /// The file held no shapes; the current scene was left as it was.
    Empty,
}

/// Free polygon under construction.
///
/// A polygon cannot exist with fewer than three vertices, so the first points
/// are buffered and the shape is built on the third.
#[derive(Debug, Default)]
enum PolygonDraft {
    #[default]
    Idle,
    Points(Vec<Vec3>),
    Shape(ShapeModel),
}

/// One editing session: shared geometry, the draw list, its undo history and
/// the polygon being drawn.
#[derive(Debug)]
pub struct SceneEditor {
    registry: GeometryRegistry,
    list: DrawList,
    history: UndoRedoStack,
    draft: PolygonDraft,
}

impl Default for SceneEditor {
    fn default() -> Self {
        Self::with_history(HistoryConfig::default())
    }
}

impl SceneEditor {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(config: HistoryConfig) -> Self {
        Self {
            registry: GeometryRegistry::new(),
            list: DrawList::new(),
            history: UndoRedoStack::from_config(config),
            draft: PolygonDraft::Idle,
        }
    }

    #[inline]
    pub fn registry(&self) -> &GeometryRegistry {
        &self.registry
    }

    #[inline]
    pub fn list(&self) -> &DrawList {
        &self.list
    }

    /// Direct access for edits that are not meant to be undoable.
    #[inline]
    pub fn list_mut(&mut self) -> &mut DrawList {
        &mut self.list
    }

    #[inline]
    pub fn history(&self) -> &UndoRedoStack {
        &self.history
    }

    // ── creation ──────────────────────────────────────────────────────────

    /// Adds a predefined shape with its pivot at `position`.
    ///
    /// `texture` is only used for [`ShapeKind::TexturedCube`].
    ///
    /// # Panics
    /// Panics for [`ShapeKind::Polygon`].
    pub fn add_predefined(
        &mut self,
        kind: ShapeKind,
        position: Vec3,
        color: ColorRgba,
        texture: Option<TextureRef>,
    ) -> ShapeId {
        let pose = Pose::at(position);
        let shape = match (kind, texture) {
            (ShapeKind::TexturedCube, Some(tex)) => {
                ShapeModel::textured_cube(&self.registry, pose, color, tex)
            }
            (_, tex) => {
                if tex.is_some() {
                    log::warn!("texture ignored for {kind:?}");
                }
                ShapeModel::predefined(&self.registry, kind, pose, color)
            }
        };
        let id = self.list.add(shape);
        self.history.record(Operation::AddPredefined(id), &mut self.list);
        id
    }

    /// Appends a world-space point to the polygon being drawn.
    pub fn add_polygon_point(&mut self, world: Vec3) {
        self.draft = match std::mem::take(&mut self.draft) {
            PolygonDraft::Idle => PolygonDraft::Points(vec![world]),
            PolygonDraft::Points(mut points) => {
                points.push(world);
                if points.len() == 3 {
                    PolygonDraft::Shape(ShapeModel::polygon(&points, ColorRgba::white()))
                } else {
                    PolygonDraft::Points(points)
                }
            }
            PolygonDraft::Shape(mut shape) => {
                shape.push_back_vertex(world);
                PolygonDraft::Shape(shape)
            }
        };
    }

    /// Number of points placed in the polygon being drawn.
    pub fn draft_len(&self) -> usize {
        match &self.draft {
            PolygonDraft::Idle => 0,
            PolygonDraft::Points(points) => points.len(),
            PolygonDraft::Shape(shape) => shape.true_vertex_count(),
        }
    }

    /// Completes the polygon being drawn.
    ///
    /// A draft with fewer than three points is discarded and `None` returned.
    pub fn finish_polygon(&mut self, color: ColorRgba) -> Option<ShapeId> {
        match std::mem::take(&mut self.draft) {
            PolygonDraft::Shape(mut shape) => {
                shape.color = Some(color);
                let id = self.list.add(shape);
                self.history.record(Operation::FinishPolygon(id), &mut self.list);
                Some(id)
            }
            PolygonDraft::Points(points) => {
                log::warn!("discarding polygon with {} point(s)", points.len());
                None
            }
            PolygonDraft::Idle => None,
        }
    }

    // ── transforms ────────────────────────────────────────────────────────

    /// Translates `id` by `delta` and records the move.
    ///
    /// Hidden shapes (an undone add) are left alone and `false` is returned.
    ///
    /// # Panics
    /// Panics if `id` is not in the draw list.
    pub fn move_shape(&mut self, id: ShapeId, delta: Vec3) -> bool {
        if !self.editable(id) {
            return false;
        }
        self.list.redo_move(id, delta);
        self.history.record(Operation::Move { shape: id, delta }, &mut self.list);
        true
    }

    /// Rotates `id` by `delta` degrees per axis and records the rotation.
    ///
    /// Hidden shapes are left alone and `false` is returned.
    ///
    /// # Panics
    /// Panics if `id` is not in the draw list.
    pub fn rotate_shape(&mut self, id: ShapeId, delta: Vec3) -> bool {
        if !self.editable(id) {
            return false;
        }
        self.list.redo_rotate(id, delta);
        self.history.record(Operation::Rotate { shape: id, delta }, &mut self.list);
        true
    }

    fn editable(&self, id: ShapeId) -> bool {
        let Some(shape) = self.list.get(id) else {
            panic!("{id} is not in this draw list");
        };
        if shape.hidden {
            log::warn!("ignoring edit of hidden {id}");
        }
        !shape.hidden
    }

    // ── selection ─────────────────────────────────────────────────────────

    /// Selects the frontmost shape under `point`.
    ///
    /// With `additive`, the hit shape's selection is toggled and the rest is
    /// kept; otherwise the hit replaces the selection (a miss clears it).
    pub fn click_select(&mut self, point: Vec2, additive: bool) -> Option<ShapeId> {
        let hit = self.list.frontmost_hit(point);
        match (hit, additive) {
            (Some(id), true) => self.list.toggle_selected(id),
            (Some(id), false) => self.list.select_only(&[id]),
            (None, true) => {}
            (None, false) => self.list.clear_selection(),
        }
        hit
    }

    /// Selects every shape overlapping the box dragged from `start` to `end`.
    pub fn box_select(&mut self, start: Vec2, end: Vec2, additive: bool) -> Vec<ShapeId> {
        let (center, half_extent) = drag_region(start, end);
        let ids = self.list.entities_within(center, half_extent);
        if additive {
            for &id in &ids {
                if let Some(shape) = self.list.get_mut(id) {
                    shape.selected = true;
                }
            }
        } else {
            self.list.select_only(&ids);
        }
        log::debug!("box select at {center} picked {} shape(s)", ids.len());
        ids
    }

    /// Moves the visible selected shapes to the front, keeping their order.
    pub fn promote_selected_to_front(&mut self) {
        for id in self.list.selected_ids() {
            self.list.promote_to_front(id);
        }
    }

    /// Removes the visible selected shapes for good and forgets the history.
    ///
    /// Shapes hidden by an undone add go too, since nothing can redo them
    /// afterwards. Returns how many selected shapes were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.list.selected_ids();
        for &id in &ids {
            self.list.remove(id);
        }
        if !ids.is_empty() {
            self.history.reset(&mut self.list);
        }
        ids.len()
    }

    // ── history ───────────────────────────────────────────────────────────

    #[inline]
    pub fn undo(&mut self) {
        self.history.undo(&mut self.list);
    }

    #[inline]
    pub fn redo(&mut self) {
        self.history.redo(&mut self.list);
    }

    // ── persistence ───────────────────────────────────────────────────────

    /// Writes the visible shapes in scene-file format.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        write_scene(out, &self.list).context("failed to write scene")?;
        log::info!("saved {} shape(s)", self.list.iter_visible().count());
        Ok(())
    }

    /// Replaces the scene with the shapes parsed from `text`.
    ///
    /// On success the history and any polygon draft are dropped. A file with
    /// no shapes leaves the current scene untouched; a malformed one is an
    /// error and also leaves it untouched.
    pub fn load(&mut self, text: &str) -> Result<LoadOutcome, SceneParseError> {
        let shapes = read_scene(text, &self.registry)?;
        if shapes.is_empty() {
            log::warn!("scene file holds no shapes; keeping the current scene");
            return Ok(LoadOutcome::Empty);
        }

        self.list.shutdown();
        self.history.clear();
        self.draft = PolygonDraft::Idle;

        let count = shapes.len();
        for shape in shapes {
            self.list.add(shape);
        }
        log::info!("loaded {count} shape(s)");
        Ok(LoadOutcome::Loaded(count))
    }

    /// Box around every visible shape.
    pub fn bounds(&self) -> BoundingCube {
        bounding_cube(self.list.iter_visible().map(|(_, s)| s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    fn square_at(editor: &mut SceneEditor, x: f32) -> ShapeId {
        // Rectangle pivot is its centre, so this covers (x-0.5..x+0.5, -0.5..0.5).
        editor.add_predefined(
            ShapeKind::Rectangle,
            Vec3::new(x, 0.0, 0.0),
            ColorRgba::white(),
            None,
        )
    }

    // ── creation ──────────────────────────────────────────────────────────

    #[test]
    fn add_predefined_is_undoable() {
        let mut editor = SceneEditor::new();
        let id = square_at(&mut editor, 0.0);
        assert!(editor.history().can_undo());

        editor.undo();
        assert!(editor.list().get(id).unwrap().hidden);
        editor.redo();
        assert!(!editor.list().get(id).unwrap().hidden);
    }

    #[test]
    fn textured_cube_keeps_its_binding() {
        let mut editor = SceneEditor::new();
        let tex = TextureRef { id: 3, slot: 1 };
        let id = editor.add_predefined(ShapeKind::TexturedCube, Vec3::ZERO, ColorRgba::white(), Some(tex));
        assert_eq!(editor.list().get(id).unwrap().texture(), Some(tex));
    }

    #[test]
    fn polygon_is_built_point_by_point() {
        let mut editor = SceneEditor::new();
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        for p in points {
            editor.add_polygon_point(p);
        }
        assert_eq!(editor.draft_len(), 4);

        let color = ColorRgba::new(0.0, 1.0, 0.0, 1.0);
        let id = editor.finish_polygon(color).unwrap();
        let shape = editor.list().get(id).unwrap();
        assert_eq!(shape.kind(), ShapeKind::Polygon);
        assert_eq!(shape.color, Some(color));
        assert!(approx(shape.pose.position, Vec3::new(1.0, 1.0, 0.0)));
        for (got, want) in shape.model_coords().iter().zip(&points) {
            assert!(approx(*got, *want));
        }
        assert_eq!(editor.draft_len(), 0);

        editor.undo();
        assert!(editor.list().get(id).unwrap().hidden);
    }

    #[test]
    fn short_polygon_draft_is_discarded() {
        let mut editor = SceneEditor::new();
        editor.add_polygon_point(Vec3::ZERO);
        editor.add_polygon_point(Vec3::X);
        assert_eq!(editor.finish_polygon(ColorRgba::white()), None);
        assert!(editor.list().is_empty());
        assert!(!editor.history().can_undo());
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn move_and_rotate_round_trip_through_history() {
        let mut editor = SceneEditor::new();
        let id = square_at(&mut editor, 0.0);
        editor.move_shape(id, Vec3::new(2.0, 1.0, 0.0));
        editor.rotate_shape(id, Vec3::new(0.0, 0.0, 90.0));

        editor.undo();
        editor.undo();
        let pose = editor.list().get(id).unwrap().pose;
        assert_eq!(pose.position, Vec3::ZERO);
        assert_eq!(pose.rotation, Vec3::ZERO);

        editor.redo();
        assert_eq!(editor.list().get(id).unwrap().pose.position, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn edits_of_an_undone_shape_are_refused() {
        let mut editor = SceneEditor::new();
        let id = square_at(&mut editor, 0.0);
        editor.undo();

        assert!(!editor.move_shape(id, Vec3::X));
        assert!(!editor.rotate_shape(id, Vec3::Z));
        assert!(editor.list().contains(id));
        assert_eq!(editor.list().get(id).unwrap().pose.position, Vec3::ZERO);

        editor.redo();
        assert!(!editor.list().get(id).unwrap().hidden);
        assert!(editor.move_shape(id, Vec3::X));
        editor.undo();
        assert_eq!(editor.list().get(id).unwrap().pose.position, Vec3::ZERO);
    }

    // ── selection ─────────────────────────────────────────────────────────

    #[test]
    fn click_select_picks_frontmost() {
        let mut editor = SceneEditor::new();
        let back = square_at(&mut editor, 0.0);
        let front = square_at(&mut editor, 0.25);

        assert_eq!(editor.click_select(Vec2::new(0.1, 0.0), false), Some(front));
        assert_eq!(editor.list().selected_ids(), vec![front]);

        assert_eq!(editor.click_select(Vec2::new(-0.4, 0.0), true), Some(back));
        assert_eq!(editor.list().selected_ids(), vec![back, front]);

        assert_eq!(editor.click_select(Vec2::new(10.0, 10.0), false), None);
        assert!(editor.list().selected_ids().is_empty());
    }

    #[test]
    fn box_select_uses_vertex_overlap() {
        let mut editor = SceneEditor::new();
        let a = square_at(&mut editor, 0.0);
        let _far = square_at(&mut editor, 10.0);
        let picked = editor.box_select(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0), false);
        assert_eq!(picked, vec![a]);
        assert_eq!(editor.list().selected_ids(), vec![a]);
    }

    #[test]
    fn promote_moves_selection_to_the_back_of_the_list() {
        let mut editor = SceneEditor::new();
        let a = square_at(&mut editor, 0.0);
        let b = square_at(&mut editor, 3.0);
        let c = square_at(&mut editor, 6.0);
        editor.list_mut().select_only(&[a, b]);
        editor.promote_selected_to_front();
        let order: Vec<ShapeId> = editor.list().iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![c, a, b]);
    }

    #[test]
    fn delete_selected_clears_history() {
        let mut editor = SceneEditor::new();
        let a = square_at(&mut editor, 0.0);
        let b = square_at(&mut editor, 3.0);
        editor.list_mut().select_only(&[a]);
        assert_eq!(editor.delete_selected(), 1);
        assert!(!editor.list().contains(a));
        assert!(editor.list().contains(b));
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn delete_selected_drops_undone_additions() {
        let mut editor = SceneEditor::new();
        let a = square_at(&mut editor, 0.0);
        let undone = square_at(&mut editor, 3.0);
        editor.undo();
        assert!(editor.list().get(undone).unwrap().hidden);

        editor.list_mut().select_only(&[a]);
        assert_eq!(editor.delete_selected(), 1);
        assert!(!editor.list().contains(undone));
        assert!(editor.list().is_empty());
    }

    // ── persistence ───────────────────────────────────────────────────────

    #[test]
    fn save_then_load_restores_visible_shapes() {
        let mut editor = SceneEditor::new();
        square_at(&mut editor, 0.0);
        let gone = square_at(&mut editor, 5.0);
        editor.undo();
        assert!(editor.list().get(gone).unwrap().hidden);

        let mut buf = Vec::new();
        editor.save(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut other = SceneEditor::new();
        assert_eq!(other.load(&text), Ok(LoadOutcome::Loaded(1)));
        assert_eq!(other.list().len(), 1);
        assert!(!other.history().can_undo());
    }

    #[test]
    fn empty_load_keeps_scene() {
        let mut editor = SceneEditor::new();
        let id = square_at(&mut editor, 0.0);
        assert_eq!(editor.load("\n"), Ok(LoadOutcome::Empty));
        assert!(editor.list().contains(id));
        assert!(editor.history().can_undo());
    }

    #[test]
    fn malformed_load_keeps_scene() {
        let mut editor = SceneEditor::new();
        let id = square_at(&mut editor, 0.0);
        assert!(editor.load("ShapeModel\n\tRECTANGLE\n").is_err());
        assert!(editor.list().contains(id));
    }

    #[test]
    fn bounds_cover_visible_shapes() {
        let mut editor = SceneEditor::new();
        square_at(&mut editor, 0.0);
        square_at(&mut editor, 4.0);
        let b = editor.bounds();
        assert!(approx(b.min, Vec3::new(-0.5, -0.5, 0.0)));
        assert!(approx(b.max, Vec3::new(4.5, 0.5, 0.0)));
    }
}
