use glam::{Mat4, Vec3};

use crate::coords::ColorRgba;
use crate::scene::{GeometryRegistry, Pose, ShapeKind, ShapeModel, TextureRef};

/// Joint of every bone in its own local space: the centre of the unit cube's
/// base.
pub const BONE_JOINT: Vec3 = Vec3::new(0.0, -0.5, 0.0);

/// Largest picking id a model hands out unless told otherwise.
///
/// Equal to the top of the 24-bit picking space so node ids stay clear of the
/// low indices the draw-list picking pass uses.
pub const DEFAULT_ID_CEILING: u32 = (1 << 24) - 1;

/// Arena handle of a node inside one [`ArticulatedModel`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId(usize);

/// One bone of an articulated model.
#[derive(Debug, Clone)]
pub struct BoneNode {
    /// The drawable cube. Its `pose.scale` is the bone's size; position and
    /// rotation are driven by the tree, not by the pose.
    pub bone: ShapeModel,
    /// Local joint rotation in degrees, applied about the bone's base.
    pub rotation: Vec3,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Fixed point in the parent's local space this joint hangs from.
    joint_anchor: Vec3,
    id: u32,
}

impl BoneNode {
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn joint_anchor(&self) -> Vec3 {
        self.joint_anchor
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.bone.pose.scale
    }
}

/// Tree of bones with forward kinematics.
#[derive(Debug, Clone)]
pub struct ArticulatedModel {
    registry: GeometryRegistry,
    /// `None` marks a destroyed slot. Slots are not reused.
    nodes: Vec<Option<BoneNode>>,
    root: NodeId,
    id_ceiling: u32,
    issued: u32,
}

impl ArticulatedModel {
    /// Creates a model holding only its root bone.
    pub fn new(
        registry: &GeometryRegistry,
        root_scale: Vec3,
        root_rotation: Vec3,
        texture: Option<TextureRef>,
    ) -> Self {
        Self::with_id_ceiling(registry, DEFAULT_ID_CEILING, root_scale, root_rotation, texture)
    }

    /// Like [`new`](Self::new) with an explicit largest id.
    ///
    /// Several models picked in the same pass need disjoint id ranges; give
    /// each its own ceiling.
    pub fn with_id_ceiling(
        registry: &GeometryRegistry,
        id_ceiling: u32,
        root_scale: Vec3,
        root_rotation: Vec3,
        texture: Option<TextureRef>,
    ) -> Self {
        let mut model = Self {
            registry: registry.clone(),
            nodes: Vec::new(),
            root: NodeId(0),
            id_ceiling,
            issued: 0,
        };
        let root = model.push_node(None, Vec3::ZERO, root_scale, root_rotation, texture);
        model.root = root;
        model
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Always `false`: the root cannot be destroyed through the model.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// # Panics
    /// Panics if `node` was destroyed or belongs to another model.
    pub fn node(&self, node: NodeId) -> &BoneNode {
        match self.nodes.get(node.0) {
            Some(Some(n)) => n,
            _ => panic!("{node:?} is not a live node of this model"),
        }
    }

    /// # Panics
    /// Panics if `node` was destroyed or belongs to another model.
    pub fn node_mut(&mut self, node: NodeId) -> &mut BoneNode {
        match self.nodes.get_mut(node.0) {
            Some(Some(n)) => n,
            _ => panic!("{node:?} is not a live node of this model"),
        }
    }

    /// Editable joint rotation (degrees).
    #[inline]
    pub fn rotation_mut(&mut self, node: NodeId) -> &mut Vec3 {
        &mut self.node_mut(node).rotation
    }

    /// Adds a bone under `parent`.
    ///
    /// `joint_height` picks the anchor along the parent: `0` is the parent's
    /// own joint (its base), `1` its top.
    ///
    /// # Panics
    /// Panics if `joint_height` is outside `[0, 1]` or the id space below the
    /// ceiling is exhausted.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        joint_height: f32,
        scale: Vec3,
        rotation: Vec3,
        texture: Option<TextureRef>,
    ) -> NodeId {
        assert!(
            (0.0..=1.0).contains(&joint_height),
            "joint height must be in [0, 1], got {joint_height}"
        );
        let parent_height = self.node(parent).scale().y;
        let base = BONE_JOINT;
        let top = BONE_JOINT + Vec3::new(0.0, parent_height, 0.0);
        let anchor = base.lerp(top, joint_height);

        let child = self.push_node(Some(parent), anchor, scale, rotation, texture);
        self.node_mut(parent).children.push(child);
        child
    }

    /// Joint frame of `node` in model space.
    ///
    /// Root: `R(rotation) · T(-joint)`. Child:
    /// `parent · T(anchor) · R(rotation) · T(-joint)`.
    pub fn model_matrix(&self, node: NodeId) -> Mat4 {
        let n = self.node(node);
        let local = rotation_matrix(n.rotation) * Mat4::from_translation(-BONE_JOINT);
        match n.parent {
            None => local,
            Some(parent) => {
                self.model_matrix(parent) * Mat4::from_translation(n.joint_anchor) * local
            }
        }
    }

    /// Transform to draw `node`'s cube: its joint frame with the bone's scale
    /// applied about the base.
    pub fn bone_transform(&self, node: NodeId) -> Mat4 {
        self.model_matrix(node)
            * Mat4::from_translation(BONE_JOINT)
            * Mat4::from_scale(self.node(node).scale())
            * Mat4::from_translation(-BONE_JOINT)
    }

    /// Depth-first walk from `start`, parents before children, siblings in
    /// insertion order.
    ///
    /// The iterator borrows the model; to mutate while visiting, collect the
    /// ids first.
    pub fn traverse(&self, start: NodeId) -> Traverse<'_> {
        Traverse { model: self, stack: vec![start] }
    }

    /// Every live node reachable from the root.
    pub fn traverse_all(&self) -> Traverse<'_> {
        self.traverse(self.root)
    }

    /// Node holding picking id `id`, if any.
    pub fn find_by_id(&self, id: u32) -> Option<NodeId> {
        self.traverse_all().find(|n| self.node(*n).id == id)
    }

    /// Flips the selection of the bone with picking id `id`.
    ///
    /// Returns `false` when no live node has that id.
    pub fn toggle_selected_by_id(&mut self, id: u32) -> bool {
        match self.find_by_id(id) {
            Some(node) => {
                let bone = &mut self.node_mut(node).bone;
                bone.selected = !bone.selected;
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.bone.selected = false;
        }
    }

    /// Destroys everything below `node`, deepest first. `node` itself stays.
    pub fn destroy_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.destroy_children(child);
            self.nodes[child.0] = None;
        }
    }

    fn push_node(
        &mut self,
        parent: Option<NodeId>,
        joint_anchor: Vec3,
        scale: Vec3,
        rotation: Vec3,
        texture: Option<TextureRef>,
    ) -> NodeId {
        assert!(
            self.issued < self.id_ceiling,
            "articulated model ran out of ids below {}",
            self.id_ceiling
        );
        self.issued += 1;
        let id = self.id_ceiling - self.issued + 1;

        let pose = Pose { scale, ..Pose::default() };
        let bone = match texture {
            Some(tex) => ShapeModel::textured_cube(&self.registry, pose, ColorRgba::bone(), tex),
            None => ShapeModel::predefined(&self.registry, ShapeKind::ColoredCube, pose, ColorRgba::bone()),
        };

        let handle = NodeId(self.nodes.len());
        self.nodes.push(Some(BoneNode {
            bone,
            rotation,
            parent,
            children: Vec::new(),
            joint_anchor,
            id,
        }));
        log::debug!("bone {id} inserted under {parent:?}");
        handle
    }
}

fn rotation_matrix(degrees: Vec3) -> Mat4 {
    Mat4::from_rotation_x(degrees.x.to_radians())
        * Mat4::from_rotation_y(degrees.y.to_radians())
        * Mat4::from_rotation_z(degrees.z.to_radians())
}

/// Pre-order iterator returned by [`ArticulatedModel::traverse`].
#[derive(Debug)]
pub struct Traverse<'a> {
    model: &'a ArticulatedModel,
    stack: Vec<NodeId>,
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        // Reverse so the first child is visited first.
        self.stack.extend(self.model.node(next).children.iter().rev().copied());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx_mat(a: Mat4, b: Mat4) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    fn arm() -> (ArticulatedModel, NodeId, NodeId) {
        let reg = GeometryRegistry::new();
        let mut model = ArticulatedModel::new(&reg, Vec3::new(1.0, 2.0, 1.0), Vec3::ZERO, None);
        let root = model.root();
        let child = model.insert_child(root, 1.0, Vec3::new(0.5, 1.5, 0.5), Vec3::new(0.0, 0.0, 90.0), None);
        (model, root, child)
    }

    // ── forward kinematics ────────────────────────────────────────────────

    #[test]
    fn root_matrix_lifts_base_to_origin() {
        let (model, root, _) = arm();
        let m = model.model_matrix(root);
        assert!(m.transform_point3(BONE_JOINT).length() < EPS);
    }

    #[test]
    fn child_at_top_chains_under_root() {
        let (model, _, child) = arm();
        // Root is 2 units tall and unrotated, so its top sits at y = 2.
        let anchor_at_top = Vec3::new(0.0, 2.0, 0.0);
        let expected = Mat4::from_translation(anchor_at_top)
            * Mat4::from_rotation_z(90f32.to_radians())
            * Mat4::from_translation(-BONE_JOINT);
        assert!(approx_mat(model.model_matrix(child), expected));
    }

    #[test]
    fn child_follows_root_rotation() {
        let (mut model, root, child) = arm();
        *model.rotation_mut(root) = Vec3::new(0.0, 0.0, 90.0);
        // The child's joint rides the top of the rotated root: (-2, 0, 0).
        let joint = model.model_matrix(child).transform_point3(BONE_JOINT);
        assert!((joint - Vec3::new(-2.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn anchor_interpolates_along_parent() {
        let (mut model, root, _) = arm();
        let mid = model.insert_child(root, 0.5, Vec3::ONE, Vec3::ZERO, None);
        assert!((model.node(mid).joint_anchor() - Vec3::new(0.0, 0.5, 0.0)).length() < EPS);
        let base = model.insert_child(root, 0.0, Vec3::ONE, Vec3::ZERO, None);
        assert_eq!(model.node(base).joint_anchor(), BONE_JOINT);
    }

    #[test]
    fn bone_transform_scales_about_base() {
        let (model, root, _) = arm();
        let t = model.bone_transform(root);
        let top = t.transform_point3(Vec3::new(0.0, 0.5, 0.0));
        assert!((top - Vec3::new(0.0, 2.0, 0.0)).length() < EPS);
    }

    #[test]
    #[should_panic(expected = "joint height")]
    fn joint_height_out_of_range_panics() {
        let (mut model, root, _) = arm();
        model.insert_child(root, 1.5, Vec3::ONE, Vec3::ZERO, None);
    }

    // ── ids and traversal ─────────────────────────────────────────────────

    #[test]
    fn ids_descend_from_ceiling() {
        let reg = GeometryRegistry::new();
        let mut model = ArticulatedModel::with_id_ceiling(&reg, 100, Vec3::ONE, Vec3::ZERO, None);
        let root = model.root();
        let a = model.insert_child(root, 1.0, Vec3::ONE, Vec3::ZERO, None);
        let b = model.insert_child(a, 1.0, Vec3::ONE, Vec3::ZERO, None);
        assert_eq!(model.node(root).id(), 100);
        assert_eq!(model.node(a).id(), 99);
        assert_eq!(model.node(b).id(), 98);
    }

    #[test]
    fn traversal_is_preorder_in_insertion_order() {
        let (mut model, root, child) = arm();
        let sibling = model.insert_child(root, 0.5, Vec3::ONE, Vec3::ZERO, None);
        let grandchild = model.insert_child(child, 1.0, Vec3::ONE, Vec3::ZERO, None);
        let order: Vec<NodeId> = model.traverse_all().collect();
        assert_eq!(order, vec![root, child, grandchild, sibling]);
    }

    #[test]
    fn toggle_by_id_during_lookup() {
        let (mut model, _, child) = arm();
        let id = model.node(child).id();
        assert!(model.toggle_selected_by_id(id));
        assert!(model.node(child).bone.selected);
        assert!(!model.toggle_selected_by_id(12));
    }

    #[test]
    fn destroy_children_keeps_node_and_never_reuses_ids() {
        let (mut model, root, child) = arm();
        let grandchild = model.insert_child(child, 1.0, Vec3::ONE, Vec3::ZERO, None);
        let old_id = model.node(grandchild).id();

        model.destroy_children(root);
        assert_eq!(model.len(), 1);
        assert!(model.node(root).children().is_empty());
        assert_eq!(model.traverse_all().count(), 1);

        let fresh = model.insert_child(root, 1.0, Vec3::ONE, Vec3::ZERO, None);
        assert!(model.node(fresh).id() < old_id);
    }

    #[test]
    fn textured_bones_bind_their_texture() {
        let reg = GeometryRegistry::new();
        let tex = TextureRef { id: 3, slot: 1 };
        let model = ArticulatedModel::new(&reg, Vec3::ONE, Vec3::ZERO, Some(tex));
        let bone = &model.node(model.root()).bone;
        assert_eq!(bone.kind(), ShapeKind::TexturedCube);
        assert_eq!(bone.texture(), Some(tex));
    }
}
