use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};

use crate::coords::ColorRgba;

use super::geometry::{Geometry, GeometryRegistry};
use super::hit::point_in_ring;

/// Shape kind tag.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShapeKind {
    /// Free-form polygon drawn vertex by vertex.
    Polygon,
    Rectangle,
    IsoscelesTriangle,
    /// Unit cube colored per vertex; carries no shape color.
    ColoredCube,
    TexturedCube,
}

impl ShapeKind {
    #[inline]
    pub fn is_cube(self) -> bool {
        matches!(self, Self::ColoredCube | Self::TexturedCube)
    }
}

/// Externally managed texture binding: a texture handle plus the slot it is
/// bound to when drawing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureRef {
    pub id: u32,
    pub slot: u32,
}

/// Placement of a shape: translation of its pivot, per-axis rotation in
/// degrees, per-axis scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl Pose {
    #[inline]
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    /// Pose that leaves a predefined kind's local vertices where they are:
    /// the pivot is translated onto itself.
    pub fn rest(kind: ShapeKind) -> Self {
        Self::at(predefined_pivot(kind))
    }

    /// `T(position) · Rx · Ry · Rz · S(scale) · T(-pivot)`.
    pub fn matrix(&self, pivot: Vec3) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_scale(self.scale)
            * Mat4::from_translation(-pivot)
    }
}

/// Rotation/scale pivot of a predefined kind in its local space.
///
/// Flat shapes pivot at their centroid, cubes at the centre of their base.
fn predefined_pivot(kind: ShapeKind) -> Vec3 {
    match kind {
        ShapeKind::Polygon => Vec3::ZERO,
        ShapeKind::Rectangle => Vec3::new(0.5, 0.5, 0.0),
        ShapeKind::IsoscelesTriangle => Vec3::new(0.5, 1.0 / 3.0, 0.0),
        ShapeKind::ColoredCube | ShapeKind::TexturedCube => Vec3::new(0.0, -0.5, 0.0),
    }
}

#[derive(Debug, Clone)]
enum Body {
    Predefined { kind: ShapeKind, geometry: Arc<Geometry> },
    /// Vertices are stored relative to the centroid; `pose.position` is the
    /// centroid in world space.
    Polygon(Geometry),
}

/// One positioned, colored, selectable shape instance.
#[derive(Debug, Clone)]
pub struct ShapeModel {
    body: Body,
    pub pose: Pose,
    /// `None` only for [`ShapeKind::ColoredCube`].
    pub color: Option<ColorRgba>,
    pub selected: bool,
    /// Soft-deleted: kept alive for undo, skipped by drawing, queries,
    /// promotion and serialization.
    pub hidden: bool,
    texture: Option<TextureRef>,
}

impl ShapeModel {
    /// Builds a predefined shape with an explicit pose.
    ///
    /// # Panics
    /// Panics for [`ShapeKind::Polygon`] (use [`polygon`](Self::polygon)).
    pub fn predefined(
        registry: &GeometryRegistry,
        kind: ShapeKind,
        pose: Pose,
        color: ColorRgba,
    ) -> Self {
        let Some(geometry) = registry.shared(kind) else {
            panic!("ShapeModel::predefined called with a polygon kind");
        };
        let color = match kind {
            ShapeKind::ColoredCube => None,
            _ => Some(color),
        };
        Self {
            body: Body::Predefined { kind, geometry },
            pose,
            color,
            selected: false,
            hidden: false,
            texture: None,
        }
    }

    /// Textured unit cube bound to `texture`.
    pub fn textured_cube(
        registry: &GeometryRegistry,
        pose: Pose,
        color: ColorRgba,
        texture: TextureRef,
    ) -> Self {
        let mut shape = Self::predefined(registry, ShapeKind::TexturedCube, pose, color);
        shape.texture = Some(texture);
        shape
    }

    /// Builds a free polygon from world-space points.
    ///
    /// The pose position becomes the centroid of `points`; stored vertices are
    /// relative to it.
    ///
    /// # Panics
    /// Panics if fewer than 3 points are given.
    pub fn polygon(points: &[Vec3], color: ColorRgba) -> Self {
        assert!(
            points.len() >= 3,
            "a free polygon needs at least 3 vertices, got {}",
            points.len()
        );
        let centroid = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        let relative: Vec<Vec3> = points.iter().map(|p| *p - centroid).collect();
        Self {
            body: Body::Polygon(Geometry::polygon_fan(&relative)),
            pose: Pose::at(centroid),
            color: Some(color),
            selected: false,
            hidden: false,
            texture: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match &self.body {
            Body::Predefined { kind, .. } => *kind,
            Body::Polygon(_) => ShapeKind::Polygon,
        }
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        match &self.body {
            Body::Predefined { geometry, .. } => geometry,
            Body::Polygon(geometry) => geometry,
        }
    }

    /// `true` when this shape shares its geometry with every other shape of the
    /// same kind.
    #[inline]
    pub fn shares_geometry(&self) -> bool {
        matches!(self.body, Body::Predefined { .. })
    }

    #[inline]
    pub fn texture(&self) -> Option<TextureRef> {
        self.texture
    }

    /// Rebinds the texture of a textured cube; ignored for every other kind.
    pub fn set_texture(&mut self, texture: Option<TextureRef>) {
        if self.kind() == ShapeKind::TexturedCube {
            self.texture = texture;
        } else {
            log::debug!("set_texture ignored on {:?}", self.kind());
        }
    }

    #[inline]
    pub fn pivot(&self) -> Vec3 {
        predefined_pivot(self.kind())
    }

    /// Local-to-world transform of this shape.
    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.pose.matrix(self.pivot())
    }

    #[inline]
    pub fn true_vertex_count(&self) -> usize {
        self.geometry().true_vertices().len()
    }

    /// World-space positions of every true vertex.
    pub fn model_coords(&self) -> Vec<Vec3> {
        let m = self.transform();
        self.geometry()
            .true_vertices()
            .iter()
            .map(|v| m.transform_point3(*v))
            .collect()
    }

    /// World-space outline ring projected onto the XY plane.
    pub fn outline_world(&self) -> Vec<Vec2> {
        let m = self.transform();
        let geometry = self.geometry();
        let verts = geometry.raw_vertices();
        geometry
            .outline()
            .iter()
            .map(|&i| m.transform_point3(verts[i as usize]).truncate())
            .collect()
    }

    /// Whether `point` lies inside (or on the boundary of) the shape's
    /// projected outline.
    pub fn contains_2d(&self, point: Vec2) -> bool {
        point_in_ring(point, &self.outline_world())
    }

    /// Appends a world-space vertex to a free polygon.
    ///
    /// The point is brought into local space through the inverse pose, the
    /// centroid is recomputed over all true vertices, every stored vertex is
    /// re-centred and `pose.position` follows the centroid. Returns the new
    /// position.
    ///
    /// # Panics
    /// Panics on predefined kinds.
    pub fn push_back_vertex(&mut self, world: Vec3) -> Vec3 {
        let kind = self.kind();
        let inverse = self.transform().inverse();
        let pose = self.pose;
        let Body::Polygon(geometry) = &mut self.body else {
            panic!("push_back_vertex called on predefined kind {kind:?}");
        };

        let local = inverse.transform_point3(world);
        let local_delta = geometry.push_fan_vertex(local);

        // Same rotation the pose applies, without translation.
        let world_delta = Pose { position: Vec3::ZERO, ..pose }
            .matrix(Vec3::ZERO)
            .transform_vector3(local_delta);
        self.pose.position += world_delta;
        self.pose.position
    }
}

/// Axis-aligned box enclosing a set of shapes.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct BoundingCube {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingCube {
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Component-wise min/max over every model coordinate of `shapes`.
///
/// Empty input yields the all-zero box.
pub fn bounding_cube<'a>(shapes: impl IntoIterator<Item = &'a ShapeModel>) -> BoundingCube {
    let mut bounds: Option<BoundingCube> = None;
    for shape in shapes {
        for p in shape.model_coords() {
            bounds = Some(match bounds {
                None => BoundingCube { min: p, max: p },
                Some(b) => BoundingCube { min: b.min.min(p), max: b.max.max(p) },
            });
        }
    }
    bounds.unwrap_or_default()
}
