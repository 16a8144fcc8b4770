use std::sync::Arc;

use glam::Vec3;

use crate::coords::ColorRgba;

use super::ShapeKind;

/// How the index data of a [`Geometry`] is to be assembled into triangles.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Topology {
    /// Explicit index triples.
    Triangles,
    /// Fan around vertex 0 (the hub), closing back onto vertex 1.
    TriangleFan,
}

/// Local-space vertex data for one shape kind.
///
/// Predefined kinds share a single instance through [`GeometryRegistry`];
/// free polygons own a private one that grows as vertices are appended.
///
/// Fan geometries reserve vertex 0 as the hub (the centroid place-holder).
/// It is never a "true" vertex: containment, model coordinates and
/// serialization all start at index 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    /// Closed boundary ring used for 2D containment, as vertex indices.
    outline: Vec<u32>,
    topology: Topology,
    vertex_colors: Option<Vec<ColorRgba>>,
}

impl Geometry {
    /// Unit square in the XY plane, `(0,0)` to `(1,1)`.
    pub fn rectangle() -> Self {
        Self {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            outline: vec![0, 1, 2, 3],
            topology: Topology::Triangles,
            vertex_colors: None,
        }
    }

    /// Isosceles triangle with a unit base on the X axis and apex at `(0.5, 1)`.
    pub fn isosceles_triangle() -> Self {
        Self {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 1.0, 0.0),
            ],
            indices: vec![0, 1, 2],
            outline: vec![0, 1, 2],
            topology: Topology::Triangles,
            vertex_colors: None,
        }
    }

    /// Unit cube centred on the origin. The outline is the front (+Z) face.
    pub fn unit_cube() -> Self {
        let h = 0.5;
        Self {
            vertices: vec![
                // back face (z = -h)
                Vec3::new(-h, -h, -h),
                Vec3::new(h, -h, -h),
                Vec3::new(h, h, -h),
                Vec3::new(-h, h, -h),
                // front face (z = +h)
                Vec3::new(-h, -h, h),
                Vec3::new(h, -h, h),
                Vec3::new(h, h, h),
                Vec3::new(-h, h, h),
            ],
            indices: vec![
                4, 5, 6, 4, 6, 7, // front
                1, 0, 3, 1, 3, 2, // back
                0, 4, 7, 0, 7, 3, // left
                5, 1, 2, 5, 2, 6, // right
                7, 6, 2, 7, 2, 3, // top
                0, 1, 5, 0, 5, 4, // bottom
            ],
            outline: vec![4, 5, 6, 7],
            topology: Topology::Triangles,
            vertex_colors: None,
        }
    }

    /// Unit cube carrying one color per corner.
    pub fn colored_cube() -> Self {
        let mut cube = Self::unit_cube();
        cube.vertex_colors = Some(
            cube.vertices
                .iter()
                .map(|v| ColorRgba::new(v.x + 0.5, v.y + 0.5, v.z + 0.5, 1.0))
                .collect(),
        );
        cube
    }

    /// Fan geometry from vertices already expressed relative to their centroid.
    ///
    /// # Panics
    /// Panics if fewer than 3 vertices are given.
    pub fn polygon_fan(relative: &[Vec3]) -> Self {
        assert!(
            relative.len() >= 3,
            "a polygon needs at least 3 vertices, got {}",
            relative.len()
        );
        let mut vertices = Vec::with_capacity(relative.len() + 1);
        vertices.push(Vec3::ZERO);
        vertices.extend_from_slice(relative);
        let mut geometry = Self {
            vertices,
            indices: Vec::new(),
            outline: Vec::new(),
            topology: Topology::TriangleFan,
            vertex_colors: None,
        };
        geometry.rebuild_fan_topology();
        geometry
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Every stored vertex, including a fan hub.
    #[inline]
    pub fn raw_vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Vertices that belong to the shape's boundary or body (fan hub skipped).
    #[inline]
    pub fn true_vertices(&self) -> &[Vec3] {
        match self.topology {
            Topology::Triangles => &self.vertices,
            Topology::TriangleFan => &self.vertices[1..],
        }
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn outline(&self) -> &[u32] {
        &self.outline
    }

    #[inline]
    pub fn vertex_colors(&self) -> Option<&[ColorRgba]> {
        self.vertex_colors.as_deref()
    }

    /// Mean of the true vertices.
    pub fn centroid(&self) -> Vec3 {
        let verts = self.true_vertices();
        if verts.is_empty() {
            return Vec3::ZERO;
        }
        verts.iter().copied().sum::<Vec3>() / verts.len() as f32
    }

    /// Triangle list as index triples into [`raw_vertices`](Self::raw_vertices).
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect()
    }

    /// Appends a fan vertex, returning the centroid shift it caused.
    ///
    /// All stored vertices are re-centred so the hub stays at the origin.
    pub(crate) fn push_fan_vertex(&mut self, local: Vec3) -> Vec3 {
        debug_assert_eq!(self.topology, Topology::TriangleFan);
        self.vertices.push(local);
        let delta = self.centroid();
        for v in &mut self.vertices[1..] {
            *v -= delta;
        }
        self.rebuild_fan_topology();
        delta
    }

    fn rebuild_fan_topology(&mut self) {
        let n = self.vertices.len() as u32;
        self.outline = (1..n).collect();
        self.indices.clear();
        for i in 1..n - 1 {
            self.indices.extend_from_slice(&[0, i, i + 1]);
        }
        // Close the fan back onto the first rim vertex.
        self.indices.extend_from_slice(&[0, n - 1, 1]);
    }
}

/// Shared geometry for every predefined shape kind.
///
/// One registry is created by the application and handed to whatever builds
/// shapes (editor, scene reader, kinematic models). Cloning a handle out of
/// it is an `Arc` bump.
#[derive(Debug, Clone)]
pub struct GeometryRegistry {
    rectangle: Arc<Geometry>,
    isosceles_triangle: Arc<Geometry>,
    colored_cube: Arc<Geometry>,
    textured_cube: Arc<Geometry>,
}

impl Default for GeometryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryRegistry {
    pub fn new() -> Self {
        Self {
            rectangle: Arc::new(Geometry::rectangle()),
            isosceles_triangle: Arc::new(Geometry::isosceles_triangle()),
            colored_cube: Arc::new(Geometry::colored_cube()),
            textured_cube: Arc::new(Geometry::unit_cube()),
        }
    }

    /// Shared geometry for `kind`, or `None` for [`ShapeKind::Polygon`].
    pub fn shared(&self, kind: ShapeKind) -> Option<Arc<Geometry>> {
        match kind {
            ShapeKind::Polygon => None,
            ShapeKind::Rectangle => Some(Arc::clone(&self.rectangle)),
            ShapeKind::IsoscelesTriangle => Some(Arc::clone(&self.isosceles_triangle)),
            ShapeKind::ColoredCube => Some(Arc::clone(&self.colored_cube)),
            ShapeKind::TexturedCube => Some(Arc::clone(&self.textured_cube)),
        }
    }
}
