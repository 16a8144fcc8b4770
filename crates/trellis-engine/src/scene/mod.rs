//! Shape entities and the container that orders them.
//!
//! Responsibilities:
//! - shape data model (kind, shared or owned geometry, pose, color, flags)
//! - 2D containment and region queries
//! - paint order, z-order promotion and the undo/redo appliers

mod geometry;
mod hit;
mod list;
mod shape;

pub use geometry::{Geometry, GeometryRegistry, Topology};
pub use hit::{on_segment, point_in_ring, EDGE_EPSILON};
pub use list::{DrawItem, DrawList, ShapeId};
pub use shape::{bounding_cube, BoundingCube, Pose, ShapeKind, ShapeModel, TextureRef};
