use glam::Vec3;

use crate::scene::ShapeId;

/// One reversible edit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Operation {
    /// A predefined shape was added.
    AddPredefined(ShapeId),
    /// A free polygon was completed.
    FinishPolygon(ShapeId),
    /// `shape` was translated by `delta`.
    Move { shape: ShapeId, delta: Vec3 },
    /// `shape` was rotated by `delta` degrees per axis.
    Rotate { shape: ShapeId, delta: Vec3 },
}

impl Operation {
    #[inline]
    pub fn shape(&self) -> ShapeId {
        match *self {
            Self::AddPredefined(id) | Self::FinishPolygon(id) => id,
            Self::Move { shape, .. } | Self::Rotate { shape, .. } => shape,
        }
    }

    /// Whether the operation brought its shape into existence.
    ///
    /// Discarding such an operation from the redo stack orphans the shape.
    #[inline]
    pub fn creates_shape(&self) -> bool {
        matches!(self, Self::AddPredefined(_) | Self::FinishPolygon(_))
    }
}
