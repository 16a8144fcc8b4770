//! Articulated (jointed) models.
//!
//! A model is a static tree of bones built once and never reparented. Each
//! bone is a unit cube whose joint sits at the centre of its base; a child is
//! anchored at a fixed point along its parent's height and rotates about its
//! own joint, under every ancestor's transform.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Each node also
//! carries a numeric `id` for picking, handed out downwards from the model's
//! id ceiling so the root always holds the largest one.

mod model;

pub use model::{ArticulatedModel, BoneNode, NodeId, Traverse, BONE_JOINT, DEFAULT_ID_CEILING};
