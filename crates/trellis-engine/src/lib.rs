//! Trellis engine crate.
//!
//! This crate owns the scene model and the editing machinery used by the
//! studio front end: shapes and their spatial queries, articulated models,
//! undo history, GPU picking and the scene file format.

pub mod device;
pub mod render;

pub mod logging;
pub mod coords;
pub mod scene;
pub mod kinematic;
pub mod history;
pub mod picking;
pub mod serialize;
pub mod editor;
