//! Editing session tying the scene, its history and the scene file together.
//!
//! The input layer (outside this crate) resolves what the user targeted and
//! calls into [`SceneEditor`]; every single-shape edit made through it is
//! recorded so it can be undone.

mod drag;
mod session;

pub use drag::drag_region;
pub use session::{LoadOutcome, SceneEditor};
