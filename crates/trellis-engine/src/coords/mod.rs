//! Small value types shared across the scene, picking and render layers.
//!
//! World-space geometry uses `glam` vectors directly:
//! - +X right, +Y up, +Z towards the viewer
//! - 2D shapes live in the XY plane
//!
//! Window-space coordinates (picking) use physical pixels with origin top-left.

mod color;
mod viewport;

pub use color::ColorRgba;
pub use viewport::Viewport;
