//! Line-oriented text encoding of a scene.
//!
//! Each visible shape becomes one block:
//!
//! ```text
//! ShapeModel
//! 	RECTANGLE
//! 	<px> <py> <pz>
//! 	<rx> <ry> <rz>
//! 	<sx> <sy> <sz>
//! 	<r> <g> <b> <a>
//! ```
//!
//! Free polygons (`NONE`) replace position and scale with a `BEGIN`/`END`
//! list of vertices, one per line. Each vertex is the polygon's position plus
//! its local offset: translated into the world but not rotated. The rotation
//! line that follows is applied on load, so for a rotated polygon these are
//! not its world coordinates; for an unrotated one they are.
//!
//! Numbers use `f32`'s `Display`, which is locale independent and
//! round-trips exactly.

mod error;
mod reader;
mod writer;

pub use error::SceneParseError;
pub use reader::read_scene;
pub use writer::{scene_to_string, write_scene};

use crate::scene::ShapeKind;

pub(crate) const BLOCK_HEADER: &str = "ShapeModel";
pub(crate) const POLYGON_BEGIN: &str = "BEGIN";
pub(crate) const POLYGON_END: &str = "END";

pub(crate) fn kind_tag(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Polygon => "NONE",
        ShapeKind::Rectangle => "RECTANGLE",
        ShapeKind::IsoscelesTriangle => "ISOSCELES_TRIANGLE",
        ShapeKind::ColoredCube => "COLORED_CUBE",
        ShapeKind::TexturedCube => "TEXTURED_CUBE",
    }
}

pub(crate) fn parse_kind_tag(tag: &str) -> Option<ShapeKind> {
    Some(match tag {
        "NONE" => ShapeKind::Polygon,
        "RECTANGLE" => ShapeKind::Rectangle,
        "ISOSCELES_TRIANGLE" => ShapeKind::IsoscelesTriangle,
        "COLORED_CUBE" => ShapeKind::ColoredCube,
        "TEXTURED_CUBE" => ShapeKind::TexturedCube,
        _ => return None,
    })
}
