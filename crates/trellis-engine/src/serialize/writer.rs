use std::io::{self, Write};

use glam::Vec3;

use crate::coords::ColorRgba;
use crate::scene::{DrawList, ShapeKind, ShapeModel};

use super::{kind_tag, BLOCK_HEADER, POLYGON_BEGIN, POLYGON_END};

/// Colour line written for kinds that carry no shape colour.
const PLACEHOLDER_COLOR: ColorRgba = ColorRgba::white();

/// Writes every visible shape of `list`, in draw order.
pub fn write_scene<W: Write>(out: &mut W, list: &DrawList) -> io::Result<()> {
    let mut written = 0usize;
    for (_, shape) in list.iter_visible() {
        write_shape(out, shape)?;
        written += 1;
    }
    log::debug!("wrote {written} of {} shapes", list.len());
    Ok(())
}

/// [`write_scene`] into a `String`.
pub fn scene_to_string(list: &DrawList) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_scene(&mut buf, list);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_shape<W: Write>(out: &mut W, shape: &ShapeModel) -> io::Result<()> {
    writeln!(out, "{BLOCK_HEADER}")?;
    writeln!(out, "\t{}", kind_tag(shape.kind()))?;

    let pose = &shape.pose;
    match shape.kind() {
        ShapeKind::Polygon => {
            writeln!(out, "\t{POLYGON_BEGIN}")?;
            // Translated only: the rotation line below is applied again on load.
            for v in shape.geometry().true_vertices() {
                write_vec3(out, *v + pose.position)?;
            }
            writeln!(out, "\t{POLYGON_END}")?;
            write_vec3(out, pose.rotation)?;
        }
        _ => {
            write_vec3(out, pose.position)?;
            write_vec3(out, pose.rotation)?;
            write_vec3(out, pose.scale)?;
        }
    }

    let c = shape.color.unwrap_or(PLACEHOLDER_COLOR);
    writeln!(out, "\t{} {} {} {}", c.r, c.g, c.b, c.a)
}

fn write_vec3<W: Write>(out: &mut W, v: Vec3) -> io::Result<()> {
    writeln!(out, "\t{} {} {}", v.x, v.y, v.z)
}
