use glam::Vec3;

use crate::coords::ColorRgba;
use crate::scene::{GeometryRegistry, Pose, ShapeKind, ShapeModel};

use super::error::SceneParseError;
use super::{parse_kind_tag, BLOCK_HEADER, POLYGON_BEGIN, POLYGON_END};

/// Parses a whole scene file.
///
/// Any malformed block fails the whole read; no partial scene is returned.
/// Textures are not persisted, so textured cubes come back unbound.
pub fn read_scene(
    text: &str,
    registry: &GeometryRegistry,
) -> Result<Vec<ShapeModel>, SceneParseError> {
    let mut reader = SceneReader::new(text);
    let mut shapes = Vec::new();
    loop {
        reader.skip_blank();
        if reader.peek().is_none() {
            break;
        }
        shapes.push(reader.read_block(registry)?);
    }
    log::debug!("parsed {} shapes from {} lines", shapes.len(), reader.lines.len());
    Ok(shapes)
}

// ── Reader ────────────────────────────────────────────────────────────────

struct SceneReader<'s> {
    lines: Vec<&'s str>,
    pos: usize,
}

impl<'s> SceneReader<'s> {
    fn new(text: &'s str) -> Self {
        Self { lines: text.lines().collect(), pos: 0 }
    }

    /// 1-based number of the line `peek` would return.
    fn line_no(&self) -> usize {
        self.pos + 1
    }

    fn peek(&self) -> Option<&'s str> {
        self.lines.get(self.pos).map(|l| l.trim())
    }

    fn advance(&mut self) -> Option<&'s str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    fn err(&self, msg: impl Into<String>) -> SceneParseError {
        SceneParseError::new(msg, self.line_no())
    }

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(str::is_empty) {
            self.pos += 1;
        }
    }

    /// Consumes the next line, failing at end of input.
    fn expect_line(&mut self, what: &str) -> Result<&'s str, SceneParseError> {
        match self.peek() {
            Some(line) => {
                self.pos += 1;
                Ok(line)
            }
            None => Err(self.err(format!("unexpected end of file, expected {what}"))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), SceneParseError> {
        let line = self.expect_line(keyword)?;
        if line == keyword {
            Ok(())
        } else {
            Err(SceneParseError::new(
                format!("expected `{keyword}`, got `{line}`"),
                self.pos,
            ))
        }
    }

    /// Reads `N` numbers from the next line. Extra fields are ignored with a
    /// warning; missing or non-numeric ones are an error.
    fn expect_numbers<const N: usize>(&mut self, what: &str) -> Result<[f32; N], SceneParseError> {
        let line = self.expect_line(what)?;
        let line_no = self.pos;

        let mut out = [0.0f32; N];
        let mut fields = line.split_whitespace();
        for (i, slot) in out.iter_mut().enumerate() {
            let Some(field) = fields.next() else {
                return Err(SceneParseError::new(
                    format!("expected {N} numbers for {what}, got {i}"),
                    line_no,
                ));
            };
            *slot = field.parse().map_err(|_| {
                SceneParseError::new(format!("invalid number `{field}` in {what}"), line_no)
            })?;
        }

        let extra = fields.count();
        if extra > 0 {
            log::warn!("line {line_no}: ignoring {extra} extra field(s) after {what}");
        }
        Ok(out)
    }

    fn expect_vec3(&mut self, what: &str) -> Result<Vec3, SceneParseError> {
        self.expect_numbers::<3>(what).map(Vec3::from_array)
    }

    fn expect_color(&mut self) -> Result<ColorRgba, SceneParseError> {
        self.expect_numbers::<4>("color").map(ColorRgba::from_array)
    }

    // ── Blocks ────────────────────────────────────────────────────────────

    fn read_block(&mut self, registry: &GeometryRegistry) -> Result<ShapeModel, SceneParseError> {
        let start = self.line_no();
        self.expect_keyword(BLOCK_HEADER)?;

        let tag = self.expect_line("shape kind")?;
        let Some(kind) = parse_kind_tag(tag) else {
            return Err(SceneParseError::new(format!("unknown shape kind `{tag}`"), self.pos));
        };

        let shape = match kind {
            ShapeKind::Polygon => self.read_polygon(start)?,
            _ => self.read_predefined(registry, kind, start)?,
        };
        log::trace!("line {start}: read {kind:?}");
        Ok(shape)
    }

    fn read_predefined(
        &mut self,
        registry: &GeometryRegistry,
        kind: ShapeKind,
        start: usize,
    ) -> Result<ShapeModel, SceneParseError> {
        let pose = Pose {
            position: self.expect_vec3("position")?,
            rotation: self.expect_vec3("rotation")?,
            scale: self.expect_vec3("scale")?,
        };

        // Colored cubes carry per-vertex colors; their color line is checked
        // and dropped.
        let color = self.expect_color()?;

        if kind == ShapeKind::TexturedCube {
            log::warn!("line {start}: textured cube loaded without a texture binding");
        }
        Ok(ShapeModel::predefined(registry, kind, pose, color))
    }

    fn read_polygon(&mut self, start: usize) -> Result<ShapeModel, SceneParseError> {
        self.expect_keyword(POLYGON_BEGIN)?;

        let mut points = Vec::new();
        loop {
            match self.peek() {
                Some(POLYGON_END) => {
                    self.advance();
                    break;
                }
                Some(_) => points.push(self.expect_vec3("polygon vertex")?),
                None => return Err(self.err(format!("missing `{POLYGON_END}`"))),
            }
        }
        if points.len() < 3 {
            return Err(SceneParseError::new(
                format!("polygon needs at least 3 vertices, got {}", points.len()),
                start,
            ));
        }

        let rotation = self.expect_vec3("rotation")?;
        let color = self.expect_color()?;

        let mut shape = ShapeModel::polygon(&points, color);
        shape.pose.rotation = rotation;
        Ok(shape)
    }
}
