use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::{Mat4, Vec3};

use trellis_engine::coords::Viewport;
use trellis_engine::device::{Gpu, GpuInit};
use trellis_engine::editor::{LoadOutcome, SceneEditor};
use trellis_engine::logging::{init_logging, LoggingConfig};
use trellis_engine::picking::PickingSystem;
use trellis_engine::render::RenderCtx;
use trellis_engine::scene::BoundingCube;

/// Inspect a trellis scene file, optionally rewrite it and pick from it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Scene file to load.
    scene: PathBuf,

    /// Write the loaded scene back out to this path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Report the shape under pixel X Y of a headless render.
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    pick: Option<Vec<u32>>,

    /// Picking target size.
    #[arg(long, value_name = "WxH", default_value = "800x600", value_parser = parse_size)]
    size: Viewport,
}

impl Cli {
    fn pick_at(&self) -> Option<(u32, u32)> {
        match self.pick.as_deref() {
            Some(&[x, y]) => Some((x, y)),
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.scene)
        .with_context(|| format!("failed to read scene file {}", cli.scene.display()))?;

    let mut editor = SceneEditor::new();
    match editor
        .load(&text)
        .with_context(|| format!("failed to parse {}", cli.scene.display()))?
    {
        LoadOutcome::Loaded(_) => {}
        LoadOutcome::Empty => {
            log::warn!("{} holds no shapes; nothing to do", cli.scene.display());
            return Ok(());
        }
    }

    summarize(&editor);

    if let Some(out) = &cli.out {
        let file = File::create(out)
            .with_context(|| format!("failed to create {}", out.display()))?;
        editor.save(&mut BufWriter::new(file))?;
        log::info!("wrote {}", out.display());
    }

    if let Some((x, y)) = cli.pick_at() {
        pick(&editor, cli.size, x, y)?;
    }

    Ok(())
}

fn summarize(editor: &SceneEditor) {
    let mut per_kind: BTreeMap<String, usize> = BTreeMap::new();
    for (_, shape) in editor.list().iter_visible() {
        *per_kind.entry(format!("{:?}", shape.kind())).or_default() += 1;
    }
    for (kind, count) in &per_kind {
        log::info!("  {kind}: {count}");
    }

    let b = editor.bounds();
    log::info!("bounds min {} max {} (size {})", b.min, b.max, b.size());
}

fn pick(editor: &SceneEditor, size: Viewport, x: u32, y: u32) -> Result<()> {
    let gpu = Gpu::headless_blocking(GpuInit {
        allow_fallback_adapter: true,
        ..GpuInit::default()
    })?;
    let ctx = RenderCtx::from_gpu(&gpu, size);

    let mut picking = PickingSystem::new();
    picking.on_screen_resize(size.width, size.height);
    picking.on_update(&ctx, editor.list(), fit_camera(editor.bounds(), size));

    match picking.shape_at(&ctx, x, y)? {
        Some(id) => {
            let kind = editor.list().get(id).map(|s| s.kind());
            println!("{x} {y}: {id} {kind:?}");
        }
        None => println!("{x} {y}: background"),
    }
    Ok(())
}

/// Front orthographic view framing `bounds` with a small margin.
fn fit_camera(bounds: BoundingCube, size: Viewport) -> Mat4 {
    let size = size.clamped();
    let aspect = size.width as f32 / size.height as f32;
    let extent = bounds.size();
    let center = bounds.center();

    let half_h = (extent.y * 0.5).max(extent.x * 0.5 / aspect).max(0.5) * 1.1;
    let half_w = half_h * aspect;

    let eye = Vec3::new(center.x, center.y, bounds.max.z + 1.0);
    let view = Mat4::look_at_rh(eye, center, Vec3::Y);
    let proj = Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, 0.0, extent.z + 2.0);
    proj * view
}

fn parse_size(raw: &str) -> Result<Viewport, String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("size must look like 800x600, got `{raw}`"))?;
    let w: u32 = w.parse().map_err(|_| format!("bad width `{w}`"))?;
    let h: u32 = h.parse().map_err(|_| format!("bad height `{h}`"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got `{raw}`"));
    }
    Ok(Viewport::new(w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("trellis-studio").chain(args.iter().copied()))
    }

    // ── arguments ──

    #[test]
    fn scene_only_uses_defaults() {
        let cli = parse(&["scene.txt"]).unwrap();
        assert_eq!(cli.scene, PathBuf::from("scene.txt"));
        assert_eq!(cli.out, None);
        assert_eq!(cli.pick_at(), None);
        assert_eq!(cli.size, Viewport::new(800, 600));
    }

    #[test]
    fn all_options_parse() {
        let cli = parse(&[
            "--size", "640x480", "a.scene", "--pick", "10", "20", "--out", "b.scene",
        ])
        .unwrap();
        assert_eq!(cli.scene, PathBuf::from("a.scene"));
        assert_eq!(cli.out, Some(PathBuf::from("b.scene")));
        assert_eq!(cli.pick_at(), Some((10, 20)));
        assert_eq!(cli.size, Viewport::new(640, 480));
    }

    #[test]
    fn missing_scene_is_an_error() {
        let err = parse(&["--pick", "1", "2"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn pick_needs_two_pixel_coordinates() {
        assert!(parse(&["s", "--pick", "1"]).is_err());
        let err = parse(&["s", "--pick", "a", "2"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn bad_sizes_are_rejected() {
        for size in ["640", "0x480", "640x", "wide x 2"] {
            let err = parse(&["s", "--size", size]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueValidation, "{size}");
        }
        assert_eq!(parse_size("1024X768"), Ok(Viewport::new(1024, 768)));
    }

    #[test]
    fn unknown_flags_and_extra_scenes_are_rejected() {
        assert_eq!(parse(&["s", "--bogus"]).unwrap_err().kind(), ErrorKind::UnknownArgument);
        assert!(parse(&["a.scene", "b.scene"]).is_err());
    }

    // ── camera ──

    #[test]
    fn camera_frames_the_bounds() {
        let bounds = BoundingCube { min: Vec3::new(-2.0, -1.0, 0.0), max: Vec3::new(2.0, 1.0, 0.0) };
        let m = fit_camera(bounds, Viewport::new(400, 200));
        for corner in [bounds.min, bounds.max] {
            let ndc = m.project_point3(corner);
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
            assert!((0.0..=1.0).contains(&ndc.z));
        }
        let c = m.project_point3(bounds.center());
        assert!(c.x.abs() < 1e-5 && c.y.abs() < 1e-5);
    }
}
