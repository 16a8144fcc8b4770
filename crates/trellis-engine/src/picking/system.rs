use std::sync::mpsc;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::coords::Viewport;
use crate::kinematic::ArticulatedModel;
use crate::render::RenderCtx;
use crate::scene::{DrawList, ShapeId, ShapeModel};

use super::codec::{index_to_color, rgb_to_index, BACKGROUND_INDEX, MAX_PICK_INDEX};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct PickVertex {
    pub pos: [f32; 3],
    pub color: [f32; 4],
}

impl PickVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // world position
        1 => Float32x4  // encoded index
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PickVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Appends the world-space triangles of `shape`, transformed by `transform`,
/// flat-colored with `index`.
///
/// Fan geometry (free polygons) is expanded around its hub; predefined kinds
/// use their index lists.
pub(crate) fn push_shape_triangles(
    out: &mut Vec<PickVertex>,
    shape: &ShapeModel,
    transform: Mat4,
    index: u32,
) {
    let color = index_to_color(index);
    let geometry = shape.geometry();
    let verts = geometry.raw_vertices();
    for tri in geometry.triangles() {
        for i in tri {
            let p = transform.transform_point3(verts[i as usize]);
            out.push(PickVertex { pos: p.to_array(), color });
        }
    }
}

/// Off-screen color + depth target.
struct PickTarget {
    size: Viewport,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl PickTarget {
    fn new(device: &wgpu::Device, size: Viewport) -> Self {
        let size = size.clamped();
        let extent = wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("trellis pick color"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("trellis pick depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            size,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            _depth: depth,
        }
    }
}

/// GPU color-coded picking.
///
/// Each pass renders every visible shape into an off-screen id-buffer with its
/// 1-based position among the visible shapes encoded as a flat color. Reading
/// one pixel back then names the shape under the cursor.
///
/// Indices are only meaningful for the pass that produced them; resolve them
/// through [`resolve_shape`](Self::resolve_shape) before the list changes.
///
/// Passes are submitted and read back synchronously on the calling thread.
/// Do not resize between a pass and its readback.
#[derive(Default)]
pub struct PickingSystem {
    target: Option<PickTarget>,
    pending_size: Option<Viewport>,

    pipeline: Option<wgpu::RenderPipeline>,
    bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,

    readback: Option<wgpu::Buffer>,

    /// `table[i]` is the shape drawn with index `i + 1` in the last pass.
    table: Vec<ShapeId>,
}

impl PickingSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a new target size; storage is reallocated before the next pass.
    pub fn on_screen_resize(&mut self, width: u32, height: u32) {
        log::debug!("pick target resize to {width}x{height}");
        self.pending_size = Some(Viewport::new(width, height));
    }

    /// Size of the current target, if one has been allocated.
    pub fn target_size(&self) -> Option<Viewport> {
        self.target.as_ref().map(|t| t.size)
    }

    /// Clears the id-buffer and draws every visible shape of `list`.
    pub fn on_update(&mut self, ctx: &RenderCtx<'_>, list: &DrawList, view_proj: Mat4) {
        let mut vertices = Vec::new();
        self.table.clear();
        for (id, shape) in list.iter_visible() {
            let index = self.table.len() as u32 + 1;
            if index > MAX_PICK_INDEX {
                log::warn!("more than {MAX_PICK_INDEX} shapes; the rest are not pickable");
                break;
            }
            push_shape_triangles(&mut vertices, shape, shape.transform(), index);
            self.table.push(id);
        }
        self.draw(ctx, &vertices, view_proj, true);
    }

    /// Draws the bones of `model` on top of the current id-buffer, each encoded
    /// with its node id. Call after [`on_update`](Self::on_update) in the same
    /// frame; map hits back with [`ArticulatedModel::find_by_id`].
    pub fn draw_model(&mut self, ctx: &RenderCtx<'_>, model: &ArticulatedModel, view_proj: Mat4) {
        let mut vertices = Vec::new();
        for node in model.traverse_all() {
            let bone = model.node(node);
            if bone.bone.hidden {
                continue;
            }
            push_shape_triangles(&mut vertices, &bone.bone, model.bone_transform(node), bone.id());
        }
        self.draw(ctx, &vertices, view_proj, false);
    }

    /// Shape drawn with `index` during the last [`on_update`](Self::on_update).
    pub fn resolve_shape(&self, index: u32) -> Option<ShapeId> {
        if index == BACKGROUND_INDEX {
            return None;
        }
        self.table.get(index as usize - 1).copied()
    }

    /// Decodes the id-buffer pixel at window coordinate `(x, y)`.
    ///
    /// Returns `Ok(None)` for background or for coordinates outside the
    /// target. Blocks until the GPU has finished the copy.
    pub fn read_index_at(&mut self, ctx: &RenderCtx<'_>, x: u32, y: u32) -> Result<Option<u32>> {
        let Some(target) = self.target.as_ref() else {
            log::debug!("read_index_at before any pass");
            return Ok(None);
        };
        if !target.size.contains(x, y) {
            return Ok(None);
        }

        let readback = self.readback.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("trellis pick readback"),
                size: u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("trellis pick readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.color,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
        );
        ctx.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..4);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        let mapped = loop {
            ctx.device
                .poll(wgpu::PollType::Poll)
                .context("device poll failed during pick readback")?;
            match rx.try_recv() {
                Ok(res) => break res,
                Err(mpsc::TryRecvError::Empty) => std::thread::yield_now(),
                Err(mpsc::TryRecvError::Disconnected) => {
                    anyhow::bail!("pick readback callback dropped")
                }
            }
        };
        mapped.context("failed to map pick readback buffer")?;

        let index = {
            let data = slice.get_mapped_range();
            rgb_to_index([data[0], data[1], data[2]])
        };
        readback.unmap();

        Ok((index != BACKGROUND_INDEX).then_some(index))
    }

    /// Reads the pixel and resolves it against the last draw-list pass.
    pub fn shape_at(&mut self, ctx: &RenderCtx<'_>, x: u32, y: u32) -> Result<Option<ShapeId>> {
        Ok(self.read_index_at(ctx, x, y)?.and_then(|i| self.resolve_shape(i)))
    }

    fn draw(&mut self, ctx: &RenderCtx<'_>, vertices: &[PickVertex], view_proj: Mat4, clear: bool) {
        self.ensure_target(ctx);
        self.ensure_pipeline(ctx);
        self.write_camera(ctx, view_proj);
        if !vertices.is_empty() {
            self.ensure_vbo_capacity(ctx, vertices.len());
        }

        let Some(target) = self.target.as_ref() else { return };
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };

        if let Some(vbo) = self.vbo.as_ref() {
            if !vertices.is_empty() {
                ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(vertices));
            }
        }

        let (color_load, depth_load) = if clear {
            (wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT), wgpu::LoadOp::Clear(1.0))
        } else {
            (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
        };

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("trellis pick encoder"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("trellis pick pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: color_load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let (false, Some(vbo)) = (vertices.is_empty(), self.vbo.as_ref()) {
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, bind_group, &[]);
                rpass.set_vertex_buffer(0, vbo.slice(..));
                rpass.draw(0..vertices.len() as u32, 0..1);
            }
        }
        // The pass is closed before submit; readback issues its own submit after.
        ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn ensure_target(&mut self, ctx: &RenderCtx<'_>) {
        let wanted = self
            .pending_size
            .take()
            .or_else(|| self.target.as_ref().map(|t| t.size))
            .unwrap_or(ctx.viewport)
            .clamped();
        if self.target.as_ref().is_some_and(|t| t.size == wanted) {
            return;
        }
        self.target = Some(PickTarget::new(ctx.device, wanted));
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("trellis pick shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pick.wgsl").into()),
        });

        let camera_size = std::mem::size_of::<CameraUniform>() as u64;
        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("trellis pick bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(camera_size),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("trellis pick pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("trellis pick pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[PickVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    // Ids must land unblended.
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let camera_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trellis pick camera ubo"),
            size: camera_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trellis pick bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            }],
        });

        self.pipeline = Some(pipeline);
        self.camera_ubo = Some(camera_ubo);
        self.bind_group = Some(bind_group);
    }

    fn write_camera(&mut self, ctx: &RenderCtx<'_>, view_proj: Mat4) {
        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        let u = CameraUniform { view_proj: view_proj.to_cols_array_2d() };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }

    fn ensure_vbo_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(256);
        self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trellis pick vbo"),
            size: (new_cap * std::mem::size_of::<PickVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = new_cap;
    }
}
