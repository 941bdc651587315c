use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::canvas::Pixel;
use crate::coords::Viewport;
use crate::error::{EngineError, Result};
use crate::surface::{
    Backend, BlendMode, CompositeDraw, SpriteDraw, SurfaceAccess, SurfaceBackend, SurfaceId,
};

use super::pipeline::{
    Pipelines, QUAD_INDICES, QuadVertex, ViewportUniform, composite_quad, sprite_quad,
};
use super::{Gpu, GpuInit, SurfaceErrorAction};

/// A surface as a sampled texture with its bind group.
struct GpuSurface {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
    access: SurfaceAccess,
}

/// A draw recorded between `begin_frame` and `present`.
struct QueuedDraw {
    surface: SurfaceId,
    blend: BlendMode,
}

/// wgpu implementation of [`Backend`].
///
/// Every surface is a `Bgra8Unorm` texture, so a canvas uploads its pixels
/// without conversion. Draws are recorded as quads and replayed in one
/// render pass at `present`, with a pipeline per blend mode.
pub struct GpuBackend {
    gpu: Option<Gpu>,
    logical: Viewport,

    pipelines: Option<Pipelines>,
    sampler: Option<wgpu::Sampler>,
    viewport_ubo: Option<wgpu::Buffer>,
    viewport_bind_group: Option<wgpu::BindGroup>,
    quad_ibo: Option<wgpu::Buffer>,
    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,

    surfaces: HashMap<SurfaceId, GpuSurface>,
    next_id: u64,

    vertices: Vec<QuadVertex>,
    queued: Vec<QueuedDraw>,
    frame_open: bool,
}

impl GpuBackend {
    /// Creates the presentation context for `window`, composing at
    /// `logical_width` x `logical_height`.
    pub async fn new(
        window: Arc<Window>,
        logical_width: u32,
        logical_height: u32,
        init: GpuInit,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            logical_width > 0 && logical_height > 0,
            "logical resolution {logical_width}x{logical_height} is empty"
        );
        let gpu = Gpu::new(window, init).await?;

        let mut backend = Self {
            gpu: Some(gpu),
            logical: Viewport::new(logical_width as f32, logical_height as f32),
            pipelines: None,
            sampler: None,
            viewport_ubo: None,
            viewport_bind_group: None,
            quad_ibo: None,
            vbo: None,
            vbo_capacity: 0,
            surfaces: HashMap::new(),
            next_id: 1,
            vertices: Vec::new(),
            queued: Vec::new(),
            frame_open: false,
        };
        backend.ensure_pipeline();
        backend.ensure_bindings();
        backend.ensure_static_buffers();
        Ok(backend)
    }

    fn gpu(&self) -> Result<&Gpu> {
        self.gpu
            .as_ref()
            .ok_or(EngineError::InvalidState("gpu backend was shut down"))
    }

    fn ensure_pipeline(&mut self) {
        let Some(gpu) = self.gpu.as_ref() else { return };
        if self
            .pipelines
            .as_ref()
            .is_some_and(|p| p.format == gpu.surface_format())
        {
            return;
        }

        self.pipelines = Some(Pipelines::new(gpu.device(), gpu.surface_format()));
        // Bind groups reference the old layouts.
        self.viewport_bind_group = None;
        self.viewport_ubo = None;
    }

    fn ensure_bindings(&mut self) {
        if self.viewport_bind_group.is_some() && self.sampler.is_some() {
            return;
        }
        let (Some(gpu), Some(pipelines)) = (self.gpu.as_ref(), self.pipelines.as_ref()) else {
            return;
        };
        let device = gpu.device();

        let viewport_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("strata viewport ubo"),
            contents: bytemuck::bytes_of(&ViewportUniform::new(self.logical)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata viewport bind group"),
            layout: &pipelines.viewport_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        // Nearest sampling keeps pixel art crisp and matches the software backend.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("strata surface sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        self.viewport_ubo = Some(viewport_ubo);
        self.viewport_bind_group = Some(bind_group);
        self.sampler = Some(sampler);
    }

    fn ensure_static_buffers(&mut self) {
        if self.quad_ibo.is_some() {
            return;
        }
        let Some(gpu) = self.gpu.as_ref() else { return };

        // Every quad uses the same six indices, offset by its base vertex.
        self.quad_ibo = Some(gpu.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("strata quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_vertex_capacity(&mut self, needed: usize) {
        if needed <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }
        let Some(gpu) = self.gpu.as_ref() else { return };

        let capacity = needed.next_power_of_two().max(64);
        self.vbo = Some(gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata quad vbo"),
            size: (capacity * std::mem::size_of::<QuadVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = capacity;
    }

    fn ensure_frame_open(&self) -> Result<()> {
        if self.frame_open {
            Ok(())
        } else {
            Err(EngineError::InvalidState("draw issued outside begin_frame/present"))
        }
    }

    fn queue_quad(&mut self, surface: SurfaceId, blend: BlendMode, quad: [QuadVertex; 4]) {
        self.vertices.extend_from_slice(&quad);
        self.queued.push(QueuedDraw { surface, blend });
    }

    /// Replays the recorded draws into the acquired frame.
    fn render(&mut self) -> Result<()> {
        self.ensure_pipeline();
        self.ensure_bindings();
        self.ensure_static_buffers();
        self.ensure_vertex_capacity(self.vertices.len());

        let gpu = self.gpu()?;
        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let Some(gpu) = self.gpu.as_mut() else {
                    return Ok(());
                };
                return match gpu.handle_surface_error(err.clone()) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("gpu: fatal surface error: {err}");
                        Err(EngineError::Backend(format!("surface error: {err}")))
                    }
                    action => {
                        log::debug!("gpu: frame dropped ({action:?}): {err}");
                        Ok(())
                    }
                };
            }
        };

        let (Some(pipelines), Some(viewport_bg), Some(ibo), Some(vbo)) = (
            self.pipelines.as_ref(),
            self.viewport_bind_group.as_ref(),
            self.quad_ibo.as_ref(),
            self.vbo.as_ref(),
        ) else {
            return Err(EngineError::InvalidState("gpu pipeline not initialized"));
        };

        if !self.vertices.is_empty() {
            gpu.queue()
                .write_buffer(vbo, 0, bytemuck::cast_slice(&self.vertices));
        }

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, viewport_bg, &[]);
            rpass.set_vertex_buffer(0, vbo.slice(..));
            rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);

            for (i, draw) in self.queued.iter().enumerate() {
                // Destroyed mid-frame; nothing to sample.
                let Some(surface) = self.surfaces.get(&draw.surface) else {
                    continue;
                };
                rpass.set_pipeline(pipelines.get(draw.blend));
                rpass.set_bind_group(1, &surface.bind_group, &[]);
                rpass.draw_indexed(0..6, (i * 4) as i32, 0..1);
            }
        }

        gpu.submit(frame);
        Ok(())
    }
}

impl SurfaceBackend for GpuBackend {
    fn create_surface(
        &mut self,
        width: u32,
        height: u32,
        access: SurfaceAccess,
    ) -> Result<SurfaceId> {
        if width == 0 || height == 0 {
            return Err(EngineError::dimensions(width as i64, height as i64));
        }
        self.ensure_pipeline();
        self.ensure_bindings();

        let gpu = self.gpu()?;
        let (Some(pipelines), Some(sampler)) = (self.pipelines.as_ref(), self.sampler.as_ref())
        else {
            return Err(EngineError::InvalidState("gpu pipeline not initialized"));
        };

        let limit = gpu.device().limits().max_texture_dimension_2d;
        if width > limit || height > limit {
            return Err(EngineError::ResourceCreation {
                what: "surface",
                reason: format!("{width}x{height} exceeds the device limit of {limit}"),
            });
        }

        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(match access {
                SurfaceAccess::Streaming => "strata streaming surface",
                SurfaceAccess::Static => "strata static surface",
            }),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Bgra8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata surface bind group"),
            layout: &pipelines.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(
            id,
            GpuSurface {
                texture,
                bind_group,
                width,
                height,
                access,
            },
        );
        log::trace!("gpu: created {id} ({width}x{height}, {access:?})");
        Ok(id)
    }

    fn destroy_surface(&mut self, id: SurfaceId) -> bool {
        match self.surfaces.remove(&id) {
            Some(surface) => {
                surface.texture.destroy();
                log::trace!("gpu: destroyed {id} ({:?})", surface.access);
                true
            }
            None => false,
        }
    }

    fn upload(&mut self, id: SurfaceId, pixels: &[Pixel]) -> Result<()> {
        let gpu = self.gpu()?;
        let surface = self.surfaces.get(&id).ok_or(EngineError::UnknownSurface(id))?;
        if pixels.len() != surface.width as usize * surface.height as usize {
            return Err(EngineError::InvalidArgument(format!(
                "upload of {} pixels into {id} of {}x{}",
                pixels.len(),
                surface.width,
                surface.height
            )));
        }

        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &surface.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(pixels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(surface.width * 4),
                rows_per_image: Some(surface.height),
            },
            wgpu::Extent3d {
                width: surface.width,
                height: surface.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn surface_size(&self, id: SurfaceId) -> Option<(u32, u32)> {
        self.surfaces.get(&id).map(|s| (s.width, s.height))
    }

    fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    fn read_surface(&self, _id: SurfaceId) -> Option<Vec<Pixel>> {
        None
    }
}

impl Backend for GpuBackend {
    fn viewport(&self) -> Viewport {
        self.logical
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.gpu()?;
        self.vertices.clear();
        self.queued.clear();
        self.frame_open = true;
        Ok(())
    }

    fn composite(&mut self, draw: &CompositeDraw) -> Result<()> {
        self.ensure_frame_open()?;
        let surface = self
            .surfaces
            .get(&draw.surface)
            .ok_or(EngineError::UnknownSurface(draw.surface))?;
        let quad = composite_quad(draw, self.logical, (surface.width, surface.height));
        self.queue_quad(draw.surface, draw.blend, quad);
        Ok(())
    }

    fn draw_sprite(&mut self, draw: &SpriteDraw) -> Result<()> {
        self.ensure_frame_open()?;
        let surface = self
            .surfaces
            .get(&draw.surface)
            .ok_or(EngineError::UnknownSurface(draw.surface))?;
        if draw.is_degenerate() {
            return Ok(());
        }
        let quad = sprite_quad(draw, (surface.width, surface.height));
        self.queue_quad(draw.surface, BlendMode::Alpha, quad);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.ensure_frame_open()?;
        self.frame_open = false;
        let result = self.render();
        self.vertices.clear();
        self.queued.clear();
        result
    }

    fn resize_target(&mut self, width: u32, height: u32) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(PhysicalSize::new(width, height));
        }
    }

    fn read_frame(&self) -> Option<Vec<Pixel>> {
        None
    }

    fn shutdown(&mut self) {
        if self.gpu.is_none() {
            return;
        }
        if !self.surfaces.is_empty() {
            log::debug!("gpu: releasing {} surfaces at shutdown", self.surfaces.len());
        }
        for (_, surface) in self.surfaces.drain() {
            surface.texture.destroy();
        }
        self.vbo = None;
        self.quad_ibo = None;
        self.viewport_bind_group = None;
        self.viewport_ubo = None;
        self.sampler = None;
        self.pipelines = None;
        self.frame_open = false;
        self.gpu = None;
        log::debug!("gpu: presentation context released");
    }
}

impl std::fmt::Debug for GpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBackend")
            .field("logical", &self.logical)
            .field("surfaces", &self.surfaces.len())
            .field("shut_down", &self.gpu.is_none())
            .finish()
    }
}
