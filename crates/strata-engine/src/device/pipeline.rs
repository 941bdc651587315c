//! Vertex layout, blend table and pipeline construction for composition.

use bytemuck::{Pod, Zeroable};

use crate::canvas::Pixel;
use crate::coords::Viewport;
use crate::surface::{BlendMode, CompositeDraw, SpriteDraw};

/// Explicit blend table. `None` replaces the target.
pub(super) fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::None => None,
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        BlendMode::Additive => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }),
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ViewportUniform {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl ViewportUniform {
    pub(super) fn new(viewport: Viewport) -> Self {
        Self {
            viewport: [viewport.width, viewport.height],
            _pad: [0.0; 2],
        }
    }

    pub(super) fn min_binding_size() -> Option<std::num::NonZeroU64> {
        std::num::NonZeroU64::new(std::mem::size_of::<Self>() as u64)
    }
}

/// One corner of a textured quad, in logical pixels.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub tint: [f32; 4],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Full-target quad sampling the draw's source region.
pub(super) fn composite_quad(
    draw: &CompositeDraw,
    viewport: Viewport,
    surface_size: (u32, u32),
) -> [QuadVertex; 4] {
    let (sw, sh) = (surface_size.0.max(1) as f32, surface_size.1.max(1) as f32);
    let src = draw.source;
    let u0 = src.x as f32 / sw;
    let v0 = src.y as f32 / sh;
    let u1 = (src.x + src.width) as f32 / sw;
    let v1 = (src.y + src.height) as f32 / sh;
    let (w, h) = (viewport.width, viewport.height);
    let tint = Pixel::WHITE.to_rgba_f32();

    [
        QuadVertex { pos: [0.0, 0.0], uv: [u0, v0], tint },
        QuadVertex { pos: [w, 0.0], uv: [u1, v0], tint },
        QuadVertex { pos: [w, h], uv: [u1, v1], tint },
        QuadVertex { pos: [0.0, h], uv: [u0, v1], tint },
    ]
}

/// Rotated, flipped, tinted sprite quad. Corner order matches `QUAD_INDICES`.
pub(super) fn sprite_quad(draw: &SpriteDraw, surface_size: (u32, u32)) -> [QuadVertex; 4] {
    let corners = draw.corners();
    let uvs = draw.uv_corners(surface_size.0, surface_size.1);
    let tint = draw.tint.to_rgba_f32();
    core::array::from_fn(|i| QuadVertex {
        pos: [corners[i].x, corners[i].y],
        uv: uvs[i],
        tint,
    })
}

/// One render pipeline per blend mode, sharing a layout.
pub(super) struct Pipelines {
    pub format: wgpu::TextureFormat,
    pub viewport_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    by_mode: [wgpu::RenderPipeline; 3],
}

impl Pipelines {
    pub(super) fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("strata composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata viewport bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: ViewportUniform::min_binding_size(),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata surface bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("strata composite pipeline layout"),
            bind_group_layouts: &[&viewport_layout, &texture_layout],
            immediate_size: 0,
        });

        let build = |mode: BlendMode| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(match mode {
                    BlendMode::None => "strata composite (replace)",
                    BlendMode::Alpha => "strata composite (alpha)",
                    BlendMode::Additive => "strata composite (additive)",
                }),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[QuadVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: blend_state(mode),
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
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        Self {
            format,
            by_mode: BlendMode::ALL.map(build),
            viewport_layout,
            texture_layout,
        }
    }

    pub(super) fn get(&self, mode: BlendMode) -> &wgpu::RenderPipeline {
        match mode {
            BlendMode::None => &self.by_mode[0],
            BlendMode::Alpha => &self.by_mode[1],
            BlendMode::Additive => &self.by_mode[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{PixelRegion, Vec2};
    use crate::surface::SurfaceId;

    #[test]
    fn blend_table_is_explicit() {
        assert!(blend_state(BlendMode::None).is_none());
        assert_eq!(blend_state(BlendMode::Alpha), Some(wgpu::BlendState::ALPHA_BLENDING));

        let add = blend_state(BlendMode::Additive).unwrap();
        assert_eq!(add.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(add.alpha.src_factor, wgpu::BlendFactor::Zero);
    }

    #[test]
    fn composite_quad_covers_viewport_with_clip_uvs() {
        let draw = CompositeDraw {
            surface: SurfaceId(1),
            source: PixelRegion { x: 2, y: 0, width: 2, height: 4 },
            blend: BlendMode::None,
        };
        let q = composite_quad(&draw, Viewport::new(320.0, 200.0), (4, 4));
        assert_eq!(q[2].pos, [320.0, 200.0]);
        assert_eq!(q[0].uv, [0.5, 0.0]);
        assert_eq!(q[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn sprite_quad_carries_tint_and_flip() {
        let draw = SpriteDraw {
            surface: SurfaceId(1),
            source: PixelRegion { x: 0, y: 0, width: 4, height: 4 },
            position: Vec2::new(10.0, 20.0),
            size: Vec2::new(8.0, 8.0),
            rotation: 0.0,
            flip_horizontal: true,
            flip_vertical: false,
            tint: Pixel::rgb(255, 0, 0),
        };
        let q = sprite_quad(&draw, (4, 4));
        assert_eq!(q[0].pos, [10.0, 20.0]);
        assert_eq!(q[0].uv, [1.0, 0.0]);
        assert_eq!(q[0].tint, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn viewport_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 16);
    }
}
