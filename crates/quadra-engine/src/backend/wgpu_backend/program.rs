use crate::backend::{BackendError, ProgramDesc, ProgramKind, SolidVertex, TexturedVertex};

use super::uniforms::UniformBlock;

const VS_ENTRY: &str = "vs_main";
const FS_ENTRY: &str = "fs_main";

/// Bind group layouts and sampler shared by every program.
pub(super) struct SharedLayouts {
    /// Group 0: dynamic-offset [`UniformBlock`].
    pub uniforms: wgpu::BindGroupLayout,
    /// Group 1 of textured programs: texture + sampler.
    pub texture: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
}

impl SharedLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quadra uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(UniformBlock::min_binding_size()),
                },
                count: None,
            }],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quadra texture bgl"),
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quadra sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            uniforms,
            texture,
            sampler,
        }
    }
}

/// A linked program: one pipeline per blend state, plus its uniform values.
pub(super) struct GpuProgram {
    pub kind: ProgramKind,
    pub blended: wgpu::RenderPipeline,
    pub opaque: wgpu::RenderPipeline,
    pub uniforms: UniformBlock,
}

impl GpuProgram {
    pub fn pipeline(&self, blended: bool) -> &wgpu::RenderPipeline {
        if blended { &self.blended } else { &self.opaque }
    }
}

/// Straight (non-premultiplied) alpha: `srcAlpha, 1 - srcAlpha`.
fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Parses and validates WGSL with naga so diagnostics surface as errors instead
/// of reaching wgpu's uncaptured-error handler.
pub(super) fn validate_wgsl(desc: &ProgramDesc<'_>) -> Result<(), BackendError> {
    let fail = |diagnostic: String| BackendError::Shader {
        label: desc.label.to_string(),
        diagnostic,
    };

    let module = naga::front::wgsl::parse_str(desc.source)
        .map_err(|e| fail(e.emit_to_string(desc.source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| fail(e.emit_to_string(desc.source)))?;

    for (name, stage) in [
        (VS_ENTRY, naga::ShaderStage::Vertex),
        (FS_ENTRY, naga::ShaderStage::Fragment),
    ] {
        if !module
            .entry_points
            .iter()
            .any(|ep| ep.name == name && ep.stage == stage)
        {
            return Err(fail(format!("missing {stage:?} entry point `{name}`")));
        }
    }

    Ok(())
}

pub(super) fn create_program(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layouts: &SharedLayouts,
    desc: &ProgramDesc<'_>,
) -> Result<GpuProgram, BackendError> {
    validate_wgsl(desc)?;

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });

    let (bind_group_layouts, vertex_layout) = match desc.kind {
        ProgramKind::Textured => (
            vec![&layouts.uniforms, &layouts.texture],
            TexturedVertex::layout(),
        ),
        ProgramKind::Solid => (vec![&layouts.uniforms], SolidVertex::layout()),
    };

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: &bind_group_layouts,
        immediate_size: 0,
    });

    let build = |blend: wgpu::BlendState| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(VS_ENTRY),
                compilation_options: Default::default(),
                buffers: std::slice::from_ref(&vertex_layout),
            },

            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(FS_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Negative scale mirrors sprites, which flips winding.
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

    Ok(GpuProgram {
        kind: desc.kind,
        blended: build(straight_alpha_blend()),
        opaque: build(wgpu::BlendState::REPLACE),
        uniforms: UniformBlock::default(),
    })
}
