//! Terrain draw pass
//!
//! One pipeline, one bind group, one draw over an index-free vertex range;
//! the vertex stage reconstructs the grid from the vertex index and reads
//! elevations from the shared height-field buffer.

use crate::error::{EngineError, EngineResult};
use crate::gpu::GpuContext;
use crate::shader::{ShaderProgram, StageKind};
use crate::terrain::{grid_vertex_count, HeightFieldBuffer};

/// Framebuffer clear color, doubling as the fade-out sky color
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.7,
    g: 0.4,
    b: 0.3,
    a: 1.0,
};

fn stage_parts(program: &ShaderProgram, kind: StageKind) -> EngineResult<(&str, &str)> {
    let source = program
        .stage_source(kind)
        .ok_or_else(|| EngineError::MissingStage {
            name: program.name().to_string(),
            stage: kind.label(),
        })?;
    let entry = program
        .entry_point_name(kind)
        .ok_or_else(|| EngineError::MissingStage {
            name: program.name().to_string(),
            stage: kind.label(),
        })?;
    Ok((source, entry))
}

pub struct TerrainRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertex_count: u32,
}

impl TerrainRenderer {
    pub fn new(
        ctx: &GpuContext,
        program: &ShaderProgram,
        scene_uniform_buffer: &wgpu::Buffer,
        field: &HeightFieldBuffer,
        mesh_size: [u32; 2],
    ) -> EngineResult<Self> {
        if !program.success() {
            return Err(EngineError::ProgramBuild {
                name: program.name().to_string(),
                log: program.info_log().to_string(),
            });
        }

        let (vs_source, vs_entry) = stage_parts(program, StageKind::Vertex)?;
        let (fs_source, fs_entry) = stage_parts(program, StageKind::Fragment)?;

        let device = &ctx.device;
        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(vs_source.into()),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(fs_source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Terrain Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Terrain Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Terrain Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: vs_entry,
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &fs_module,
                entry_point: fs_entry,
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
                format: GpuContext::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Terrain Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: field.buffer().as_entire_binding(),
                },
            ],
        });

        let vertex_count = grid_vertex_count(mesh_size);
        log::info!(
            "[TerrainRenderer] pipeline ready, {} vertices per frame",
            vertex_count
        );

        Ok(Self {
            pipeline,
            bind_group,
            vertex_count,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Record and submit the frame's draw, then present.
    pub fn render(&self, ctx: &GpuContext) -> Result<(), wgpu::SurfaceError> {
        let frame = ctx.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Terrain Render Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Terrain Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..self.vertex_count, 0..1);
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
