//! Compute dispatch with explicit write-visibility ordering

use std::sync::Arc;

use super::context::DispatchLimits;
use crate::error::{EngineError, EngineResult};
use crate::shader::{ShaderProgram, StageKind};
use crate::terrain::height_field::HeightFieldBuffer;

/// Group counts covering `domain` with the given workgroup dimensions,
/// rounded up per axis.
pub fn dispatch_extent(domain: [u32; 2], workgroup: [u32; 3]) -> [u32; 3] {
    [
        domain[0].div_ceil(workgroup[0].max(1)),
        domain[1].div_ceil(workgroup[1].max(1)),
        1,
    ]
}

/// Invokes a linked compute program over a work-group grid.
///
/// Each dispatch is recorded into its own command buffer. With the barrier
/// requested, pending buffers are submitted at once; the submission is the
/// ordering point after which storage writes are visible to later passes.
/// Without it the buffer is parked, and visibility stays undefined until
/// the next barriered dispatch or an explicit flush.
pub struct ComputeDispatcher {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    pending: Vec<wgpu::CommandBuffer>,
    limits: DispatchLimits,
}

impl ComputeDispatcher {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        program: &ShaderProgram,
        uniform_buffer: &wgpu::Buffer,
        field: &HeightFieldBuffer,
        limits: DispatchLimits,
    ) -> EngineResult<Self> {
        if !program.success() {
            return Err(EngineError::ProgramBuild {
                name: program.name().to_string(),
                log: program.info_log().to_string(),
            });
        }
        let source = program
            .stage_source(StageKind::Compute)
            .ok_or_else(|| EngineError::MissingStage {
                name: program.name().to_string(),
                stage: StageKind::Compute.label(),
            })?;
        let entry_point = program
            .entry_point_name(StageKind::Compute)
            .ok_or_else(|| EngineError::MissingStage {
                name: program.name().to_string(),
                stage: StageKind::Compute.label(),
            })?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Field Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Field Compute Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Field Compute Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Field Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field Compute Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: field.buffer().as_entire_binding(),
                },
            ],
        });

        log::info!(
            "[ComputeDispatcher] pipeline ready for '{}' (entry '{}')",
            program.name(),
            entry_point
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            pending: Vec::new(),
            limits,
        })
    }

    /// Record one dispatch over `groups`. `barrier` must be true before
    /// the first draw that consumes the written buffer.
    pub fn dispatch(&mut self, groups: [u32; 3], barrier: bool) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Field Compute Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Field Compute Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(groups[0], groups[1], groups[2]);
        }
        self.pending.push(encoder.finish());

        if barrier {
            self.flush();
        }
    }

    /// Submit every parked dispatch, establishing the visibility ordering
    /// point for their storage writes.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        log::debug!(
            "[ComputeDispatcher] submitting {} dispatch(es)",
            self.pending.len()
        );
        self.queue.submit(self.pending.drain(..));
    }

    pub fn limits(&self) -> &DispatchLimits {
        &self.limits
    }
}
