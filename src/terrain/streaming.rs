//! Distance-triggered height-field regeneration
//!
//! Once per frame the controller compares the camera's horizontal position
//! against the origin of the last generation. Within the threshold on both
//! axes nothing happens; past it on either axis, both window rectangles
//! are recentered, the compute uniforms pushed, and the field regenerated
//! in full before the frame's draw is recorded.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use super::height_field::HeightFieldBuffer;
use super::window::{recenter, Rect, StreamingWindow};
use crate::config::TerrainConfig;
use crate::error::EngineResult;
use crate::gpu::{dispatch_extent, ComputeDispatcher, DispatchLimits};
use crate::shader::{ShaderProgram, UniformBlock, UniformValue};

/// Fixed inputs of the streaming policy
#[derive(Debug, Clone, Copy)]
pub struct StreamingParams {
    /// Per-axis displacement that triggers regeneration
    pub threshold: f32,
    pub base_render: Rect,
    pub base_compute: Rect,
    pub samples: [u32; 2],
    pub seed: u32,
}

impl StreamingParams {
    pub fn from_config(config: &TerrainConfig) -> Self {
        Self {
            threshold: config.regen_threshold,
            base_render: super::BASE_RENDER_RECT,
            base_compute: super::BASE_COMPUTE_RECT,
            samples: config.samples,
            seed: config.seed,
        }
    }
}

impl Default for StreamingParams {
    fn default() -> Self {
        Self::from_config(&TerrainConfig::default())
    }
}

/// Everything a regeneration changes, computed before touching the GPU
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegenPlan {
    pub render_rect: Rect,
    pub compute_rect: Rect,
    pub origin: [f32; 2],
}

/// Decide whether the camera has left the valid window.
///
/// The comparison is per-axis `>=` on absolute displacement, not a radial
/// distance: crossing the threshold on one axis alone regenerates the
/// window on both axes. Kept as-is deliberately; tests pin it down.
pub fn plan(
    params: &StreamingParams,
    window: &StreamingWindow,
    camera_xz: [f32; 2],
) -> Option<RegenPlan> {
    let d = [
        camera_xz[0] - window.origin[0],
        camera_xz[1] - window.origin[1],
    ];
    if d[0].abs() < params.threshold && d[1].abs() < params.threshold {
        return None;
    }
    Some(RegenPlan {
        render_rect: recenter(params.base_render, d, 1.0),
        compute_rect: recenter(params.base_compute, d, 0.5),
        origin: camera_xz,
    })
}

/// Owns the streaming window, the uniform blocks of both programs, and the
/// dispatcher that rewrites the height field
pub struct StreamingController {
    params: StreamingParams,
    window: StreamingWindow,
    field_uniforms: UniformBlock,
    field_uniform_buffer: wgpu::Buffer,
    scene_uniforms: UniformBlock,
    scene_uniform_buffer: wgpu::Buffer,
    dispatcher: ComputeDispatcher,
    workgroup: [u32; 3],
}

impl StreamingController {
    pub fn new(
        device: &Arc<wgpu::Device>,
        queue: &Arc<wgpu::Queue>,
        field_program: &ShaderProgram,
        scene_program: &ShaderProgram,
        params: StreamingParams,
        field: &HeightFieldBuffer,
        limits: DispatchLimits,
    ) -> EngineResult<Self> {
        let identity: [[f32; 4]; 4] = Matrix4::identity().into();

        let mut field_uniforms = UniformBlock::new(
            "field",
            &[
                ("start_finish", UniformValue::Vec4(params.base_compute.as_vec4())),
                ("samples", UniformValue::Vec2U(params.samples)),
                ("seed", UniformValue::U32(params.seed)),
            ],
        );
        field_uniforms.resolve(field_program)?;

        let mut scene_uniforms = UniformBlock::new(
            "scene",
            &[
                ("view", UniformValue::Mat4(identity)),
                ("proj", UniformValue::Mat4(identity)),
                ("start_finish", UniformValue::Vec4(params.base_render.as_vec4())),
                ("pos", UniformValue::Vec3([0.0, 0.0, 0.0])),
                ("samples", UniformValue::Vec2U(params.samples)),
                ("mesh_size", UniformValue::Vec2U([1, 1])),
            ],
        );
        scene_uniforms.resolve(scene_program)?;

        let field_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Field Uniform Buffer"),
            size: field_uniforms.span(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scene_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: scene_uniforms.span(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let workgroup = field_program.workgroup_size().unwrap_or([1, 1, 1]);
        let dispatcher = ComputeDispatcher::new(
            device.clone(),
            queue.clone(),
            field_program,
            &field_uniform_buffer,
            field,
            limits,
        )?;

        Ok(Self {
            window: StreamingWindow::new(params.base_render, params.base_compute),
            params,
            field_uniforms,
            field_uniform_buffer,
            scene_uniforms,
            scene_uniform_buffer,
            dispatcher,
            workgroup,
        })
    }

    /// First generation, before the frame loop starts.
    pub fn prime(&mut self, queue: &wgpu::Queue, field_program: &ShaderProgram) -> EngineResult<()> {
        self.field_uniforms
            .push(queue, &self.field_uniform_buffer, field_program)?;
        self.dispatcher
            .dispatch(dispatch_extent(self.params.samples, self.workgroup), true);
        log::info!("[Streaming] initial field generated over {:?}", self.window.compute_rect);
        Ok(())
    }

    /// Evaluate the regeneration policy for this frame. Returns whether a
    /// regeneration was dispatched; the dispatch barrier has been issued by
    /// the time this returns true, so the following draw reads a complete
    /// field.
    pub fn regenerate_if_needed(
        &mut self,
        queue: &wgpu::Queue,
        camera_xz: [f32; 2],
        field_program: &ShaderProgram,
    ) -> EngineResult<bool> {
        let Some(plan) = plan(&self.params, &self.window, camera_xz) else {
            return Ok(false);
        };

        log::debug!(
            "[Streaming] camera left window: origin {:?} -> {:?}",
            self.window.origin,
            plan.origin
        );

        self.window.render_rect = plan.render_rect;
        self.window.compute_rect = plan.compute_rect;
        self.window.origin = plan.origin;

        self.field_uniforms
            .set("start_finish", UniformValue::Vec4(plan.compute_rect.as_vec4()));
        self.scene_uniforms
            .set("start_finish", UniformValue::Vec4(plan.render_rect.as_vec4()));

        self.field_uniforms
            .push(queue, &self.field_uniform_buffer, field_program)?;
        self.dispatcher
            .dispatch(dispatch_extent(self.params.samples, self.workgroup), true);
        Ok(true)
    }

    pub fn window(&self) -> &StreamingWindow {
        &self.window
    }

    /// Render-program uniforms; the frame loop refreshes view and position
    /// here every frame, the controller the window rectangle on
    /// regeneration.
    pub fn scene_uniforms_mut(&mut self) -> &mut UniformBlock {
        &mut self.scene_uniforms
    }

    pub fn push_scene(
        &self,
        queue: &wgpu::Queue,
        scene_program: &ShaderProgram,
    ) -> EngineResult<()> {
        self.scene_uniforms
            .push(queue, &self.scene_uniform_buffer, scene_program)
    }

    pub fn scene_uniform_buffer(&self) -> &wgpu::Buffer {
        &self.scene_uniform_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> StreamingWindow {
        StreamingWindow::new(super::super::BASE_RENDER_RECT, super::super::BASE_COMPUTE_RECT)
    }

    #[test]
    fn small_displacement_keeps_the_window() {
        let params = StreamingParams::default();
        assert_eq!(plan(&params, &window(), [1.0, 1.0]), None);
        assert_eq!(plan(&params, &window(), [-2.4, 2.4]), None);
    }

    #[test]
    fn one_axis_past_threshold_regenerates() {
        let params = StreamingParams::default();
        let plan = plan(&params, &window(), [3.0, 0.0]).expect("should regenerate");
        assert_eq!(plan.origin, [3.0, 0.0]);
        assert_eq!(plan.render_rect, Rect::new(-12.0, -15.0, 18.0, 15.0));
        assert_eq!(plan.compute_rect, Rect::new(-6.0, -7.5, 9.0, 7.5));
    }

    #[test]
    fn threshold_comparison_is_inclusive() {
        let params = StreamingParams::default();
        assert!(plan(&params, &window(), [2.5, 0.0]).is_some());
        assert!(plan(&params, &window(), [0.0, -2.5]).is_some());
        assert!(plan(&params, &window(), [2.499, 2.499]).is_none());
    }

    #[test]
    fn displacement_is_measured_from_last_origin() {
        let params = StreamingParams::default();
        let mut w = window();
        let first = plan(&params, &w, [3.0, 0.0]).expect("first regeneration");
        w.origin = first.origin;
        w.render_rect = first.render_rect;
        w.compute_rect = first.compute_rect;

        // Staying near the new origin is quiet again.
        assert_eq!(plan(&params, &w, [4.0, 1.0]), None);
        assert!(plan(&params, &w, [6.0, 0.0]).is_some());
    }

    #[test]
    fn regenerated_rects_keep_the_half_extent_relationship() {
        let params = StreamingParams::default();
        let plan = plan(&params, &window(), [3.0, -1.0]).expect("should regenerate");
        assert_eq!(plan.render_rect, Rect::new(-12.0, -16.0, 18.0, 14.0));
        assert_eq!(plan.compute_rect, Rect::new(-6.0, -8.0, 9.0, 7.0));
        let render = plan.render_rect.extent();
        let compute = plan.compute_rect.extent();
        assert_eq!(render[0], compute[0] * 2.0);
        assert_eq!(render[1], compute[1] * 2.0);
    }
}
