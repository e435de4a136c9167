//! Engine assembly and frame loop
//!
//! Startup compiles and links both GPU programs (a failure here is fatal
//! and reported with the diagnostic log), generates the initial height
//! field, then enters the single-threaded loop: poll input, integrate the
//! camera, maybe regenerate the field, draw, present.

use std::sync::Arc;

use anyhow::Context;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowBuilder};

use crate::camera::{self, CameraState, MoveIntent};
use crate::config::RuntimeConfig;
use crate::error::EngineError;
use crate::gpu::GpuContext;
use crate::input::InputState;
use crate::renderer::TerrainRenderer;
use crate::shader::{ShaderProgram, StageKind, UniformValue};
use crate::terrain::{HeightFieldBuffer, StreamingController, StreamingParams};

/// Owns the event loop and configuration until `run` consumes them
pub struct Engine {
    config: RuntimeConfig,
    event_loop: Option<EventLoop<()>>,
}

impl Engine {
    pub fn new(config: RuntimeConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;
        Ok(Self {
            config,
            event_loop: Some(event_loop),
        })
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .expect("event loop already consumed");
        let config = self.config.clone();

        let mut builder = WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(PhysicalSize::new(config.window.width, config.window.height));
        if config.window.fullscreen {
            builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(builder.build(&event_loop)?);

        let mut ctx = GpuContext::new(window.clone(), config.window.vsync)?;
        let limits = ctx.dispatch_limits();
        limits.log();

        // Both programs must reach a usable state before the loop starts;
        // anything less aborts startup with the diagnostic text.
        let mut field_program = ShaderProgram::new("height_field");
        field_program.compile_stage(
            StageKind::Compute,
            include_str!("terrain/shaders/height_field.wgsl"),
        );
        field_program.link();
        if !field_program.success() {
            return Err(EngineError::ProgramBuild {
                name: field_program.name().to_string(),
                log: field_program.info_log().to_string(),
            }
            .into());
        }

        let mut terrain_program = ShaderProgram::new("terrain");
        terrain_program.compile_stage(
            StageKind::Vertex,
            include_str!("renderer/shaders/terrain_vs.wgsl"),
        );
        terrain_program.compile_stage(
            StageKind::Fragment,
            include_str!("renderer/shaders/terrain_fs.wgsl"),
        );
        terrain_program.link();
        if !terrain_program.success() {
            return Err(EngineError::ProgramBuild {
                name: terrain_program.name().to_string(),
                log: terrain_program.info_log().to_string(),
            }
            .into());
        }

        let field = HeightFieldBuffer::new(&ctx.device, config.terrain.samples);

        let params = StreamingParams::from_config(&config.terrain);
        let mut controller = StreamingController::new(
            &ctx.device,
            &ctx.queue,
            &field_program,
            &terrain_program,
            params,
            &field,
            limits,
        )?;

        {
            let scene = controller.scene_uniforms_mut();
            scene.set(
                "proj",
                UniformValue::Mat4(camera::projection_matrix(ctx.aspect_ratio()).into()),
            );
            scene.set("mesh_size", UniformValue::Vec2U(config.terrain.mesh_size));
        }
        controller.prime(&ctx.queue, &field_program)?;

        let renderer = TerrainRenderer::new(
            &ctx,
            &terrain_program,
            controller.scene_uniform_buffer(),
            &field,
            config.terrain.mesh_size,
        )?;

        let mut camera_state = CameraState::new();
        let mut input = InputState::new();
        let tuning = config.camera.clone();

        set_cursor_lock(&window, true);
        window.request_redraw();

        log::info!("[Engine] entering frame loop");
        event_loop.run(move |event, elwt| match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == ctx.window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => {
                    ctx.resize(size.width, size.height);
                    controller.scene_uniforms_mut().set(
                        "proj",
                        UniformValue::Mat4(camera::projection_matrix(ctx.aspect_ratio()).into()),
                    );
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(code),
                            state,
                            repeat,
                            ..
                        },
                    ..
                } => {
                    if *state == ElementState::Pressed {
                        match code {
                            KeyCode::Escape => elwt.exit(),
                            KeyCode::KeyM if !repeat => {
                                let locked = !input.is_cursor_locked();
                                input.set_cursor_locked(locked);
                                set_cursor_lock(&ctx.window, locked);
                            }
                            _ => {}
                        }
                    }
                    input.process_key(*code, *state);
                }
                WindowEvent::RedrawRequested => {
                    let delta = input.take_mouse_delta();
                    camera::apply_look(&mut camera_state, &tuning, delta);

                    let intent = MoveIntent {
                        forward: key_axis(&input, KeyCode::KeyW, KeyCode::KeyS),
                        strafe: key_axis(&input, KeyCode::KeyD, KeyCode::KeyA),
                        lift: key_axis(&input, KeyCode::KeyE, KeyCode::KeyQ),
                    };
                    camera::apply_movement(&mut camera_state, &tuning, intent);

                    if let Err(e) = controller.regenerate_if_needed(
                        &ctx.queue,
                        camera_state.horizontal_position(),
                        &field_program,
                    ) {
                        log::error!("[Engine] regeneration failed: {}", e);
                        elwt.exit();
                        return;
                    }

                    {
                        let scene = controller.scene_uniforms_mut();
                        scene.set(
                            "view",
                            UniformValue::Mat4(camera::view_matrix(&camera_state).into()),
                        );
                        scene.set("pos", UniformValue::Vec3(camera_state.position.into()));
                    }
                    if let Err(e) = controller.push_scene(&ctx.queue, &terrain_program) {
                        log::error!("[Engine] uniform push failed: {}", e);
                        elwt.exit();
                        return;
                    }

                    match renderer.render(&ctx) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                            let size = ctx.window.inner_size();
                            ctx.resize(size.width, size.height);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("[Engine] out of GPU memory, exiting");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            log::warn!("[Engine] surface timeout, skipping frame");
                        }
                    }
                }
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                input.process_mouse_motion(delta);
            }
            Event::AboutToWait => {
                ctx.window.request_redraw();
            }
            _ => {}
        })?;

        Ok(())
    }
}

fn key_axis(input: &InputState, positive: KeyCode, negative: KeyCode) -> f32 {
    (input.is_key_pressed(positive) as i32 - input.is_key_pressed(negative) as i32) as f32
}

fn set_cursor_lock(window: &Window, locked: bool) {
    if locked {
        if window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
            // Some platforms only support confinement.
            window.set_cursor_grab(CursorGrabMode::Confined).ok();
        }
        window.set_cursor_visible(false);
    } else {
        window.set_cursor_grab(CursorGrabMode::None).ok();
        window.set_cursor_visible(true);
    }
}
