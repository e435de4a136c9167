//! Camera data and update functions
//!
//! Plain data plus free transformation functions. Velocities persist across
//! frames and decay geometrically, so releasing a key or stopping the
//! pointer glides the camera to rest instead of halting it.

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector2, Vector3};

use crate::config::CameraConfig;

/// Near clip plane, world units
pub const ZNEAR: f32 = 0.1;
/// Far clip plane, world units
pub const ZFAR: f32 = 12.5;
/// Vertical field of view
pub const FOVY_DEG: f32 = 45.0;

/// Camera state mutated once per frame by the frame loop
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    /// Yaw and pitch in degrees
    pub rotation: Vector2<f32>,
    /// Angular velocity in degrees per frame
    pub rotation_velocity: Vector2<f32>,
}

impl CameraState {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 3.0, 0.0),
            velocity: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector2::new(-90.0, 0.0),
            rotation_velocity: Vector2::new(0.0, 0.0),
        }
    }

    /// Horizontal footprint on the terrain plane
    pub fn horizontal_position(&self) -> [f32; 2] {
        [self.position.x, self.position.z]
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new()
    }
}

/// Movement request derived from the pressed direction keys, each axis
/// in {-1, 0, 1}
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveIntent {
    pub forward: f32,
    pub strafe: f32,
    pub lift: f32,
}

/// Forward vector from yaw/pitch in degrees
pub fn forward_vector(rotation: Vector2<f32>) -> Vector3<f32> {
    let yaw = rotation.x.to_radians();
    let pitch = rotation.y.to_radians();
    Vector3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
}

/// Integrate a pointer delta into orientation: accelerate, decay, integrate,
/// clamp pitch. Runs every frame, with a zero delta while the cursor is
/// unlocked, so angular velocity keeps decaying.
pub fn apply_look(state: &mut CameraState, tuning: &CameraConfig, delta: (f32, f32)) {
    state.rotation_velocity.x += delta.0 * tuning.look_multiplier;
    state.rotation_velocity.y -= delta.1 * tuning.look_multiplier;
    state.rotation_velocity *= tuning.look_decay;
    state.rotation += state.rotation_velocity;
    state.rotation.y = state
        .rotation
        .y
        .clamp(-tuning.pitch_limit_deg, tuning.pitch_limit_deg);
}

/// Integrate direction keys into position. Forward/backward travel follows
/// the horizontally projected view direction so looking down does not slow
/// ground movement; lift is along the world up axis.
pub fn apply_movement(state: &mut CameraState, tuning: &CameraConfig, intent: MoveIntent) {
    let forward = forward_vector(state.rotation);
    let up = Vector3::unit_y();

    let horizontal = Vector3::new(forward.x, 0.0, forward.z);
    if intent.forward != 0.0 && horizontal.magnitude2() > f32::EPSILON {
        state.velocity += horizontal.normalize() * (intent.forward * tuning.move_multiplier);
    }

    let right = forward.cross(up);
    if intent.strafe != 0.0 && right.magnitude2() > f32::EPSILON {
        state.velocity += right.normalize() * (intent.strafe * tuning.move_multiplier);
    }

    if intent.lift != 0.0 {
        state.velocity += up * (intent.lift * tuning.move_multiplier);
    }

    state.velocity *= tuning.move_decay;
    state.position += state.velocity;
}

/// View matrix from position and orientation
pub fn view_matrix(state: &CameraState) -> Matrix4<f32> {
    let eye = Point3::new(state.position.x, state.position.y, state.position.z);
    let forward = forward_vector(state.rotation);
    Matrix4::look_at_rh(eye, eye + forward, Vector3::unit_y())
}

/// Fixed-parameter projection matrix
pub fn projection_matrix(aspect: f32) -> Matrix4<f32> {
    perspective(Deg(FOVY_DEG), aspect, ZNEAR, ZFAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> CameraConfig {
        CameraConfig::default()
    }

    #[test]
    fn pitch_clamps_at_limit() {
        let mut state = CameraState::new();
        let tuning = tuning();
        for _ in 0..200 {
            apply_look(&mut state, &tuning, (0.0, -50.0));
        }
        assert_eq!(state.rotation.y, tuning.pitch_limit_deg);
        for _ in 0..400 {
            apply_look(&mut state, &tuning, (0.0, 50.0));
        }
        assert_eq!(state.rotation.y, -tuning.pitch_limit_deg);
    }

    #[test]
    fn angular_velocity_decays_to_rest() {
        let mut state = CameraState::new();
        let tuning = tuning();
        apply_look(&mut state, &tuning, (10.0, 0.0));
        assert!(state.rotation_velocity.x.abs() > 0.0);
        for _ in 0..100 {
            apply_look(&mut state, &tuning, (0.0, 0.0));
        }
        assert!(state.rotation_velocity.x.abs() < 1e-6);
    }

    #[test]
    fn forward_travel_ignores_pitch() {
        let mut state = CameraState::new();
        let tuning = tuning();
        state.rotation.y = 60.0;
        let start_y = state.position.y;
        for _ in 0..10 {
            apply_movement(
                &mut state,
                &tuning,
                MoveIntent {
                    forward: 1.0,
                    ..Default::default()
                },
            );
        }
        assert_eq!(state.position.y, start_y);
        let moved = (state.position - Vector3::new(0.0, 3.0, 0.0)).magnitude();
        assert!(moved > 0.0);
    }

    #[test]
    fn velocity_decay_halts_released_movement() {
        let mut state = CameraState::new();
        let tuning = tuning();
        apply_movement(
            &mut state,
            &tuning,
            MoveIntent {
                forward: 1.0,
                ..Default::default()
            },
        );
        let v = state.velocity.magnitude();
        for _ in 0..200 {
            apply_movement(&mut state, &tuning, MoveIntent::default());
        }
        assert!(state.velocity.magnitude() < v * 1e-3);
    }

    #[test]
    fn initial_yaw_faces_negative_x() {
        let forward = forward_vector(Vector2::new(-90.0, 0.0));
        assert!(forward.x.abs() < 1e-6);
        assert!((forward.z + 1.0).abs() < 1e-6);
    }
}
