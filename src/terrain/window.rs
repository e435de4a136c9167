//! Streaming window geometry
//!
//! The height field is valid over a rectangle of the horizontal plane.
//! Both the compute-domain and render-domain rectangles are produced by
//! recentering a fixed base rectangle by the camera's displacement, so the
//! relationship between the two domains lives in one function.

/// Axis-aligned rectangle on the horizontal (x, z) plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Rect {
    pub const fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Self {
            min: [min_x, min_z],
            max: [max_x, max_z],
        }
    }

    pub fn extent(&self) -> [f32; 2] {
        [self.max[0] - self.min[0], self.max[1] - self.min[1]]
    }

    pub fn center(&self) -> [f32; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }

    /// Packed as (min.x, min.z, max.x, max.z) for the shaders
    pub fn as_vec4(&self) -> [f32; 4] {
        [self.min[0], self.min[1], self.max[0], self.max[1]]
    }
}

/// Translate `base` by `displacement * scale`, applied identically to the
/// min and max corners. Scale 1.0 recenters the render domain, 0.5 the
/// compute domain, so the compute rectangle always keeps exactly half the
/// render extent while drifting at half the rate.
pub fn recenter(base: Rect, displacement: [f32; 2], scale: f32) -> Rect {
    let dx = displacement[0] * scale;
    let dz = displacement[1] * scale;
    Rect {
        min: [base.min[0] + dx, base.min[1] + dz],
        max: [base.max[0] + dx, base.max[1] + dz],
    }
}

/// The region the height field currently represents, and the camera
/// footprint at which it was generated
#[derive(Debug, Clone, Copy)]
pub struct StreamingWindow {
    pub render_rect: Rect,
    pub compute_rect: Rect,
    /// Horizontal camera position at the last regeneration
    pub origin: [f32; 2],
}

impl StreamingWindow {
    pub fn new(render_rect: Rect, compute_rect: Rect) -> Self {
        Self {
            render_rect,
            compute_rect,
            origin: [0.0, 0.0],
        }
    }
}
