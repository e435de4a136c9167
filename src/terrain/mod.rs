//! Height-field terrain: streaming window, GPU buffer, and the controller
//! that regenerates the field as the camera moves

pub mod height_field;
pub mod streaming;
pub mod window;

pub use height_field::HeightFieldBuffer;
pub use streaming::{StreamingController, StreamingParams};
pub use window::{recenter, Rect, StreamingWindow};

/// Base render-domain rectangle before any recentering
pub const BASE_RENDER_RECT: Rect = Rect::new(-15.0, -15.0, 15.0, 15.0);

/// Base compute-domain rectangle; half the render extent, same center
pub const BASE_COMPUTE_RECT: Rect = Rect::new(-7.5, -7.5, 7.5, 7.5);

/// Vertices drawn for a grid of the given dimensions: two triangles per
/// cell, identity encoded in the vertex index.
pub fn grid_vertex_count(mesh_size: [u32; 2]) -> u32 {
    6 * mesh_size[0].saturating_sub(1) * mesh_size[1].saturating_sub(1)
}
