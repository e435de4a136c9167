//! relief-engine: a GPU-streamed height-field terrain renderer.
//!
//! A compute pass evaluates elevations over a bounded window of the
//! horizontal plane into a storage buffer; a draw pass triangulates that
//! buffer into a mesh around the camera. When the camera drifts past a
//! threshold from the last generation origin, the window recenters and the
//! field is regenerated before the next draw.

pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod input;
pub mod renderer;
pub mod shader;
pub mod terrain;

pub use config::RuntimeConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use shader::{ShaderProgram, StageKind, UniformBlock, UniformValue};
pub use terrain::{recenter, Rect, StreamingController, StreamingParams, StreamingWindow};
