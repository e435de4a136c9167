//! Engine-wide error handling
//!
//! Shader compile and link failures are recorded inside the program object
//! and surfaced through `success()` / `info_log()`; the variants here cover
//! the conditions that escape a subsystem boundary.

use thiserror::Error;

/// Engine error taxonomy
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("program '{name}' failed to build:\n{log}")]
    ProgramBuild { name: String, log: String },

    #[error("program '{name}' has no {stage} stage")]
    MissingStage { name: String, stage: &'static str },

    #[error("program '{name}' declares no uniform block")]
    MissingUniformBlock { name: String },

    #[error("uniform block '{block}' has not been resolved against a linked program")]
    UnresolvedBindings { block: String },

    #[error(
        "uniform block '{block}' was resolved against link generation {resolved}, \
         but the program is now at generation {current}"
    )]
    StaleBindings {
        block: String,
        resolved: u64,
        current: u64,
    },

    #[error("GPU operation failed: {operation}: {message}")]
    GpuOperationFailed { operation: String, message: String },

    #[error("configuration error in {path}: {message}")]
    Config { path: String, message: String },
}

/// Result alias used throughout the engine
pub type EngineResult<T> = Result<T, EngineError>;
