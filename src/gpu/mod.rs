//! GPU device plumbing: context initialization and compute dispatch

pub mod context;
pub mod dispatch;

pub use context::{DispatchLimits, GpuContext};
pub use dispatch::{dispatch_extent, ComputeDispatcher};
