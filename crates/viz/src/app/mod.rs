//! Windowed app framework: surface setup and the frame loop.

pub mod context;
pub mod runner;

pub use context::GpuContext;
pub use runner::{run, App};
