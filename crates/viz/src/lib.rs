//! Interactive GPU renderer for the 2D stable-fluids solver.
//!
//! The whole simulation state lives in GPU storage buffers; the CPU only
//! records compute passes and translates pointer input into splats. The CPU
//! solver in `sim2d` is the behavioral reference the shaders mirror.

pub mod app;
pub mod fluid_app;
pub mod gpu;
pub mod input;

pub use fluid_app::FluidApp;
