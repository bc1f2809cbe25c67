//! Tuning constants for the stable-fluids solver.
//!
//! None of these are derived from a physical model; they are visual
//! calibration values for a 512x512 grid driven at roughly 60 Hz. Changing
//! them changes the look of the simulation, not its correctness.

/// Multiplier applied to the frame dt before semi-Lagrangian backtracing.
///
/// Opaque calibration constant coupled to the default grid resolution and
/// the frame-dt ceiling below. Do not re-derive.
pub const ADVECTION_TIME_SCALE: f32 = 50.0;

/// Vorticity confinement force strength.
pub const CONFINEMENT_STRENGTH: f32 = 0.3;

/// Epsilon added to the vorticity gradient length before normalizing.
pub const CONFINEMENT_EPS: f32 = 1e-5;

// =============================================================================
// PRESSURE SOLVE
// =============================================================================

/// Fixed Jacobi iteration count. A quality/performance tradeoff, not a
/// convergence guarantee.
pub const PRESSURE_ITERATIONS: usize = 20;

/// Divergence weight in the Jacobi update.
pub const PRESSURE_ALPHA: f32 = -1.0;

/// Neighbor-sum weight in the Jacobi update (1/4 for the 2D 5-point stencil).
pub const PRESSURE_BETA: f32 = 0.25;

// =============================================================================
// SPLAT INJECTION
// =============================================================================

/// Falloff denominator for force splats (cells^2 scale, not a linear radius).
pub const FORCE_SPLAT_RADIUS: f32 = 200.0;

/// Force splat amplitude.
pub const FORCE_SPLAT_STRENGTH: f32 = 0.05;

/// Falloff denominator for dye splats.
pub const DYE_SPLAT_RADIUS: f32 = 100.0;

/// Dye splat amplitude.
pub const DYE_SPLAT_STRENGTH: f32 = 0.8;

// =============================================================================
// FRAME DRIVER
// =============================================================================

/// Recommended ceiling for the per-frame dt handed to [`crate::FluidSimulation2D::step`].
/// The pipeline performs no clamping itself; an unbounded dt blows up the
/// advection step.
pub const MAX_FRAME_DT: f32 = 0.016;

/// Magnitude of the seeded rotational velocity field at construction.
pub const SEED_VELOCITY_MAGNITUDE: f32 = 0.1;

/// Default grid resolution used by the interactive visualization.
pub const DEFAULT_GRID_SIZE: usize = 512;
