//! Semi-Lagrangian advection.
//!
//! For each destination cell, trace backward along the velocity field and
//! bilinearly resample the advected field's prior value there. The backward
//! trace is what makes the scheme unconditionally stable (Stam's "stable
//! fluids"): the result is always an interpolation of existing values, never
//! an extrapolation.

use glam::Vec2;

use crate::grid::Grid2;

/// Advect `field` through `velocity`, writing into `out`.
///
/// `dt_scaled` is the frame dt pre-multiplied by the advection time scale
/// (see [`crate::constants::ADVECTION_TIME_SCALE`]). The backtrace runs in
/// cell units: velocity is treated as one cell per unit time. Sampling is
/// edge-clamped, so traces that leave the domain degrade to the border value.
///
/// `field` and `velocity` may alias (self-advection of the velocity field);
/// `out` must be a different grid from both.
pub fn advect(field: &Grid2, velocity: &Grid2, out: &mut Grid2, dt_scaled: f32) {
    assert_eq!(velocity.channels, 2, "velocity must be two-channel");
    assert_eq!(field.width, out.width);
    assert_eq!(field.height, out.height);
    assert_eq!(field.channels, out.channels);

    out.fill_par(|i, j, cell| {
        let vel = velocity.at(i, j);
        let prev = Vec2::new(i as f32 - dt_scaled * vel[0], j as f32 - dt_scaled * vel[1]);
        field.sample_into(prev, cell);
    });
}
