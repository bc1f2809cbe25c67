//! Pressure solve for approximate incompressibility.
//!
//! Three passes: centered-difference divergence of the velocity field, a
//! fixed-iteration Jacobi relaxation of the pressure Poisson equation, and
//! subtraction of the pressure gradient from velocity (the projection step).
//! All stencils use edge-clamped neighbor addressing.

use crate::grid::{DoubleBuffered, Grid2};

/// Compute the centered-difference divergence of `velocity` into `out`.
///
/// div = 0.5 * ((right.x - left.x) + (top.y - bottom.y))
pub fn compute_divergence(velocity: &Grid2, out: &mut Grid2) {
    assert_eq!(velocity.channels, 2);
    assert_eq!(out.channels, 1);

    out.fill_par(|i, j, cell| {
        let (i, j) = (i as i32, j as i32);
        let left = velocity.value(i - 1, j, 0);
        let right = velocity.value(i + 1, j, 0);
        let bottom = velocity.value(i, j - 1, 1);
        let top = velocity.value(i, j + 1, 1);
        cell[0] = 0.5 * ((right - left) + (top - bottom));
    });
}

/// Jacobi-relax the pressure Poisson equation against `divergence`.
///
/// The current pressure buffer is cleared to zero first, then each iteration
/// computes `(left + right + bottom + top + alpha * div) * beta` from the
/// previous iterate and flips the pair. The iteration count is fixed, not
/// convergence-tested.
pub fn solve_pressure(
    pressure: &mut DoubleBuffered,
    divergence: &Grid2,
    iterations: usize,
    alpha: f32,
    beta: f32,
) {
    assert_eq!(pressure.current().channels, 1);
    assert_eq!(divergence.channels, 1);

    pressure.current_mut().clear();

    for _ in 0..iterations {
        let (prev, next) = pressure.split();
        next.fill_par(|i, j, cell| {
            let (i, j) = (i as i32, j as i32);
            let left = prev.value(i - 1, j, 0);
            let right = prev.value(i + 1, j, 0);
            let bottom = prev.value(i, j - 1, 0);
            let top = prev.value(i, j + 1, 0);
            let div = divergence.at(i as usize, j as usize)[0];
            cell[0] = (left + right + bottom + top + alpha * div) * beta;
        });
        pressure.flip();
    }
}

/// Subtract the centered-difference pressure gradient from `velocity`,
/// writing the projected field into `out`.
pub fn subtract_gradient(velocity: &Grid2, pressure: &Grid2, out: &mut Grid2) {
    assert_eq!(velocity.channels, 2);
    assert_eq!(pressure.channels, 1);
    assert_eq!(out.channels, 2);

    out.fill_par(|i, j, cell| {
        let vel = velocity.at(i, j);
        let (i, j) = (i as i32, j as i32);
        let left = pressure.value(i - 1, j, 0);
        let right = pressure.value(i + 1, j, 0);
        let bottom = pressure.value(i, j - 1, 0);
        let top = pressure.value(i, j + 1, 0);
        cell[0] = vel[0] - 0.5 * (right - left);
        cell[1] = vel[1] - 0.5 * (top - bottom);
    });
}

/// Mean absolute divergence over the whole grid. Diagnostic used by the
/// projection tests.
pub fn mean_abs_divergence(divergence: &Grid2) -> f32 {
    let sum: f32 = divergence.data().iter().map(|d| d.abs()).sum();
    sum / divergence.data().len() as f32
}
