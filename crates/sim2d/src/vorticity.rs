//! Vorticity computation and confinement.
//!
//! Semi-Lagrangian advection smears out small-scale rotation; confinement
//! re-injects it by pushing the flow along the gradient of |vorticity|,
//! rotated 90 degrees so the force spins cells around local curl maxima.

use crate::grid::Grid2;

/// Scalar curl of `velocity` via centered differences, written into `out`.
///
/// curl = 0.5 * ((right.y - left.y) - (top.x - bottom.x))
pub fn compute_vorticity(velocity: &Grid2, out: &mut Grid2) {
    assert_eq!(velocity.channels, 2);
    assert_eq!(out.channels, 1);

    out.fill_par(|i, j, cell| {
        let (i, j) = (i as i32, j as i32);
        let left = velocity.value(i - 1, j, 1);
        let right = velocity.value(i + 1, j, 1);
        let bottom = velocity.value(i, j - 1, 0);
        let top = velocity.value(i, j + 1, 0);
        cell[0] = 0.5 * ((right - left) - (top - bottom));
    });
}

/// Add the confinement force to `velocity`, writing into `out`.
///
/// The force is the normalized gradient of |vorticity| rotated 90 degrees,
/// scaled by the local vorticity, `strength`, and `dt`. The normalization
/// epsilon keeps flat regions force-free instead of dividing by zero.
pub fn apply_confinement(
    velocity: &Grid2,
    vorticity: &Grid2,
    out: &mut Grid2,
    dt: f32,
    strength: f32,
) {
    assert_eq!(velocity.channels, 2);
    assert_eq!(vorticity.channels, 1);
    assert_eq!(out.channels, 2);

    let eps = crate::constants::CONFINEMENT_EPS;

    out.fill_par(|i, j, cell| {
        let vel = velocity.at(i, j);
        let (si, sj) = (i as i32, j as i32);
        let left = vorticity.value(si - 1, sj, 0).abs();
        let right = vorticity.value(si + 1, sj, 0).abs();
        let bottom = vorticity.value(si, sj - 1, 0).abs();
        let top = vorticity.value(si, sj + 1, 0).abs();
        let center = vorticity.at(i, j)[0];

        let gx = 0.5 * (right - left);
        let gy = 0.5 * (top - bottom);
        let len = (gx * gx + gy * gy).sqrt() + eps;

        let fx = (gy / len) * center * strength;
        let fy = (-gx / len) * center * strength;

        cell[0] = vel[0] + fx * dt;
        cell[1] = vel[1] + fy * dt;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vorticity_zero_for_uniform_flow() {
        let mut velocity = Grid2::new(6, 6, 2);
        velocity.fill_par(|_, _, cell| {
            cell[0] = 1.0;
            cell[1] = -2.0;
        });

        let mut vort = Grid2::new(6, 6, 1);
        compute_vorticity(&velocity, &mut vort);

        for &w in vort.data() {
            assert!(w.abs() < 1e-6, "uniform flow has no curl");
        }
    }

    #[test]
    fn test_vorticity_of_rigid_rotation() {
        // vx = -y, vy = x spins counterclockwise with curl
        // 0.5*((vy[i+1]-vy[i-1]) - (vx[j+1]-vx[j-1])) = 0.5*(2 - (-2)) = 2
        // at interior cells.
        let mut velocity = Grid2::new(8, 8, 2);
        velocity.fill_par(|i, j, cell| {
            cell[0] = -(j as f32);
            cell[1] = i as f32;
        });

        let mut vort = Grid2::new(8, 8, 1);
        compute_vorticity(&velocity, &mut vort);

        for j in 1..7 {
            for i in 1..7 {
                assert!(
                    (vort.at(i, j)[0] - 2.0).abs() < 1e-6,
                    "interior curl of rigid rotation should be 2, got {}",
                    vort.at(i, j)[0]
                );
            }
        }
    }

    #[test]
    fn test_confinement_no_force_on_flat_vorticity() {
        let mut velocity = Grid2::new(6, 6, 2);
        velocity.fill_par(|_, _, cell| {
            cell[0] = 0.3;
            cell[1] = -0.7;
        });
        // Uniform vorticity: gradient is zero, center is nonzero, but the
        // epsilon-normalized gradient keeps the force at zero.
        let mut vort = Grid2::new(6, 6, 1);
        vort.data_mut().fill(1.0);

        let mut out = Grid2::new(6, 6, 2);
        apply_confinement(&velocity, &vort, &mut out, 0.016, 0.3);

        for j in 0..6 {
            for i in 0..6 {
                assert_eq!(out.at(i, j), velocity.at(i, j));
            }
        }
    }

    #[test]
    fn test_confinement_force_is_perpendicular_to_gradient() {
        // Vorticity ramp in x: gradient points +x, so the force must be
        // purely in y (rotated 90 degrees), scaled by the local vorticity.
        let mut vort = Grid2::new(8, 8, 1);
        vort.fill_par(|i, _, cell| cell[0] = i as f32);

        let velocity = Grid2::new(8, 8, 2);
        let mut out = Grid2::new(8, 8, 2);
        apply_confinement(&velocity, &vort, &mut out, 1.0, 1.0);

        let cell = out.at(4, 4);
        assert!(
            cell[0].abs() < 1e-4,
            "force along the gradient should vanish, got {}",
            cell[0]
        );
        // gradient = (1, 0) normalized; force.y = -gx * center = -4.
        assert!(
            (cell[1] + 4.0).abs() < 1e-3,
            "perpendicular force should be -center, got {}",
            cell[1]
        );
    }
}
