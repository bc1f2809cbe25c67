//! Radial Gaussian injection of momentum or dye.

use glam::Vec2;

use crate::grid::Grid2;

/// Add a Gaussian-weighted amount of `values` around `center`, reading from
/// `field` and writing into `out`.
///
/// Each cell at distance `d` from `center` (measured between cell centers)
/// receives `values * exp(-d^2 / radius) * strength` on top of its current
/// contents. `radius` is the squared-distance falloff scale, so the visible
/// footprint grows with its square root.
pub fn apply_splat(
    field: &Grid2,
    out: &mut Grid2,
    center: Vec2,
    radius: f32,
    strength: f32,
    values: &[f32],
) {
    assert_eq!(field.channels, out.channels);
    assert_eq!(values.len(), field.channels);
    assert!(radius > 0.0);

    out.fill_par(|i, j, cell| {
        let pos = Vec2::new(i as f32 + 0.5, j as f32 + 0.5);
        let d2 = pos.distance_squared(center);
        let factor = (-d2 / radius).exp() * strength;
        let src = field.at(i, j);
        for c in 0..cell.len() {
            cell[c] = src[c] + values[c] * factor;
        }
    });
}
