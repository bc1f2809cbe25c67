//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunable parameters for one solver instance.
///
/// Defaults reproduce the reference behavior exactly; see
/// [`crate::constants`] for what each knob does.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Frame dt multiplier for semi-Lagrangian backtracing.
    pub advection_time_scale: f32,
    /// Vorticity confinement force strength.
    pub confinement_strength: f32,
    /// Fixed Jacobi iteration count for the pressure solve.
    pub pressure_iterations: usize,
    /// Divergence weight in the Jacobi update.
    pub pressure_alpha: f32,
    /// Neighbor-sum weight in the Jacobi update.
    pub pressure_beta: f32,
    /// Falloff denominator for force splats (cells^2 scale).
    pub force_splat_radius: f32,
    /// Force splat amplitude.
    pub force_splat_strength: f32,
    /// Falloff denominator for dye splats.
    pub dye_splat_radius: f32,
    /// Dye splat amplitude.
    pub dye_splat_strength: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            advection_time_scale: constants::ADVECTION_TIME_SCALE,
            confinement_strength: constants::CONFINEMENT_STRENGTH,
            pressure_iterations: constants::PRESSURE_ITERATIONS,
            pressure_alpha: constants::PRESSURE_ALPHA,
            pressure_beta: constants::PRESSURE_BETA,
            force_splat_radius: constants::FORCE_SPLAT_RADIUS,
            force_splat_strength: constants::FORCE_SPLAT_STRENGTH,
            dye_splat_radius: constants::DYE_SPLAT_RADIUS,
            dye_splat_strength: constants::DYE_SPLAT_STRENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_constants() {
        let config = SolverConfig::default();
        assert_eq!(config.advection_time_scale, 50.0);
        assert_eq!(config.confinement_strength, 0.3);
        assert_eq!(config.pressure_iterations, 20);
        assert_eq!(config.pressure_alpha, -1.0);
        assert_eq!(config.pressure_beta, 0.25);
        assert_eq!(config.force_splat_radius, 200.0);
        assert_eq!(config.force_splat_strength, 0.05);
        assert_eq!(config.dye_splat_radius, 100.0);
        assert_eq!(config.dye_splat_strength, 0.8);
    }
}
