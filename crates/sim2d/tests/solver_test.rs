//! End-to-end behavior of the CPU solver over multiple frames.

use sim2d::FluidSimulation2D;

fn velocity_magnitude(sim: &FluidSimulation2D, i: usize, j: usize) -> f32 {
    let cell = sim.velocity().at(i, j);
    (cell[0] * cell[0] + cell[1] * cell[1]).sqrt()
}

fn dye_magnitude(sim: &FluidSimulation2D, i: usize, j: usize) -> f32 {
    let cell = sim.dye().at(i, j);
    (cell[0] * cell[0] + cell[1] * cell[1] + cell[2] * cell[2]).sqrt()
}

/// A centered force splat on an initially still 64x64 grid stays localized:
/// after ten frames the center carries visible momentum and dye while the
/// grid corner sees only the Gaussian tail, which is effectively zero at
/// that distance.
#[test]
fn test_centered_interaction_stays_localized() {
    let mut sim = FluidSimulation2D::new(64, 64);
    sim.clear_velocity();

    sim.add_force(0.5, 0.5, 0.0, 0.0);
    sim.step(0.01);
    sim.add_force(0.5, 0.5, 1.0, 0.0);
    sim.add_dye(0.5, 0.5, 1.0, 0.6, 0.2);
    for _ in 0..10 {
        sim.step(0.01);
    }

    let center_vel = velocity_magnitude(&sim, 32, 32);
    assert!(
        center_vel > 1e-3,
        "center should keep visible momentum, got {center_vel}"
    );
    let center_dye = dye_magnitude(&sim, 32, 32);
    assert!(
        center_dye > 1e-2,
        "center should keep visible dye, got {center_dye}"
    );

    let corner_vel = velocity_magnitude(&sim, 0, 0);
    assert!(
        corner_vel < 1e-4,
        "corner is ~31 cells from the splat so only the tail reaches it, got {corner_vel}"
    );
    let corner_dye = dye_magnitude(&sim, 0, 0);
    assert!(
        corner_dye < 1e-5,
        "dye falloff is twice as tight as the force falloff, got {corner_dye}"
    );
}

/// A zero-magnitude force splat must leave a zeroed velocity field at
/// exactly zero. The splat is an additive append, so adding nothing
/// changes nothing.
#[test]
fn test_zero_force_splat_is_a_no_op() {
    let mut sim = FluidSimulation2D::new(32, 32);
    sim.clear_velocity();
    sim.add_force(0.5, 0.5, 0.0, 0.0);
    for &v in sim.velocity().data() {
        assert_eq!(v, 0.0);
    }
}

/// Stepping a fully zeroed field set keeps every field at exactly zero.
/// Every pass is linear or multiplicative in the field values, so the
/// all-zero state is a fixed point of the whole pipeline.
#[test]
fn test_zero_state_is_a_fixed_point() {
    let mut sim = FluidSimulation2D::new(32, 32);
    sim.clear_velocity();
    for _ in 0..5 {
        sim.step(0.016);
    }
    for &v in sim.velocity().data() {
        assert_eq!(v, 0.0, "zero velocity must stay exactly zero");
    }
    for &d in sim.dye().data() {
        assert_eq!(d, 0.0, "zero dye must stay exactly zero");
    }
    for &p in sim.pressure().data() {
        assert_eq!(p, 0.0, "pressure relaxation of zero divergence is zero");
    }
}

/// Repeated interaction at a moving point over many frames must never
/// produce NaN or infinity anywhere.
#[test]
fn test_sustained_interaction_stays_finite() {
    let mut sim = FluidSimulation2D::new(48, 48);
    for frame in 0..60 {
        let t = frame as f32 * 0.1;
        let x = 0.5 + 0.3 * t.cos();
        let y = 0.5 + 0.3 * t.sin();
        sim.add_force(x, y, t.cos() * 2.0, t.sin() * 2.0);
        sim.add_dye(x, y, 1.0, 0.5, 0.25);
        sim.step(0.016);
    }
    for &v in sim.velocity().data() {
        assert!(v.is_finite());
    }
    for &d in sim.dye().data() {
        assert!(d.is_finite());
    }
}

/// Injection coordinates outside [0,1] are clamped only by distance; the
/// splat center falls off-grid and the call must not panic.
#[test]
fn test_out_of_range_injection_is_safe() {
    let mut sim = FluidSimulation2D::new(32, 32);
    sim.add_force(-0.5, 1.8, 1.0, 1.0);
    sim.add_dye(2.0, -1.0, 1.0, 1.0, 1.0);
    sim.step(0.016);
    for &v in sim.velocity().data() {
        assert!(v.is_finite());
    }
}
