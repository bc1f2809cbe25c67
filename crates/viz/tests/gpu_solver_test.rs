//! GPU solver tests.
//!
//! Each test skips gracefully when no compatible adapter is present so the
//! suite still passes on headless CI machines. The CPU solver in `sim2d` is
//! used as the behavioral reference where exact numbers matter.

use viz::gpu::GpuStableFluids;

use sim2d::{FluidSimulation2D, SolverConfig};

/// Initialize wgpu device and queue for GPU tests.
/// Returns None if no compatible GPU adapter is found.
fn init_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;

    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("GPU Solver Test Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
        },
        None,
    ))
    .ok()?;

    Some((device, queue))
}

fn make_solver(device: &wgpu::Device, size: u32) -> GpuStableFluids {
    GpuStableFluids::new(
        device,
        size,
        size,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        SolverConfig::default(),
    )
}

fn mean_abs(values: &[f32]) -> f32 {
    values.iter().map(|v| v.abs()).sum::<f32>() / values.len() as f32
}

#[test]
fn test_step_is_identity_on_still_dye() {
    let Some((device, queue)) = init_device_queue() else {
        eprintln!("No GPU adapter found; skipping test.");
        return;
    };

    let mut sim = make_solver(&device, 32);
    sim.clear_velocity(&queue);
    sim.add_dye(&device, &queue, 0.5, 0.5, 1.0, 0.4, 0.2);

    let before = sim.read_dye(&device, &queue).expect("dye readback");
    sim.step(&device, &queue, 0.016);
    let after = sim.read_dye(&device, &queue).expect("dye readback");

    // Zero velocity means the backtrace lands exactly on each cell, so the
    // resampled dye is bit-identical.
    assert_eq!(before, after, "advection through zero velocity must be exact");
}

#[test]
fn test_projection_reduces_divergence() {
    let Some((device, queue)) = init_device_queue() else {
        eprintln!("No GPU adapter found; skipping test.");
        return;
    };

    let size = 64u32;
    let mut sim = make_solver(&device, size);
    sim.clear_velocity(&queue);
    sim.add_force(&device, &queue, 0.5, 0.5, 1.0, 0.0);
    sim.step(&device, &queue, 0.016);

    // The divergence buffer holds the pre-projection divergence of this
    // step; recompute divergence of the post-projection velocity on the CPU
    // with the same centered stencil.
    let div_pre = sim.read_divergence(&device, &queue).expect("div readback");
    let vel = sim.read_velocity(&device, &queue).expect("vel readback");

    let w = size as i32;
    let at = |i: i32, j: i32| {
        let ci = i.clamp(0, w - 1);
        let cj = j.clamp(0, w - 1);
        vel[(cj * w + ci) as usize]
    };
    let mut div_post = Vec::with_capacity(vel.len());
    for j in 0..w {
        for i in 0..w {
            let d = 0.5
                * ((at(i + 1, j)[0] - at(i - 1, j)[0]) + (at(i, j + 1)[1] - at(i, j - 1)[1]));
            div_post.push(d);
        }
    }

    let before = mean_abs(&div_pre);
    let after = mean_abs(&div_post);
    assert!(
        after < before,
        "projection should reduce mean |divergence|: {before} -> {after}"
    );
}

#[test]
fn test_force_splat_is_localized_and_symmetric() {
    let Some((device, queue)) = init_device_queue() else {
        eprintln!("No GPU adapter found; skipping test.");
        return;
    };

    let size = 64u32;
    let mut sim = make_solver(&device, size);
    sim.clear_velocity(&queue);
    sim.add_force(&device, &queue, 0.5, 0.5, 1.0, 0.0);

    let vel = sim.read_velocity(&device, &queue).expect("vel readback");
    let w = size as usize;
    let at = |i: usize, j: usize| vel[j * w + i];

    let center = at(32, 32)[0];
    assert!(center > 0.04, "center gets nearly full strength, got {center}");

    for offset in 1..16usize {
        let right = at(32 + offset, 32)[0];
        let left = at(32 - offset, 32)[0];
        assert!(
            (right - left).abs() < 1e-5,
            "Gaussian falloff is radially symmetric"
        );
        assert!(right < center, "falloff decays away from the center");
    }

    let corner = at(0, 0)[0];
    assert!(
        corner.abs() < 1e-4,
        "corner sees only the effectively-zero tail, got {corner}"
    );
}

#[test]
fn test_gpu_step_matches_cpu_reference() {
    let Some((device, queue)) = init_device_queue() else {
        eprintln!("No GPU adapter found; skipping test.");
        return;
    };

    let size = 32u32;
    let mut gpu = make_solver(&device, size);
    gpu.seed_rotation(&queue);
    let mut cpu = FluidSimulation2D::new(size as usize, size as usize);

    for _ in 0..3 {
        gpu.step(&device, &queue, 0.016);
        cpu.step(0.016);
    }

    let gpu_vel = gpu.read_velocity(&device, &queue).expect("vel readback");
    let cpu_vel = cpu.velocity();

    let mut max_diff = 0.0f32;
    for j in 0..size as usize {
        for i in 0..size as usize {
            let g = gpu_vel[j * size as usize + i];
            let c = cpu.velocity().at(i, j);
            max_diff = max_diff.max((g[0] - c[0]).abs()).max((g[1] - c[1]).abs());
        }
    }
    assert!(
        max_diff < 1e-3,
        "GPU and CPU solvers should agree closely, max diff {max_diff}"
    );
    assert_eq!(gpu_vel.len(), cpu_vel.data().len() / 2);
}
