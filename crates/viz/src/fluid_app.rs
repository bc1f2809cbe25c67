//! Top-level interactive app: owns the GPU solver and the pointer
//! translator, and wires frame callbacks to solver passes.

use sim2d::constants::DEFAULT_GRID_SIZE;
use sim2d::SolverConfig;

use crate::app::{App, GpuContext};
use crate::gpu::GpuStableFluids;
use crate::input::PointerTranslator;

pub struct FluidApp {
    sim: GpuStableFluids,
    input: PointerTranslator,
}

impl App for FluidApp {
    fn init(ctx: &GpuContext) -> Self {
        let size = DEFAULT_GRID_SIZE as u32;
        let sim = GpuStableFluids::new(
            &ctx.device,
            size,
            size,
            ctx.surface_format(),
            SolverConfig::default(),
        );
        sim.seed_rotation(&ctx.queue);
        log::info!("Simulation grid: {size}x{size}");

        Self {
            sim,
            input: PointerTranslator::new(ctx.config.width, ctx.config.height),
        }
    }

    fn update(&mut self, ctx: &GpuContext, dt: f32) {
        self.input.advance(dt);
        if let Some(it) = self.input.take_interaction() {
            self.sim
                .add_force(&ctx.device, &ctx.queue, it.x, it.y, it.dx, it.dy);
            self.sim.add_dye(
                &ctx.device,
                &ctx.queue,
                it.x,
                it.y,
                it.color[0],
                it.color[1],
                it.color[2],
            );
        }
        self.sim.step(&ctx.device, &ctx.queue, dt);
    }

    fn render(
        &mut self,
        _ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        self.sim.render(encoder, view);
    }

    fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.input.on_move(x, y);
    }

    fn on_pointer_button(&mut self, pressed: bool) {
        self.input.on_button(pressed);
    }

    fn on_resize(&mut self, ctx: &GpuContext) {
        self.input.set_window_size(ctx.config.width, ctx.config.height);
    }

    fn title() -> &'static str {
        "GPU Fluid Simulation"
    }
}
