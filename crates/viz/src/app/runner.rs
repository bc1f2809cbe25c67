use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use sim2d::constants::MAX_FRAME_DT;

use super::context::GpuContext;

pub const DEFAULT_WINDOW_SIZE: u32 = 800;

pub trait App: 'static {
    fn init(ctx: &GpuContext) -> Self;
    fn update(&mut self, ctx: &GpuContext, dt: f32);
    fn render(
        &mut self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    );

    /// Pointer position in window pixels, origin top-left.
    fn on_pointer_move(&mut self, _x: f32, _y: f32) {}
    /// Primary button press/release.
    fn on_pointer_button(&mut self, _pressed: bool) {}
    fn on_resize(&mut self, _ctx: &GpuContext) {}
    fn title() -> &'static str {
        "App"
    }
}

pub fn run<A: App>() -> ! {
    let event_loop = EventLoop::new().unwrap();
    let mut runner = AppRunner::<A>::new();
    let _ = event_loop.run_app(&mut runner);
    std::process::exit(0)
}

struct AppRunner<A: App> {
    window: Option<Arc<Window>>,
    ctx: Option<GpuContext>,
    app: Option<A>,
    last_time: Option<std::time::Instant>,
    frames: u32,
    fps_timer: f32,
}

impl<A: App> AppRunner<A> {
    fn new() -> Self {
        Self {
            window: None,
            ctx: None,
            app: None,
            last_time: None,
            frames: 0,
            fps_timer: 0.0,
        }
    }
}

impl<A: App> ApplicationHandler for AppRunner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = Arc::new(
                event_loop
                    .create_window(
                        Window::default_attributes()
                            .with_title(A::title())
                            .with_inner_size(winit::dpi::LogicalSize::new(
                                DEFAULT_WINDOW_SIZE,
                                DEFAULT_WINDOW_SIZE,
                            )),
                    )
                    .unwrap(),
            );
            self.window = Some(window.clone());

            let ctx = match pollster::block_on(GpuContext::new(window)) {
                Ok(ctx) => ctx,
                Err(e) => {
                    log::error!("GPU initialization failed: {e}");
                    std::process::exit(1);
                }
            };
            self.app = Some(A::init(&ctx));
            self.ctx = Some(ctx);
            self.last_time = Some(std::time::Instant::now());
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let (Some(ctx), Some(app)) = (&mut self.ctx, &mut self.app) {
            match event {
                WindowEvent::Resized(size) => {
                    ctx.resize(size.width, size.height);
                    app.on_resize(ctx);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    app.on_pointer_move(position.x as f32, position.y as f32);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if button == winit::event::MouseButton::Left {
                        app.on_pointer_button(state == winit::event::ElementState::Pressed);
                    }
                }
                WindowEvent::CloseRequested => {
                    std::process::exit(0);
                }
                _ => {}
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let (Some(ctx), Some(app), Some(last_time)) = (&self.ctx, &mut self.app, self.last_time)
        {
            let now = std::time::Instant::now();
            let elapsed = (now - last_time).as_secs_f32();
            // Cap dt so a stalled frame cannot destabilize the advection.
            let dt = elapsed.min(MAX_FRAME_DT);
            self.last_time = Some(now);

            app.update(ctx, dt);

            self.frames += 1;
            self.fps_timer += elapsed;
            if self.fps_timer >= 1.0 {
                log::info!("{} fps", self.frames);
                self.frames = 0;
                self.fps_timer = 0.0;
            }

            let surface_texture = ctx.surface.get_current_texture().unwrap();
            let view = surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

            app.render(ctx, &mut encoder, &view);

            ctx.queue.submit(std::iter::once(encoder.finish()));
            surface_texture.present();

            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}
