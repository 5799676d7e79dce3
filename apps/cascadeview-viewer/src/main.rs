mod state;
mod ui;

use anyhow::{Context as _, Result};
use cascadeview_render_wgpu::{GpuContext, WgpuRenderer};
use cascadeview_stream::StreamConfig;
use clap::Parser;
use egui::Context as EguiContext;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::state::{ViewerConfig, ViewerState};

#[derive(Parser)]
#[command(name = "cascadeview-viewer", about = "Stream and view appearance cascades")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Asset root (directory or http(s) URL); the query's `path` wins
    #[arg(long, default_value = ".")]
    base_path: String,

    /// View state query string, e.g. `scene=room&room.pos_x=1`
    #[arg(long, default_value = "")]
    query: String,

    /// Extension of the feature images
    #[arg(long, default_value = "jpg")]
    image_ext: String,

    /// Prefix of exported configuration links
    #[arg(long, default_value = "index.html")]
    share_base: String,

    /// Load events applied per frame
    #[arg(long, default_value = "32")]
    event_budget: usize,
}

/// Window, GPU and egui resources, created on `resumed`.
struct Gpu {
    window: Arc<Window>,
    context: GpuContext,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: ViewerState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    dragging: bool,
    last_frame: Instant,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: ViewerState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
            dragging: false,
            last_frame: Instant::now(),
            fatal: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let attrs = Window::default_attributes()
            .with_title("cascadeview")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let context = GpuContext::new(window.clone())?;
        let format = context.config.format;
        let renderer = WgpuRenderer::new(
            &context.device,
            format,
            context.config.width,
            context.config.height,
        );
        self.state.camera.aspect = context.aspect();

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&context.device, format, None, 1, false);

        Ok(Gpu {
            window,
            context,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;
        self.state.frame(dt);

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.context.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.context.reconfigure();
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let window_size = [gpu.context.config.width, gpu.context.config.height];
        let (vw, vh) = self.state.view.global.viewport(window_size[0], window_size[1]);
        let viewport = gpu.renderer.clamp_viewport([vw, vh]);
        self.state.camera.aspect = viewport[0] as f32 / viewport[1] as f32;

        let device = &gpu.context.device;
        let queue = &gpu.context.queue;
        gpu.renderer.render(
            device,
            queue,
            &view,
            &self.state.composer,
            &self.state.render_view(),
            viewport,
        );

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui::draw_ui(&mut self.state, ctx, window_size);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: window_size,
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        gpu.egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("cannot start renderer: {e:#}");
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.context.resize(new_size.width, new_size.height);
                    let (w, h) = (gpu.context.config.width, gpu.context.config.height);
                    gpu.renderer.resize(&gpu.context.device, w, h);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.dragging =
                    btn_state == ElementState::Pressed && !self.egui_ctx.wants_pointer_input();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if self.egui_ctx.wants_pointer_input() {
                    return;
                }
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                self.state.camera.zoom(steps);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.dragging {
                self.state.camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("cascadeview-viewer starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("cascade-loader")
        .build()
        .context("start loader runtime")?;

    let config = ViewerConfig {
        base_path: cli.base_path,
        image_extension: cli.image_ext,
        share_base: cli.share_base,
        stream: StreamConfig {
            event_budget: cli.event_budget.max(1),
        },
    };
    let view = cascadeview_viewstate::decode(&cli.query);
    tracing::info!(scenes = view.scenes.len(), "view state decoded");
    if view.scenes.is_empty() {
        tracing::error!("no scenes requested");
    }

    let state = ViewerState::new(&config, view, runtime.handle().clone());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
