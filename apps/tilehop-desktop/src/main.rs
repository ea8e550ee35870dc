use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tilehop_common::{CameraMode, Direction};
use tilehop_input::{InputEvent, Modifier, PointerButton};
use tilehop_render_wgpu::WgpuRenderer;
use tilehop_session::{FrameTimer, GameLoop, SessionConfig};
use tilehop_tools::{BoardInspector, BoardSummary};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "tilehop-desktop", about = "Play tilehop in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Board seed (defaults to the clock)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Session config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Translate a key transition into a game input event.
fn map_key(key: KeyCode, pressed: bool) -> Option<InputEvent> {
    let direction = match key {
        KeyCode::ArrowUp => Some(Direction::Up),
        KeyCode::ArrowDown => Some(Direction::Down),
        KeyCode::ArrowLeft => Some(Direction::Left),
        KeyCode::ArrowRight => Some(Direction::Right),
        _ => None,
    };
    if let Some(dir) = direction {
        return Some(if pressed {
            InputEvent::DirectionPressed(dir)
        } else {
            InputEvent::DirectionReleased(dir)
        });
    }
    if key == KeyCode::Space {
        return Some(if pressed {
            InputEvent::ModifierPressed(Modifier::Space)
        } else {
            InputEvent::ModifierReleased(Modifier::Space)
        });
    }
    if !pressed {
        return None;
    }
    match key {
        KeyCode::KeyO => Some(InputEvent::CameraModeSelected(CameraMode::Tower)),
        KeyCode::KeyT => Some(InputEvent::CameraModeSelected(CameraMode::Top)),
        KeyCode::KeyP => Some(InputEvent::CameraModeSelected(CameraMode::PlayerView)),
        KeyCode::KeyC => Some(InputEvent::CameraModeSelected(CameraMode::FollowView)),
        KeyCode::KeyH => Some(InputEvent::CameraModeSelected(CameraMode::Helicopter)),
        KeyCode::Escape | KeyCode::KeyQ => Some(InputEvent::Quit),
        _ => None,
    }
}

/// Scroll deltas only matter by sign; both wheel kinds map to one event.
fn scroll_delta(delta: MouseScrollDelta) -> Vec2 {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => Vec2::new(x, y),
        MouseScrollDelta::PixelDelta(p) => Vec2::new(p.x as f32, p.y as f32),
    }
}

fn map_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Everything tied to the window and GPU device.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        session: &SessionConfig,
        egui_ctx: &EguiContext,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Tilehop")
            .with_inner_size(PhysicalSize::new(
                session.window_width,
                session.window_height,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tilehop_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Draw the HUD on top of the already rendered scene.
    fn paint_hud(&mut self, egui_ctx: &EguiContext, view: &wgpu::TextureView, hud: &Hud) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| hud.show(ctx));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
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
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

/// One HUD line: FPS plus min/avg/max frame time over the timer's window.
fn frame_stats(timer: &FrameTimer) -> String {
    let ms = |d: std::time::Duration| d.as_secs_f32() * 1000.0;
    format!(
        "FPS: {:.0}  frame {:.1}/{:.1}/{:.1} ms over {}",
        timer.fps(),
        ms(timer.min()),
        ms(timer.average()),
        ms(timer.max()),
        timer.count()
    )
}

/// Values shown in the HUD for one frame.
struct Hud {
    visible: bool,
    summary: BoardSummary,
    camera: CameraMode,
    rotation: f32,
    zoom: i32,
    frames: String,
}

impl Hud {
    fn show(&self, ctx: &EguiContext) {
        if !self.visible {
            return;
        }
        egui::Window::new("Tilehop")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading(format!("Score: {}", self.summary.score));
                ui.label(format!("Position: {}", self.summary.position));
                ui.label(format!("Obstacle layout: #{}", self.summary.obstacle_generation));
                ui.separator();
                ui.label(format!(
                    "Camera: {}  θ={:.0}°  zoom={}",
                    self.camera, self.rotation, self.zoom
                ));
                ui.label(self.frames.as_str());
                ui.separator();
                ui.small("Arrows: step | Space+Arrow: jump | O/T/P/C/H: camera");
                ui.small("Scroll: rotate/zoom | Drag (helicopter): orbit | F1: HUD | Esc/Q: quit");
            });
    }
}

struct App {
    session: SessionConfig,
    game: Option<GameLoop>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    started: Instant,
    last_frame: Instant,
    frame_timer: FrameTimer,
    last_cursor: Option<PhysicalPosition<f64>>,
    show_hud: bool,
    reported: bool,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(session: SessionConfig) -> Self {
        Self {
            session,
            game: None,
            gpu: None,
            egui_ctx: EguiContext::default(),
            started: Instant::now(),
            last_frame: Instant::now(),
            frame_timer: FrameTimer::new(120),
            last_cursor: None,
            show_hud: true,
            reported: false,
            fatal: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut gpu = Gpu::new(event_loop, &self.session, &self.egui_ctx)?;
        let game = GameLoop::from_config(&self.session, &mut gpu.renderer)?;
        self.started = Instant::now();
        self.last_frame = self.started;
        self.game = Some(game);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn send(&mut self, event: InputEvent) {
        if let Some(game) = &mut self.game {
            game.handle_event(&event);
        }
    }

    /// Print the result and close the window once the session is over.
    fn finish_if_done(&mut self, event_loop: &ActiveEventLoop) {
        let Some(outcome) = self.game.as_ref().and_then(GameLoop::outcome) else {
            return;
        };
        if !self.reported {
            self.reported = true;
            println!("{outcome}");
        }
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        self.frame_timer.record(now - self.last_frame);
        self.last_frame = now;

        let Self {
            game: Some(game),
            gpu: Some(gpu),
            egui_ctx,
            started,
            frame_timer,
            show_hud,
            ..
        } = self
        else {
            return;
        };

        if let Err(e) = game.tick(started.elapsed(), &mut gpu.renderer) {
            tracing::error!("frame skipped: {e}");
        }
        for event in game.state_mut().drain_events() {
            tracing::debug!(?event, "game event");
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
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

        gpu.renderer.submit(&gpu.device, &gpu.queue, &view);

        let camera = game.camera();
        let hud = Hud {
            visible: *show_hud,
            summary: BoardInspector::summary(game.state()),
            camera: camera.mode(),
            rotation: camera.rotation_degrees(),
            zoom: camera.zoom_offset(),
            frames: frame_stats(frame_timer),
        };
        gpu.paint_hud(egui_ctx, &view, &hud);

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.fatal = Some(e);
            event_loop.exit();
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
            WindowEvent::CloseRequested => self.send(InputEvent::WindowClosed),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size.width, size.height);
                }
                self.send(InputEvent::WindowResized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                if pressed && key == KeyCode::F1 {
                    self.show_hud = !self.show_hud;
                } else if !repeat {
                    if let Some(input) = map_key(key, pressed) {
                        self.send(input);
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.send(InputEvent::Scrolled(scroll_delta(delta)));
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(button) = map_button(button) {
                    self.send(InputEvent::PointerButton {
                        button,
                        pressed: state == ElementState::Pressed,
                    });
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.last_cursor.replace(position) {
                    let delta = Vec2::new(
                        (position.x - last.x) as f32,
                        (position.y - last.y) as f32,
                    );
                    self.send(InputEvent::PointerMoved(delta));
                }
            }
            WindowEvent::CursorLeft { .. } => self.last_cursor = None,
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }

        self.finish_if_done(event_loop);
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

    let mut session = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if cli.seed.is_some() {
        session.seed = cli.seed;
    }

    tracing::info!("tilehop-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(session);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
