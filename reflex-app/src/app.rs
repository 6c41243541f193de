use crate::config::AppSettings;
use ab_glyph::FontVec;
use anyhow::{anyhow, Result};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use reflex_client::{StatsClient, StatsService};
use reflex_core::{GlobalStats, InputEvent, StatsSnapshot, TrialResult};
use reflex_experiment::{ControllerEvent, ReactionController};
use reflex_render::{load_font, Dashboard, HitTarget, Layout, ScreenRenderer};
use reflex_timing::{HighPrecisionTimer, Timer};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Frames between two frame pacing reports in the debug log.
const FRAME_REPORT_INTERVAL: u64 = 600;

/// Results of background stats calls, delivered on the event loop thread
#[derive(Debug)]
pub enum AppEvent {
    GlobalStats(GlobalStats),
    Snapshot(StatsSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Input(InputEvent),
    Exit,
}

fn key_action(code: KeyCode) -> KeyAction {
    match code {
        KeyCode::Space => KeyAction::Input(InputEvent::Space),
        KeyCode::Escape => KeyAction::Exit,
        _ => KeyAction::Input(InputEvent::OtherKey),
    }
}

pub struct App {
    settings: AppSettings,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<ScreenRenderer>,
    controller: ReactionController<HighPrecisionTimer, ThreadRng>,
    frame_timer: HighPrecisionTimer,
    last_frame_ns: Option<u64>,
    frames: u64,
    font: Option<Arc<FontVec>>,
    dashboard: Dashboard,
    runtime: Runtime,
    client: StatsClient,
    proxy: EventLoopProxy<AppEvent>,
    clipboard: Option<arboard::Clipboard>,
    cursor: Option<(f32, f32)>,

    should_exit: bool,
}

impl App {
    pub fn new(settings: AppSettings, proxy: EventLoopProxy<AppEvent>) -> Result<Self> {
        let timer = HighPrecisionTimer::new();
        let frame_timer = timer.clone();
        let controller = ReactionController::new(settings.reaction.clone(), timer, rand::rng());

        let font = settings.font_path.as_ref().and_then(|path| match load_font(path) {
            Ok(font) => Some(Arc::new(font)),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "font unavailable, text will not be drawn");
                None
            }
        });
        let chart_size =
            Layout::new(settings.window_width, settings.window_height).chart_size();
        let dashboard = Dashboard::new(font.clone(), chart_size);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let client = StatsClient::new(settings.server_url.clone())?;

        Ok(Self {
            settings,
            window: None,
            pixels: None,
            renderer: None,
            controller,
            frame_timer,
            last_frame_ns: None,
            frames: 0,
            font,
            dashboard,
            runtime,
            client,
            proxy,
            clipboard: None,
            cursor: None,
            should_exit: false,
        })
    }

    pub fn run(mut self, event_loop: EventLoop<AppEvent>) -> Result<()> {
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            server_url = %self.settings.server_url,
            "starting reaction test; click the box or press SPACE, ESC exits"
        );
        self.load_global_stats();
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Reflex")
            .with_inner_size(PhysicalSize::new(
                self.settings.window_width,
                self.settings.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale_factor = window.scale_factor(),
            "window created"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);

        let renderer = ScreenRenderer::new(size.width, size.height, self.font.clone())?;
        self.dashboard.resize_charts(renderer.layout().chart_size());
        self.renderer = Some(renderer);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    /// Registers with the stats service, then seeds the population chart.
    fn load_global_stats(&self) {
        let client = self.client.clone();
        let proxy = self.proxy.clone();
        self.runtime.spawn(async move {
            if let Err(e) = client.connect().await {
                warn!(error = %e, "could not open stats session");
            }
            match client.global_stats().await {
                Ok(stats) => {
                    if proxy.send_event(AppEvent::GlobalStats(stats)).is_err() {
                        debug!("event loop closed before global stats arrived");
                    }
                }
                Err(e) => warn!(error = %e, "global stats unavailable"),
            }
        });
    }

    fn submit(&self, result: TrialResult) {
        let client = self.client.clone();
        let proxy = self.proxy.clone();
        self.runtime.spawn(async move {
            match client.submit(&result).await {
                Ok(snapshot) => {
                    if proxy.send_event(AppEvent::Snapshot(snapshot)).is_err() {
                        debug!("event loop closed before stats arrived");
                    }
                }
                Err(e) => warn!(error = %e, time = result.reaction_time_ms, "submission failed"),
            }
        });
    }

    fn dispatch(&mut self, input: InputEvent) {
        let events = self.controller.handle_input(input);
        self.process(events);
    }

    fn process(&mut self, events: Vec<ControllerEvent>) {
        for event in events {
            if let ControllerEvent::Submit(result) = event {
                self.submit(result);
            }
        }
    }

    fn update(&mut self) {
        let events = self.controller.update();
        self.process(events);
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let now_ns = self.frame_timer.now();
        if let Some(last) = self.last_frame_ns {
            self.frame_timer
                .record_frame(Duration::from_nanos(now_ns.saturating_sub(last)));
        }
        self.last_frame_ns = Some(now_ns);
        self.frames += 1;

        renderer.render_frame(
            &self.controller.appearance(),
            &self.dashboard,
            now_ns,
            pixels.frame_mut(),
        )?;
        pixels.render().map_err(|e| anyhow!("presenting frame: {e}"))?;

        if self.frames % FRAME_REPORT_INTERVAL == 0 {
            let stats = self.frame_timer.frame_stats();
            debug!(
                avg_ms = stats.average_frame_time_ns / 1e6,
                jitter_ms = stats.jitter_ns / 1e6,
                fps = stats.effective_fps,
                "frame pacing"
            );
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        match key_action(code) {
            KeyAction::Input(input) => self.dispatch(input),
            KeyAction::Exit => self.cleanup_and_exit(event_loop),
        }
    }

    fn handle_click(&mut self) {
        let (Some((x, y)), Some(renderer)) = (self.cursor, self.renderer.as_ref()) else {
            return;
        };
        match renderer.layout().hit_test(x, y) {
            Some(HitTarget::ReactionBox) => self.dispatch(InputEvent::Click),
            Some(HitTarget::CopyLink) => self.copy_link(),
            None => {}
        }
    }

    fn copy_link(&mut self) {
        let link = self.settings.share_link().to_string();
        if self.clipboard.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    warn!(error = %e, "clipboard unavailable");
                    return;
                }
            }
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return;
        };
        match clipboard.set_text(link) {
            Ok(()) => {
                self.dashboard.copy_link.confirm(self.frame_timer.now());
                info!("share link copied");
            }
            Err(e) => warn!(error = %e, "failed to copy share link"),
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                warn!(error = %format!("{e:#}"), "failed to resize canvas");
                return;
            }
            self.dashboard.resize_charts(renderer.layout().chart_size());
        }
        debug!(width = new_size.width, height = new_size.height, "window resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        info!(rounds = self.controller.rounds_started(), "exiting");
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %format!("{e:#}"), "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::GlobalStats(stats) => self.dashboard.apply_global(&stats),
            AppEvent::Snapshot(snapshot) => self.dashboard.apply_snapshot(&snapshot),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    error!(error = %format!("{e:#}"), "render failed");
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(code, event_loop);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.handle_click(),
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        debug!("application resources cleaned up");
    }
}
