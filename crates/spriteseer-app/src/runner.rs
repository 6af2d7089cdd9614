//! Application runner and event loop.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use spriteseer_gpu::{AcquireOutcome, PresentOutcome};
use spriteseer_input::KeyboardState;
use spriteseer_platform::{load_window_icon, PlatformEvent};
use spriteseer_render::{GeometryBatcher, RemapOutcome};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::app::GameApp;
use crate::clock::{FpsStats, SimClock};
use crate::config::AppConfig;
use crate::context::EngineContext;
use crate::scheduler::{FramePhase, FrameSchedule};

/// Run a [`GameApp`] with the given configuration.
///
/// Initializes logging (`RUST_LOG`, default `info`), creates the window,
/// the GPU context and the assets, and runs the frame loop until the window
/// is closed. Setup and frame errors end the loop and are returned.
pub fn run_app<A: GameApp + 'static>(config: AppConfig) -> anyhow::Result<()> {
    // A subscriber may already be installed by an embedding process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    info!("{} starting...", config.title);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = AppRunner::<A> {
        config,
        state: None,
        failure: None,
    };
    event_loop.run_app(&mut runner)?;

    match runner.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Internal application runner that implements winit's `ApplicationHandler`.
struct AppRunner<A: GameApp> {
    config: AppConfig,
    state: Option<AppState<A>>,
    failure: Option<anyhow::Error>,
}

/// Internal application state.
///
/// `app` is declared before `ctx` so the world and anything the
/// application holds are dropped while the device is still alive.
struct AppState<A: GameApp> {
    app: A,
    ctx: EngineContext,
    keyboard: KeyboardState,
    batcher: GeometryBatcher,
    clock: SimClock,
    fps: FpsStats,
    /// A rebuild was requested by a resize or a suboptimal swapchain.
    pending_resize: bool,
    target_frame_time: Option<Duration>,
}

/// How a frame ended.
enum FrameEnd {
    Completed,
    /// The swapchain was stale at acquisition and has been rebuilt.
    Abandoned,
}

impl<A: GameApp + 'static> ApplicationHandler for AppRunner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        info!("Creating application state...");

        match self.create_state(event_loop) {
            Ok(state) => {
                self.state = Some(state);
                info!("Application ready!");
            }
            Err(e) => {
                error!("Failed to initialize application: {e:#}");
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        if matches!(event, WindowEvent::RedrawRequested) {
            if let Err(e) = state.run_frame() {
                error!("Frame error: {e:#}");
                self.fail(event_loop, e);
            }
            return;
        }

        let Some(event) = PlatformEvent::from_window_event(&event) else {
            return;
        };
        if state.app.on_event(&mut state.ctx, &event) {
            return;
        }

        match event {
            PlatformEvent::Quit => {
                info!("Close requested");
                if let Some(mut state) = self.state.take() {
                    state.shutdown();
                }
                event_loop.exit();
            }
            PlatformEvent::KeyDown(key) => state.keyboard.process_key(key, true),
            PlatformEvent::KeyUp(key) => state.keyboard.process_key(key, false),
            PlatformEvent::Resized(extent) => {
                debug!("Window resized to {}x{}", extent.width, extent.height);
                state.pending_resize = true;
            }
            PlatformEvent::FocusLost => state.keyboard.clear(),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.ctx.window.request_redraw();
        }
    }
}

impl<A: GameApp + 'static> AppRunner<A> {
    fn create_state(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState<A>> {
        let attributes = self
            .config
            .platform()
            .window_attributes()
            .with_window_icon(load_window_icon(&self.config.res_dir));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let mut ctx = EngineContext::new(window, &self.config)?;
        let app = A::init(&mut ctx)?;
        info!("World holds {} entities", app.world().len());

        let target_frame_time = self
            .config
            .target_fps
            .filter(|&fps| fps > 0)
            .map(|fps| Duration::from_nanos(1_000_000_000 / u64::from(fps)));

        Ok(AppState {
            app,
            ctx,
            keyboard: KeyboardState::new(),
            batcher: GeometryBatcher::new(),
            clock: SimClock::new(),
            fps: FpsStats::default(),
            pending_resize: false,
            target_frame_time,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        if let Some(mut state) = self.state.take() {
            state.shutdown();
        }
        self.failure.get_or_insert(e);
        event_loop.exit();
    }
}

impl<A: GameApp> AppState<A> {
    fn run_frame(&mut self) -> anyhow::Result<()> {
        let frame_start = Instant::now();
        let visible = !self.ctx.window_extent().is_empty();

        if visible && self.pending_resize {
            self.recreate_swapchain()?;
        }

        let schedule = FrameSchedule::new(visible);
        let mut slot = 0;
        let mut image_index = 0;

        for &phase in schedule.phases() {
            trace!(frame = self.ctx.frame_count(), ?phase);
            match phase {
                FramePhase::PollEvents => self.apply_input(),
                FramePhase::WaitForSlot => {
                    slot = self.ctx.sync.acquire_slot();
                    self.ctx.wait_for_slot(slot)?;
                }
                FramePhase::Acquire => match self.ctx.acquire(slot)? {
                    AcquireOutcome::Acquired {
                        image_index: index,
                        suboptimal,
                    } => {
                        image_index = index;
                        self.pending_resize |= suboptimal;
                    }
                    AcquireOutcome::Stale => {
                        debug!("Swapchain out of date at acquire");
                        self.recreate_swapchain()?;
                        self.finish(FrameEnd::Abandoned, frame_start);
                        return Ok(());
                    }
                },
                FramePhase::Simulate => self.simulate()?,
                FramePhase::Remap => {
                    let outcome =
                        self.batcher
                            .remap(self.app.world(), &mut self.ctx.state, &mut self.ctx.geometry)?;
                    if let RemapOutcome::Remapped {
                        quad_vertices,
                        line_vertices,
                    } = outcome
                    {
                        trace!(?quad_vertices, ?line_vertices, "Geometry remapped");
                    }
                }
                FramePhase::RecordAndSubmit => self.ctx.record_and_submit(slot, image_index)?,
                FramePhase::Present => {
                    if self.ctx.present(slot, image_index)? == PresentOutcome::Stale {
                        debug!("Swapchain stale or suboptimal at present");
                        self.recreate_swapchain()?;
                    }
                }
            }
        }

        self.finish(FrameEnd::Completed, frame_start);
        Ok(())
    }

    /// Fold this frame's keys into the simulation and fire the toggles.
    fn apply_input(&mut self) {
        let keys = self.keyboard.snapshot();
        self.ctx.state.keys = keys;
        for toggle in self.keyboard.just_pressed_toggles() {
            toggle.apply(&mut self.ctx.state);
        }
        self.app.world_mut().on_input(keys, &mut self.ctx.state);
        self.keyboard.end_frame();
    }

    fn simulate(&mut self) -> anyhow::Result<()> {
        let dt = self.clock.tick();
        self.ctx.state.advance(dt);
        self.app.world_mut().update(dt, &mut self.ctx.state);
        self.app.update(&mut self.ctx, dt)?;

        if let Some(fps) = self.fps.record(dt) {
            debug!("FPS: {fps:.1}");
        }
        Ok(())
    }

    /// Frame pacing; an abandoned frame retries immediately.
    fn finish(&self, end: FrameEnd, frame_start: Instant) {
        let FrameEnd::Completed = end else {
            trace!("Frame abandoned");
            return;
        };
        if let Some(target) = self.target_frame_time {
            let elapsed = frame_start.elapsed();
            if elapsed < target {
                thread::sleep(target - elapsed);
            }
        }
    }

    fn recreate_swapchain(&mut self) -> anyhow::Result<()> {
        if self.ctx.window_extent().is_empty() {
            // Minimized: rebuild once the window has area again.
            self.pending_resize = true;
            return Ok(());
        }

        self.ctx.recreate_swapchain()?;
        self.app.world_mut().rescale(&mut self.ctx.state);
        self.pending_resize = false;
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some((min, max, avg)) = self.fps.summary() {
            info!("FPS Statistics:");
            info!("  Min: {min:.1}");
            info!("  Max: {max:.1}");
            info!("  Avg: {avg:.1}");
            info!("  Total frames: {}", self.fps.frames());
        }

        info!("Starting cleanup...");
        if let Err(e) = self.ctx.gpu.wait_idle() {
            warn!("Failed to wait idle: {e}");
        }
        self.app.cleanup(&mut self.ctx);
        info!("Cleanup complete");
    }
}
