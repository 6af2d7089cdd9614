//! Engine context: every long-lived resource the frame loop uses.

use std::sync::Arc;

use anyhow::Context as _;
use ash::vk;
use raw_window_handle::HasDisplayHandle;
use spriteseer_assets::AssetProvider;
use spriteseer_audio::AudioPlayer;
use spriteseer_core::constants::{MAX_FRAMES_IN_FLIGHT, MAX_LINES, MAX_QUADS};
use spriteseer_core::{Extent, SimState};
use spriteseer_gpu::{
    AcquireOutcome, CommandPool, FrameSynchronizer, GpuContext, GpuContextBuilder, PresentOutcome,
    RenderPass, SurfaceContext, SwapchainPlan, SwapchainResources,
};
use spriteseer_platform::drawable_extent;
use spriteseer_render::{record_frame, FrameRecording, GeometryBuffers, SpritePipelines};
use winit::window::Window;

use crate::config::AppConfig;

/// Resources shared by the frame loop and the application.
///
/// Fields drop in declaration order: everything that lives on the device
/// goes before the command pool, the surface, the GPU context and finally
/// the window.
pub struct EngineContext {
    /// The shared simulation/render record.
    pub state: SimState,
    /// Background music and sound effects; `None` without an output device.
    pub audio: Option<AudioPlayer>,
    pub(crate) geometry: GeometryBuffers,
    pub(crate) pipelines: SpritePipelines,
    pub(crate) sync: FrameSynchronizer,
    pub(crate) swapchain: Option<SwapchainResources>,
    pub(crate) render_pass: RenderPass,
    /// Textures and the resource catalog.
    pub assets: AssetProvider,
    pub(crate) command_pool: CommandPool,
    pub(crate) surface: SurfaceContext,
    pub gpu: GpuContext,
    pub window: Arc<Window>,
    pub(crate) vsync: bool,
}

impl EngineContext {
    /// Bring up the GPU, the swapchain, the assets and the renderer for
    /// `window`.
    pub(crate) fn new(window: Arc<Window>, config: &AppConfig) -> anyhow::Result<Self> {
        let display = window.display_handle()?.as_raw();
        let gpu = GpuContextBuilder::new()
            .app_name(&config.title)
            .validation(config.validation)
            .display(display)
            .build()?;
        tracing::info!("GPU: {}", gpu.capabilities().summary());

        // SAFETY: the window outlives the surface (it is dropped last).
        let surface = unsafe { SurfaceContext::from_window(&gpu, window.as_ref())? };
        // SAFETY: the device is valid and the family comes from it.
        let command_pool =
            unsafe { CommandPool::new(gpu.shared_device(), gpu.graphics_queue_family())? };

        let plan = SwapchainPlan::negotiate(
            &surface.capabilities()?,
            vk_extent(drawable_extent(&window)),
            config.vsync,
        )?;
        let render_pass = RenderPass::new(gpu.shared_device(), plan.surface_format.format)?;
        let swapchain = SwapchainResources::create(&gpu, &surface, &render_pass, plan)?;
        log_swapchain("created", &swapchain);

        let assets = AssetProvider::load(&gpu, &command_pool, &config.res_dir)
            .with_context(|| format!("loading assets from {}", config.res_dir.display()))?;

        // SAFETY: the texture views and samplers live in `assets`, which
        // outlives the pipelines.
        let pipelines = unsafe {
            SpritePipelines::new(&gpu.shared_device(), &render_pass, &assets.texture_handles())?
        };
        let geometry = GeometryBuffers::new(gpu.allocator().clone(), MAX_QUADS, MAX_LINES)?;
        // SAFETY: the pool belongs to this device.
        let sync = unsafe { FrameSynchronizer::new(gpu.device(), &command_pool, MAX_FRAMES_IN_FLIGHT)? };

        let sounds = assets
            .sounds()
            .iter()
            .map(|entry| (entry.name.clone(), entry.path.clone()))
            .collect();
        let audio = AudioPlayer::new(sounds)
            .inspect_err(|e| tracing::warn!("Audio disabled: {e}"))
            .ok();

        let state = SimState::new(extent_of(&swapchain));

        Ok(Self {
            state,
            audio,
            geometry,
            pipelines,
            sync,
            swapchain: Some(swapchain),
            render_pass,
            assets,
            command_pool,
            surface,
            gpu,
            window,
            vsync: config.vsync,
        })
    }

    /// Current drawable size of the window.
    pub fn window_extent(&self) -> Extent {
        drawable_extent(&self.window)
    }

    /// Extent of the current swapchain, if one exists.
    pub fn swapchain_extent(&self) -> Option<Extent> {
        self.swapchain.as_ref().map(extent_of)
    }

    /// Tear down the swapchain resource set and build a new one for the
    /// current window size, then refresh `state.extent`.
    ///
    /// The caller rescales the world afterwards.
    pub(crate) fn recreate_swapchain(&mut self) -> anyhow::Result<()> {
        self.gpu.wait_idle()?;
        drop(self.swapchain.take());

        let plan = SwapchainPlan::negotiate(
            &self.surface.capabilities()?,
            vk_extent(self.window_extent()),
            self.vsync,
        )?;
        if plan.surface_format.format != self.render_pass.color_format() {
            anyhow::bail!(
                "surface format changed from {:?} to {:?}",
                self.render_pass.color_format(),
                plan.surface_format.format
            );
        }
        let swapchain =
            SwapchainResources::create(&self.gpu, &self.surface, &self.render_pass, plan)?;
        log_swapchain("recreated", &swapchain);

        self.state.extent = extent_of(&swapchain);
        self.swapchain = Some(swapchain);
        Ok(())
    }

    /// Wait for the slot's previous submission.
    pub(crate) fn wait_for_slot(&self, slot: usize) -> anyhow::Result<()> {
        self.sync.wait_for_slot_ready(self.gpu.device(), slot)?;
        Ok(())
    }

    /// Acquire the next image with the slot's semaphore; on success the slot
    /// is armed for recording.
    pub(crate) fn acquire(&self, slot: usize) -> anyhow::Result<AcquireOutcome> {
        let Some(swapchain) = &self.swapchain else {
            return Ok(AcquireOutcome::Stale);
        };
        let frame = self.sync.slot(slot);
        // SAFETY: the slot's fence has signaled, so its semaphore is unsignaled
        // with no pending operation.
        let outcome = unsafe { swapchain.acquire_next_image(frame.image_available)? };
        if matches!(outcome, AcquireOutcome::Acquired { .. }) {
            self.sync.arm_slot(self.gpu.device(), slot)?;
        }
        Ok(outcome)
    }

    /// Record the frame into the slot's command buffer and submit it.
    pub(crate) fn record_and_submit(&self, slot: usize, image_index: u32) -> anyhow::Result<()> {
        let swapchain = self
            .swapchain
            .as_ref()
            .context("recording without a swapchain")?;
        let recording = FrameRecording {
            device: self.gpu.device(),
            dynamic_state3: self.gpu.dynamic_state3(),
            render_pass: &self.render_pass,
            pipelines: &self.pipelines,
            geometry: &self.geometry,
            framebuffer: swapchain.framebuffer(image_index),
            extent: swapchain.extent(),
            polygon_mode: self.state.polygon_mode,
        };
        // SAFETY: the slot was armed after acquiring `image_index`, so its
        // command buffer is reset and not pending.
        unsafe {
            record_frame(self.sync.slot(slot).command_buffer, &recording)?;
            self.sync
                .submit(self.gpu.device(), self.gpu.graphics_queue(), slot)?;
        }
        Ok(())
    }

    /// Present `image_index` once the slot's rendering has finished.
    pub(crate) fn present(&self, slot: usize, image_index: u32) -> anyhow::Result<PresentOutcome> {
        let swapchain = self
            .swapchain
            .as_ref()
            .context("presenting without a swapchain")?;
        // SAFETY: presentation uses the graphics queue, checked at surface creation.
        let outcome = unsafe {
            swapchain.present(
                self.gpu.graphics_queue(),
                image_index,
                self.sync.slot(slot).render_finished,
            )?
        };
        Ok(outcome)
    }

    pub const fn frame_count(&self) -> u64 {
        self.sync.frame_count()
    }

    /// Play a catalogued sound, replacing whatever is playing.
    pub fn play_sound(&mut self, name: &str) -> anyhow::Result<()> {
        if let Some(audio) = &mut self.audio {
            audio.play_sound(name)?;
        }
        Ok(())
    }
}

impl Drop for EngineContext {
    fn drop(&mut self) {
        if let Err(e) = self.gpu.wait_idle() {
            tracing::error!("Failed to wait idle: {e}");
        }
        // SAFETY: the device is idle.
        unsafe { self.sync.destroy(self.gpu.device()) };
        tracing::debug!("Engine context released");
    }
}

fn extent_of(swapchain: &SwapchainResources) -> Extent {
    let extent = swapchain.extent();
    Extent::new(extent.width, extent.height)
}

const fn vk_extent(extent: Extent) -> vk::Extent2D {
    vk::Extent2D {
        width: extent.width,
        height: extent.height,
    }
}

fn log_swapchain(action: &str, swapchain: &SwapchainResources) {
    let extent = swapchain.extent();
    tracing::info!(
        "Swapchain {action}: {}x{} ({} images, {:?}, {:?})",
        extent.width,
        extent.height,
        swapchain.image_count(),
        swapchain.plan().surface_format.format,
        swapchain.plan().present_mode
    );
}
