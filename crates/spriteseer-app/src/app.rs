//! `GameApp` trait definition.

use spriteseer_platform::PlatformEvent;
use spriteseer_world::World;

use crate::context::EngineContext;

/// A game driven by the engine's frame loop.
///
/// The framework handles window creation, GPU and asset initialization,
/// swapchain recreation, input, simulation stepping, geometry batching and
/// presentation. The application supplies the [`World`] it wants simulated.
pub trait GameApp: Sized {
    /// Build the application once the window, GPU context and assets exist.
    fn init(ctx: &mut EngineContext) -> anyhow::Result<Self>;

    fn world(&self) -> &World;

    fn world_mut(&mut self) -> &mut World;

    /// Called once per simulated frame, after the world has been updated.
    #[allow(unused_variables)]
    fn update(&mut self, ctx: &mut EngineContext, dt: f32) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called for every translated window event before the engine handles
    /// it. Return `true` to consume the event.
    #[allow(unused_variables)]
    fn on_event(&mut self, ctx: &mut EngineContext, event: &PlatformEvent) -> bool {
        false
    }

    /// Called before shutdown with the GPU idle.
    #[allow(unused_variables)]
    fn cleanup(&mut self, ctx: &mut EngineContext) {}
}
