//! Application framework for the Sprite Seer engine.
//!
//! The framework owns the window, the Vulkan objects, the assets and the
//! frame loop. An application only builds its [`World`] and may react to
//! events:
//!
//! ```no_run
//! use spriteseer_app::{run_app, AppConfig, EngineContext, GameApp};
//! use spriteseer_world::{level, World};
//!
//! struct Demo {
//!     world: World,
//! }
//!
//! impl GameApp for Demo {
//!     fn init(ctx: &mut EngineContext) -> anyhow::Result<Self> {
//!         let assets = &ctx.assets;
//!         let world = level::generate(&ctx.state, |name| assets.texture_index_of(name))?;
//!         Ok(Self { world })
//!     }
//!
//!     fn world(&self) -> &World {
//!         &self.world
//!     }
//!
//!     fn world_mut(&mut self) -> &mut World {
//!         &mut self.world
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     run_app::<Demo>(AppConfig::default())
//! }
//! ```

mod app;
mod clock;
mod config;
mod context;
mod runner;
mod scheduler;

pub use app::GameApp;
pub use clock::{FpsStats, SimClock};
pub use config::AppConfig;
pub use context::EngineContext;
pub use runner::run_app;
pub use scheduler::{FramePhase, FrameSchedule};

pub use spriteseer_core::{Keys, SimState};
pub use spriteseer_platform::PlatformEvent;
pub use spriteseer_world::World;
