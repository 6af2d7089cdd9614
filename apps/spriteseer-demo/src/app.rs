//! The platformer: sky, floor and a controllable player.

use spriteseer_app::{EngineContext, GameApp};
use spriteseer_world::{level, World};

pub struct Platformer {
    world: World,
}

impl GameApp for Platformer {
    fn init(ctx: &mut EngineContext) -> anyhow::Result<Self> {
        let assets = &ctx.assets;
        let world = level::generate(&ctx.state, |name| assets.texture_index_of(name))?;
        tracing::info!(
            "Level ready: {} statics, player at {}",
            world.statics().len(),
            world.player().position()
        );
        Ok(Self { world })
    }

    fn world(&self) -> &World {
        &self.world
    }

    fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
