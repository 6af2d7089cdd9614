//! The demo platformer level.

use glam::Vec2;
use spriteseer_core::SimState;

use crate::player::Player;
use crate::rectangle::Rectangle;
use crate::world::World;

pub const SKY_TEXTURE: &str = "img/png/sky2.png";
pub const FLOOR_TEXTURE: &str = "img/png/floor.png";
pub const PLAYER_TEXTURE: &str = "img/png/player.png";

/// Build the sky, the floor and the player.
///
/// `texture_index` maps a resource-relative texture name to its slot in the
/// texture array.
pub fn generate<E>(
    state: &SimState,
    mut texture_index: impl FnMut(&str) -> Result<i32, E>,
) -> Result<World, E> {
    tracing::info!("Generating level");

    let player = Player::new(
        Vec2::ZERO,
        Vec2::new(0.02, 0.1),
        texture_index(PLAYER_TEXTURE)?,
        state,
    );
    let mut world = World::new(player);

    world.push_static(Rectangle::new(
        "sky",
        false,
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, 1.0),
        texture_index(SKY_TEXTURE)?,
        state,
    ));
    world.push_static(Rectangle::new(
        "floor",
        true,
        Vec2::new(-1.0, 0.75),
        Vec2::new(1.0, 0.125),
        texture_index(FLOOR_TEXTURE)?,
        state,
    ));

    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    #[test]
    fn level_order_and_textures() {
        let names = [FLOOR_TEXTURE, PLAYER_TEXTURE, SKY_TEXTURE];
        let world = generate(&SimState::default(), |name| {
            names
                .iter()
                .position(|n| *n == name)
                .map(|i| i as i32)
                .ok_or(())
        })
        .unwrap();

        let ids: Vec<&str> = world.entities().map(Entity::id).collect();
        assert_eq!(ids, ["sky", "floor", "player"]);
        assert_eq!(world.statics()[0].tex_index(), 2);
        assert_eq!(world.statics()[1].tex_index(), 0);
    }

    #[test]
    fn missing_texture_aborts_generation() {
        let result = generate(&SimState::default(), |name| {
            if name == FLOOR_TEXTURE {
                Err(name.to_string())
            } else {
                Ok(0)
            }
        });
        assert_eq!(result.unwrap_err(), FLOOR_TEXTURE);
    }
}
