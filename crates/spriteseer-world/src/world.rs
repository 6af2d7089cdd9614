//! Fixed-order container of everything on screen.

use spriteseer_core::{Keys, Rect, SimState};

use crate::entity::Entity;
use crate::player::Player;
use crate::rectangle::Rectangle;

/// Static rectangles in creation order, then the player.
///
/// Geometry is emitted in exactly this order, so the player's vertices are
/// always the last quad in the buffer.
#[derive(Clone, Debug)]
pub struct World {
    statics: Vec<Rectangle>,
    player: Player,
}

impl World {
    pub const fn new(player: Player) -> Self {
        Self {
            statics: Vec::new(),
            player,
        }
    }

    /// Append a static rectangle after the ones already present.
    pub fn push_static(&mut self, rectangle: Rectangle) {
        self.statics.push(rectangle);
    }

    pub fn statics(&self) -> &[Rectangle] {
        &self.statics
    }

    pub const fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Number of entities, the player included.
    pub fn len(&self) -> usize {
        self.statics.len() + 1
    }

    /// Always false: a world has at least its player.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Every entity in emission order.
    pub fn entities(&self) -> impl Iterator<Item = &dyn Entity> {
        self.statics
            .iter()
            .map(|r| r as &dyn Entity)
            .chain(std::iter::once(&self.player as &dyn Entity))
    }

    /// Step every entity once, then settle the player against solid rectangles.
    pub fn update(&mut self, dt: f32, state: &mut SimState) {
        for rectangle in &mut self.statics {
            rectangle.update(dt, state);
        }
        self.player.update(dt, state);

        let colliders: Vec<Rect> = self.statics.iter().filter_map(Entity::collider).collect();
        self.player.resolve_collisions(&colliders, state);
    }

    /// Forward the key snapshot to every entity.
    pub fn on_input(&mut self, keys: Keys, state: &mut SimState) {
        for rectangle in &mut self.statics {
            rectangle.on_input(keys, state);
        }
        self.player.on_input(keys, state);
    }

    /// Recompute sizes after a resize and request a full remap.
    pub fn rescale(&mut self, state: &mut SimState) {
        for rectangle in &mut self.statics {
            rectangle.rescale(state);
        }
        self.player.rescale(state);
        state.mark_geometry_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn player_is_always_last() {
        let state = SimState::default();
        let mut world = World::new(Player::new(Vec2::ZERO, Vec2::splat(0.1), 2, &state));
        world.push_static(Rectangle::new("a", false, Vec2::NEG_ONE, Vec2::ONE, 0, &state));
        world.push_static(Rectangle::new("b", true, Vec2::ZERO, Vec2::splat(0.5), 1, &state));

        let ids: Vec<&str> = world.entities().map(Entity::id).collect();
        assert_eq!(ids, ["a", "b", "player"]);
        assert_eq!(world.len(), 3);
    }

    #[test]
    fn rescale_marks_everything_dirty() {
        let mut state = SimState::default();
        state.needs_triangle_remap = false;
        state.needs_line_remap = false;
        let mut world = World::new(Player::new(Vec2::ZERO, Vec2::splat(0.1), 0, &state));

        world.rescale(&mut state);

        assert!(state.needs_triangle_remap);
        assert!(state.needs_line_remap);
    }
}
