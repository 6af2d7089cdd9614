//! The controllable player sprite.

use glam::Vec2;
use spriteseer_core::constants::{
    MAX_PLAYER_VELOCITY, PLAYER_ACCELERATION, PLAYER_DECELERATION, PLAYER_GRAVITY,
    PLAYER_JUMP_VELOCITY,
};
use spriteseer_core::{quad_vertices, Keys, Rect, Result, SimState, Vertex, VertexWriter};

use crate::entity::{ndc_size, Entity};

/// Distance within which the player counts as standing on a surface.
const SUPPORT_EPSILON: f32 = 1e-4;

/// Platformer player: walks with A/D, jumps with Space, falls under gravity
/// and lands on collidable rectangles.
#[derive(Clone, Debug)]
pub struct Player {
    position: Vec2,
    velocity: Vec2,
    size_percent: Vec2,
    size: Vec2,
    tex_index: i32,
    keys: Keys,
    grounded: bool,
}

impl Player {
    /// Create a player with its top-left corner at `position`, initially airborne.
    pub fn new(position: Vec2, size_percent: Vec2, tex_index: i32, state: &SimState) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            size_percent,
            size: ndc_size(size_percent, state.sprite_scale),
            tex_index,
            keys: Keys::empty(),
            grounded: false,
        }
    }

    pub const fn position(&self) -> Vec2 {
        self.position
    }

    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub const fn size(&self) -> Vec2 {
        self.size
    }

    pub const fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }

    /// Land on any collider the player fell into and work out whether
    /// something is still underneath.
    ///
    /// Marks geometry dirty when the player had to be moved.
    pub fn resolve_collisions(&mut self, colliders: &[Rect], state: &mut SimState) {
        let mut supported = self.position.y >= Rect::SCREEN.max.y - self.size.y;
        let mut snapped = false;

        for collider in colliders {
            let bounds = self.bounds();
            let penetration = bounds.max.y - collider.min.y;
            let touching = bounds.overlaps_horizontally(collider)
                && bounds.min.y < collider.max.y
                && penetration >= -SUPPORT_EPSILON;
            if !touching || self.velocity.y < 0.0 {
                continue;
            }
            if penetration > SUPPORT_EPSILON {
                self.position.y = collider.min.y - self.size.y;
                snapped = true;
            }
            self.velocity.y = 0.0;
            supported = true;
        }

        if supported && !self.grounded {
            tracing::trace!("Player landed at {:?}", self.position);
        }
        self.grounded = supported;

        if snapped {
            self.mark_moved(state);
        }
    }

    fn mark_moved(&self, state: &mut SimState) {
        state.needs_triangle_remap = true;
        if state.show_debug_lines {
            state.needs_line_remap = true;
        }
    }

    fn apply_horizontal_input(&mut self, dt: f32) {
        let direction = f32::from(self.keys.horizontal());
        if direction == 0.0 {
            let step = PLAYER_DECELERATION * dt;
            self.velocity.x = if self.velocity.x.abs() <= step {
                0.0
            } else {
                self.velocity.x - step * self.velocity.x.signum()
            };
        } else {
            self.velocity.x += direction * PLAYER_ACCELERATION * dt;
        }
    }

    fn apply_vertical_forces(&mut self, dt: f32) {
        if self.grounded && self.keys.contains(Keys::SPACE) {
            self.velocity.y = -PLAYER_JUMP_VELOCITY;
            self.grounded = false;
        }
        if !self.grounded {
            self.velocity.y += PLAYER_GRAVITY * dt;
        }
    }
}

impl Entity for Player {
    fn id(&self) -> &str {
        "player"
    }

    fn update(&mut self, dt: f32, state: &mut SimState) {
        self.apply_horizontal_input(dt);
        self.apply_vertical_forces(dt);
        self.velocity = self.velocity.clamp(
            Vec2::splat(-MAX_PLAYER_VELOCITY),
            Vec2::splat(MAX_PLAYER_VELOCITY),
        );

        let before = self.position;
        let moved = self.position + self.velocity * dt;
        let clamped = Rect::SCREEN.clamp_pos(moved, self.size);
        if clamped.x != moved.x {
            self.velocity.x = 0.0;
        }
        if clamped.y != moved.y {
            self.velocity.y = 0.0;
        }
        self.position = clamped;

        if self.position != before {
            self.mark_moved(state);
        }
    }

    fn emit_vertices(&self, writer: &mut VertexWriter<'_>) -> Result<usize> {
        let quad = quad_vertices(self.position, self.size, self.tex_index);
        writer.push_quad(&quad)?;
        Ok(quad.len())
    }

    /// Outline of the player's bounds as four segments.
    fn emit_lines(&self, writer: &mut VertexWriter<'_>) -> Result<usize> {
        let Rect { min, max } = self.bounds();
        let corners = [
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
        ];
        let mut segment = [Vertex::default(); 8];
        for (i, pair) in segment.chunks_exact_mut(2).enumerate() {
            pair[0] = Vertex::flat(corners[i]);
            pair[1] = Vertex::flat(corners[(i + 1) % corners.len()]);
        }
        writer.extend(&segment)?;
        Ok(segment.len())
    }

    fn rescale(&mut self, state: &SimState) {
        self.size = ndc_size(self.size_percent, state.sprite_scale);
        self.position = Rect::SCREEN.clamp_pos(self.position, self.size);
    }

    fn on_input(&mut self, keys: Keys, _state: &mut SimState) {
        self.keys = keys;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use spriteseer_core::GeometryKind;

    fn player(state: &SimState) -> Player {
        Player::new(Vec2::ZERO, Vec2::new(0.02, 0.1), 2, state)
    }

    fn floor() -> Rect {
        Rect::from_pos_size(Vec2::new(-1.0, 0.75), Vec2::new(2.0, 0.25))
    }

    #[test]
    fn holding_right_accelerates() {
        let mut state = SimState::default();
        let mut p = player(&state);
        p.on_input(Keys::D, &mut state);
        state.needs_triangle_remap = false;

        p.update(0.1, &mut state);

        assert_relative_eq!(p.velocity().x, 0.1);
        assert_relative_eq!(p.position().x, 0.01);
        assert!(state.needs_triangle_remap);
    }

    #[test]
    fn releasing_direction_decelerates_to_rest() {
        let mut state = SimState::default();
        let mut p = player(&state);
        p.on_input(Keys::A, &mut state);
        p.update(0.5, &mut state);
        assert_relative_eq!(p.velocity().x, -0.5);

        p.on_input(Keys::empty(), &mut state);
        p.update(0.1, &mut state);
        assert_relative_eq!(p.velocity().x, -0.2, epsilon = 1e-6);
        p.update(0.1, &mut state);
        assert_relative_eq!(p.velocity().x, 0.0);
    }

    #[test]
    fn velocity_clamp_is_signed() {
        let mut state = SimState::default();
        let mut p = player(&state);
        p.on_input(Keys::A, &mut state);
        for _ in 0..20 {
            p.update(1.0, &mut state);
            assert!(p.velocity().x >= -MAX_PLAYER_VELOCITY);
            assert!(p.velocity().y <= MAX_PLAYER_VELOCITY);
        }
    }

    #[test]
    fn stays_on_screen() {
        let mut state = SimState::default();
        let mut p = player(&state);
        p.on_input(Keys::D, &mut state);
        for _ in 0..200 {
            p.update(0.1, &mut state);
        }
        assert!(p.position().x <= 1.0 - p.size().x);
        assert!(p.position().y <= 1.0 - p.size().y);
        assert!(p.position().x >= -1.0);
    }

    #[test]
    fn falls_onto_floor_and_stays_there() {
        let mut state = SimState::default();
        let mut p = player(&state);
        let colliders = [floor()];
        for _ in 0..100 {
            p.update(0.01, &mut state);
            p.resolve_collisions(&colliders, &mut state);
        }
        assert!(p.is_grounded());
        assert_relative_eq!(p.bounds().max.y, 0.75, epsilon = 1e-5);
        assert_relative_eq!(p.velocity().y, 0.0);
    }

    #[test]
    fn jumps_only_when_grounded() {
        let mut state = SimState::default();
        let mut p = player(&state);
        p.on_input(Keys::SPACE, &mut state);
        p.update(0.01, &mut state);
        assert!(p.velocity().y > 0.0, "airborne player must not jump");

        let colliders = [floor()];
        for _ in 0..100 {
            p.update(0.01, &mut state);
            p.resolve_collisions(&colliders, &mut state);
            if p.is_grounded() {
                break;
            }
        }
        assert!(p.is_grounded());
        p.update(0.01, &mut state);
        assert!(p.velocity().y < 0.0);
        assert!(!p.is_grounded());
    }

    #[test]
    fn outline_is_four_flat_segments() {
        let state = SimState::default();
        let p = player(&state);
        let mut storage = [Vertex::default(); 8];
        let mut writer = VertexWriter::new(&mut storage, GeometryKind::Lines);
        assert_eq!(p.emit_lines(&mut writer).unwrap(), 8);
        assert!(storage.iter().all(|v| !v.is_textured()));
        assert_eq!(storage[0].pos, storage[7].pos);
    }
}
