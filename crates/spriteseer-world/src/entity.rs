//! The capability set shared by every sprite.

use glam::Vec2;
use spriteseer_core::{Keys, Rect, Result, SimState, VertexWriter};

/// Size in NDC of a sprite declared as a fraction of the screen.
///
/// The screen spans two NDC units per axis, so a `size_percent` of 1.0 covers
/// it exactly at a sprite scale of 1.0.
#[inline]
pub fn ndc_size(size_percent: Vec2, sprite_scale: f32) -> Vec2 {
    size_percent * 2.0 * sprite_scale
}

/// Something the world simulates and draws.
pub trait Entity {
    /// Stable name for logging.
    fn id(&self) -> &str;

    /// Advance by `dt` seconds. Entities that move mark geometry dirty on `state`.
    fn update(&mut self, _dt: f32, _state: &mut SimState) {}

    /// Append this entity's quads; returns the number of vertices written.
    fn emit_vertices(&self, writer: &mut VertexWriter<'_>) -> Result<usize>;

    /// Append debug line segments; returns the number of vertices written.
    fn emit_lines(&self, _writer: &mut VertexWriter<'_>) -> Result<usize> {
        Ok(0)
    }

    /// Recompute derived geometry after the sprite scale or extent changed.
    fn rescale(&mut self, state: &SimState);

    /// React to the current key snapshot.
    fn on_input(&mut self, _keys: Keys, _state: &mut SimState) {}

    /// Solid area other entities may stand on.
    fn collider(&self) -> Option<Rect> {
        None
    }
}
