//! Static textured rectangles (backgrounds, platforms).

use glam::Vec2;
use spriteseer_core::{quad_vertices, Rect, Result, SimState, VertexWriter};

use crate::entity::{ndc_size, Entity};

/// An axis-aligned textured rectangle that never moves.
#[derive(Clone, Debug)]
pub struct Rectangle {
    id: String,
    collidable: bool,
    position: Vec2,
    size_percent: Vec2,
    size: Vec2,
    tex_index: i32,
}

impl Rectangle {
    /// Create a rectangle with its top-left corner at `position` (NDC).
    pub fn new(
        id: impl Into<String>,
        collidable: bool,
        position: Vec2,
        size_percent: Vec2,
        tex_index: i32,
        state: &SimState,
    ) -> Self {
        Self {
            id: id.into(),
            collidable,
            position,
            size_percent,
            size: ndc_size(size_percent, state.sprite_scale),
            tex_index,
        }
    }

    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current size in NDC.
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    pub const fn tex_index(&self) -> i32 {
        self.tex_index
    }

    pub const fn is_collidable(&self) -> bool {
        self.collidable
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }
}

impl Entity for Rectangle {
    fn id(&self) -> &str {
        &self.id
    }

    fn emit_vertices(&self, writer: &mut VertexWriter<'_>) -> Result<usize> {
        let quad = quad_vertices(self.position, self.size, self.tex_index);
        writer.push_quad(&quad)?;
        Ok(quad.len())
    }

    fn rescale(&mut self, state: &SimState) {
        self.size = ndc_size(self.size_percent, state.sprite_scale);
    }

    fn collider(&self) -> Option<Rect> {
        self.collidable.then(|| self.bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spriteseer_core::{GeometryKind, Vertex};

    fn floor(state: &SimState) -> Rectangle {
        Rectangle::new(
            "floor",
            true,
            Vec2::new(-1.0, 0.75),
            Vec2::new(1.0, 0.125),
            1,
            state,
        )
    }

    #[test]
    fn emits_one_textured_quad() {
        let state = SimState::default();
        let rect = floor(&state);
        let mut storage = [Vertex::default(); 4];
        let mut writer = VertexWriter::new(&mut storage, GeometryKind::Quads);

        assert_eq!(rect.emit_vertices(&mut writer).unwrap(), 4);
        assert_eq!(storage[0].pos, Vec2::new(-1.0, 0.75));
        assert_eq!(storage[3].pos, Vec2::new(1.0, 1.0));
        assert!(storage.iter().all(|v| v.tex_index == 1));
    }

    #[test]
    fn rescale_keeps_corner_and_resizes() {
        let mut state = SimState::default();
        let mut rect = floor(&state);
        state.sprite_scale = 0.5;
        rect.rescale(&state);
        assert_eq!(rect.position(), Vec2::new(-1.0, 0.75));
        assert_eq!(rect.size(), Vec2::new(1.0, 0.125));
    }

    #[test]
    fn only_collidable_rectangles_have_colliders() {
        let state = SimState::default();
        assert!(floor(&state).collider().is_some());
        let sky = Rectangle::new("sky", false, Vec2::NEG_ONE, Vec2::ONE, 0, &state);
        assert!(sky.collider().is_none());
    }

    #[test]
    fn full_writer_reports_overflow() {
        let state = SimState::default();
        let rect = floor(&state);
        let mut storage = [Vertex::default(); 3];
        let mut writer = VertexWriter::new(&mut storage, GeometryKind::Quads);
        assert!(rect.emit_vertices(&mut writer).is_err());
        assert!(writer.is_empty());
    }
}
