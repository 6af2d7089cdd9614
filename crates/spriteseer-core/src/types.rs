//! GPU vertex layout.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// A single vertex as consumed by the sprite shaders.
///
/// Layout (binding 0, 24 bytes):
/// - location 0: `pos` (`vec2`)
/// - location 1: `tex_coord` (`vec2`)
/// - location 2: `tex_index` (`int`)
/// - location 3: `interaction` (`int`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// Position in normalized device coordinates
    pub pos: Vec2,
    /// Texture coordinate in `[0, 1]`
    pub tex_coord: Vec2,
    /// Index into the texture array, or [`Vertex::FLAT_COLOR`]
    pub tex_index: i32,
    /// Hover/interaction flag forwarded to the fragment shader
    pub interaction: i32,
}

impl Vertex {
    /// Texture index that tells the fragment shader to emit a flat colour.
    pub const FLAT_COLOR: i32 = -1;

    /// Byte offset of `pos`.
    pub const POS_OFFSET: u32 = std::mem::offset_of!(Self, pos) as u32;
    /// Byte offset of `tex_coord`.
    pub const TEX_COORD_OFFSET: u32 = std::mem::offset_of!(Self, tex_coord) as u32;
    /// Byte offset of `tex_index`.
    pub const TEX_INDEX_OFFSET: u32 = std::mem::offset_of!(Self, tex_index) as u32;
    /// Byte offset of `interaction`.
    pub const INTERACTION_OFFSET: u32 = std::mem::offset_of!(Self, interaction) as u32;
    /// Stride of one vertex.
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;

    /// Create a textured vertex.
    #[inline]
    pub const fn new(pos: Vec2, tex_coord: Vec2, tex_index: i32) -> Self {
        Self {
            pos,
            tex_coord,
            tex_index,
            interaction: 0,
        }
    }

    /// Create an untextured vertex for debug lines.
    #[inline]
    pub const fn flat(pos: Vec2) -> Self {
        Self::new(pos, Vec2::ZERO, Self::FLAT_COLOR)
    }

    /// Whether this vertex samples a texture.
    #[inline]
    pub const fn is_textured(&self) -> bool {
        self.tex_index >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_shader_interface() {
        assert_eq!(Vertex::STRIDE, 24);
        assert_eq!(Vertex::POS_OFFSET, 0);
        assert_eq!(Vertex::TEX_COORD_OFFSET, 8);
        assert_eq!(Vertex::TEX_INDEX_OFFSET, 16);
        assert_eq!(Vertex::INTERACTION_OFFSET, 20);
    }

    #[test]
    fn flat_vertex_is_untextured() {
        let v = Vertex::flat(Vec2::new(0.5, -0.5));
        assert!(!v.is_textured());
        assert!(Vertex::new(Vec2::ZERO, Vec2::ONE, 0).is_textured());
    }
}
