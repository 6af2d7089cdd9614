//! 2D rectangle math in normalized device coordinates.
//!
//! The engine uses Vulkan's NDC convention: x grows right, y grows down,
//! both axes span `[-1, 1]`.

use glam::Vec2;

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    /// Bottom-right corner
    pub max: Vec2,
}

impl Rect {
    /// The whole screen in NDC.
    pub const SCREEN: Self = Self {
        min: Vec2::NEG_ONE,
        max: Vec2::ONE,
    };

    /// Create a rectangle from min and max corners
    #[inline]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from its top-left corner and size
    #[inline]
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Check if a point is inside the rectangle (edges inclusive)
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Check if the interiors of two rectangles overlap.
    ///
    /// Rectangles that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Check if the horizontal spans of two rectangles overlap.
    #[inline]
    pub fn overlaps_horizontally(&self, other: &Self) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x
    }

    /// Position a rectangle of `size` may take so that it stays inside `self`.
    ///
    /// Returns `pos` clamped to `[min, max - size]` per axis.
    #[inline]
    pub fn clamp_pos(&self, pos: Vec2, size: Vec2) -> Vec2 {
        let upper = (self.max - size).max(self.min);
        pos.clamp(self.min, upper)
    }
}
