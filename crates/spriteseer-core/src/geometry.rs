//! Bounds-checked vertex emission.

use std::fmt;

use glam::Vec2;

use crate::constants::{VERTICES_PER_LINE, VERTICES_PER_QUAD};
use crate::error::{Error, Result};
use crate::types::Vertex;

/// Which fixed-capacity geometry region a write targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Quad vertex buffer
    Quads,
    /// Line vertex buffer
    Lines,
    /// Quad index buffer
    Indices,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quads => "quad vertex",
            Self::Lines => "line vertex",
            Self::Indices => "index",
        })
    }
}

/// Append-only cursor over a mapped vertex region.
///
/// Every write is checked against the region's capacity; a write that does
/// not fit fails with [`Error::CapacityExceeded`] and leaves the cursor where
/// it was.
pub struct VertexWriter<'a> {
    buffer: &'a mut [Vertex],
    len: usize,
    kind: GeometryKind,
}

impl<'a> VertexWriter<'a> {
    /// Create a writer that starts at the beginning of `buffer`.
    pub fn new(buffer: &'a mut [Vertex], kind: GeometryKind) -> Self {
        Self {
            buffer,
            len: 0,
            kind,
        }
    }

    /// Total vertices the region can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Vertices written so far.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Vertices written so far, in order.
    #[inline]
    pub fn written(&self) -> &[Vertex] {
        &self.buffer[..self.len]
    }

    /// Append a quad in top-left, bottom-left, top-right, bottom-right order.
    pub fn push_quad(&mut self, quad: &[Vertex; VERTICES_PER_QUAD]) -> Result<()> {
        self.extend(quad)
    }

    /// Append one line segment.
    pub fn push_line(&mut self, a: Vertex, b: Vertex) -> Result<()> {
        let segment: [Vertex; VERTICES_PER_LINE] = [a, b];
        self.extend(&segment)
    }

    /// Append raw vertices.
    pub fn extend(&mut self, vertices: &[Vertex]) -> Result<()> {
        let end = self.len + vertices.len();
        if end > self.buffer.len() {
            return Err(Error::CapacityExceeded {
                kind: self.kind,
                requested: end,
                capacity: self.buffer.len(),
            });
        }
        self.buffer[self.len..end].copy_from_slice(vertices);
        self.len = end;
        Ok(())
    }
}

/// Build the four vertices of an axis-aligned textured quad.
///
/// Vertex order is top-left, bottom-left, top-right, bottom-right, which the
/// `{0, 1, 2, 2, 1, 3}` index pattern turns into two triangles.
pub fn quad_vertices(pos: Vec2, size: Vec2, tex_index: i32) -> [Vertex; VERTICES_PER_QUAD] {
    [
        Vertex::new(pos, Vec2::new(0.0, 0.0), tex_index),
        Vertex::new(pos + Vec2::new(0.0, size.y), Vec2::new(0.0, 1.0), tex_index),
        Vertex::new(pos + Vec2::new(size.x, 0.0), Vec2::new(1.0, 0.0), tex_index),
        Vertex::new(pos + size, Vec2::new(1.0, 1.0), tex_index),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_corners_follow_winding_order() {
        let q = quad_vertices(Vec2::new(-1.0, 0.75), Vec2::new(2.0, 0.25), 3);
        assert_eq!(q[0].pos, Vec2::new(-1.0, 0.75));
        assert_eq!(q[1].pos, Vec2::new(-1.0, 1.0));
        assert_eq!(q[2].pos, Vec2::new(1.0, 0.75));
        assert_eq!(q[3].pos, Vec2::new(1.0, 1.0));
        assert_eq!(q[3].tex_coord, Vec2::ONE);
        assert!(q.iter().all(|v| v.tex_index == 3));
    }

    #[test]
    fn writer_appends_contiguously() {
        let mut storage = [Vertex::default(); 8];
        let mut writer = VertexWriter::new(&mut storage, GeometryKind::Quads);

        writer
            .push_quad(&quad_vertices(Vec2::ZERO, Vec2::ONE, 0))
            .unwrap();
        writer
            .push_quad(&quad_vertices(Vec2::ONE, Vec2::ONE, 1))
            .unwrap();

        assert_eq!(writer.len(), 8);
        assert_eq!(writer.written()[4].tex_index, 1);
    }

    #[test]
    fn overflow_is_rejected_without_partial_write() {
        let mut storage = [Vertex::default(); 6];
        let mut writer = VertexWriter::new(&mut storage, GeometryKind::Quads);
        writer
            .push_quad(&quad_vertices(Vec2::ZERO, Vec2::ONE, 0))
            .unwrap();

        let err = writer
            .push_quad(&quad_vertices(Vec2::ZERO, Vec2::ONE, 7))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                kind: GeometryKind::Quads,
                requested: 8,
                capacity: 6,
            }
        ));
        assert_eq!(writer.len(), 4);
        assert!(storage[4..].iter().all(|v| *v == Vertex::default()));
    }

    #[test]
    fn line_writer_takes_pairs() {
        let mut storage = [Vertex::default(); 2];
        let mut writer = VertexWriter::new(&mut storage, GeometryKind::Lines);
        writer
            .push_line(Vertex::flat(Vec2::ZERO), Vertex::flat(Vec2::ONE))
            .unwrap();
        assert!(writer
            .push_line(Vertex::flat(Vec2::ZERO), Vertex::flat(Vec2::ONE))
            .is_err());
    }
}
