//! Geometry batching into fixed-capacity, host-visible buffers.
//!
//! All quads are concatenated into one vertex region drawn with a shared
//! index region; debug lines go into a separate vertex region drawn without
//! indices. Regions are rewritten in place only when [`SimState`] says the
//! matching geometry is dirty.

use spriteseer_core::constants::{
    INDICES_PER_QUAD, MAX_LINES, MAX_QUADS, VERTICES_PER_LINE, VERTICES_PER_QUAD,
};
use spriteseer_core::{GeometryKind, SimState, Vertex, VertexWriter};
use spriteseer_world::{Entity, World};

use crate::error::{RenderError, Result};

/// Per-quad index pattern over vertices top-left, bottom-left, top-right, bottom-right.
pub const QUAD_INDEX_PATTERN: [u32; INDICES_PER_QUAD] = [0, 1, 2, 2, 1, 3];

/// Number of indices needed to draw `vertex_count` quad vertices.
pub const fn index_count(vertex_count: usize) -> usize {
    vertex_count / VERTICES_PER_QUAD * INDICES_PER_QUAD
}

/// Write the indices for `vertex_count` quad vertices into `dst`.
///
/// Returns the number of indices written.
pub fn write_quad_indices(vertex_count: usize, dst: &mut [u32]) -> Result<usize> {
    if vertex_count % VERTICES_PER_QUAD != 0 {
        return Err(RenderError::UnalignedQuadVertices(vertex_count));
    }
    let count = index_count(vertex_count);
    let capacity = dst.len();
    if count > capacity {
        return Err(RenderError::CapacityExceeded {
            kind: GeometryKind::Indices,
            requested: count,
            capacity,
        });
    }

    for (quad, chunk) in dst[..count].chunks_exact_mut(INDICES_PER_QUAD).enumerate() {
        let base = u32::try_from(quad * VERTICES_PER_QUAD).map_err(|_| {
            RenderError::CapacityExceeded {
                kind: GeometryKind::Indices,
                requested: count,
                capacity,
            }
        })?;
        for (index, offset) in chunk.iter_mut().zip(QUAD_INDEX_PATTERN) {
            *index = base + offset;
        }
    }
    Ok(count)
}

/// Indices for `vertex_count` quad vertices.
pub fn quad_indices(vertex_count: usize) -> Result<Vec<u32>> {
    let mut indices = vec![0; index_count(vertex_count)];
    write_quad_indices(vertex_count, &mut indices)?;
    Ok(indices)
}

/// Element counts currently valid in each region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeometryCounts {
    pub quad_vertices: usize,
    pub indices: usize,
    pub line_vertices: usize,
}

/// Mutable views of the three regions of a geometry target.
pub struct GeometryRegions<'a> {
    pub quad_vertices: &'a mut [Vertex],
    pub indices: &'a mut [u32],
    pub line_vertices: &'a mut [Vertex],
}

/// A destination the batcher can write geometry into.
pub trait GeometryTarget {
    /// Map every region for writing.
    fn regions(&mut self) -> Result<GeometryRegions<'_>>;

    fn counts(&self) -> GeometryCounts;

    /// Record how much of each region is valid after a write.
    fn set_counts(&mut self, counts: GeometryCounts);
}

/// Geometry kept in ordinary memory, for tests and benchmarks.
///
/// Counts how many times its regions were mapped for writing.
#[derive(Clone, Debug)]
pub struct HostGeometry {
    quad_vertices: Vec<Vertex>,
    indices: Vec<u32>,
    line_vertices: Vec<Vertex>,
    counts: GeometryCounts,
    writes: usize,
}

impl HostGeometry {
    /// Regions sized for `max_quads` quads and `max_lines` line segments.
    pub fn with_capacity(max_quads: usize, max_lines: usize) -> Self {
        Self {
            quad_vertices: vec![Vertex::default(); max_quads * VERTICES_PER_QUAD],
            indices: vec![0; max_quads * INDICES_PER_QUAD],
            line_vertices: vec![Vertex::default(); max_lines * VERTICES_PER_LINE],
            counts: GeometryCounts::default(),
            writes: 0,
        }
    }

    /// How many times the regions were mapped for writing.
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// The valid quad vertices.
    pub fn quad_vertices(&self) -> &[Vertex] {
        &self.quad_vertices[..self.counts.quad_vertices]
    }

    /// The valid indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices[..self.counts.indices]
    }

    /// The valid line vertices.
    pub fn line_vertices(&self) -> &[Vertex] {
        &self.line_vertices[..self.counts.line_vertices]
    }
}

impl Default for HostGeometry {
    fn default() -> Self {
        Self::with_capacity(MAX_QUADS, MAX_LINES)
    }
}

impl GeometryTarget for HostGeometry {
    fn regions(&mut self) -> Result<GeometryRegions<'_>> {
        self.writes += 1;
        Ok(GeometryRegions {
            quad_vertices: &mut self.quad_vertices,
            indices: &mut self.indices,
            line_vertices: &mut self.line_vertices,
        })
    }

    fn counts(&self) -> GeometryCounts {
        self.counts
    }

    fn set_counts(&mut self, counts: GeometryCounts) {
        self.counts = counts;
    }
}

/// What a call to [`GeometryBatcher::remap`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemapOutcome {
    /// Nothing was dirty; the target was not touched.
    Skipped,
    /// At least one region was rewritten. `None` means that region was left as is.
    Remapped {
        quad_vertices: Option<usize>,
        line_vertices: Option<usize>,
    },
}

/// Emit geometry from `entities` in iteration order.
///
/// Quads go to `quads` and line segments to `lines`; a `None` writer skips
/// that kind. Every entity must emit whole quads. Returns
/// `(quad_vertex_count, line_vertex_count)`.
pub fn collect<'e>(
    entities: impl IntoIterator<Item = &'e dyn Entity>,
    mut quads: Option<&mut VertexWriter<'_>>,
    mut lines: Option<&mut VertexWriter<'_>>,
) -> Result<(usize, usize)> {
    let mut quad_count = 0;
    let mut line_count = 0;
    for entity in entities {
        if let Some(writer) = quads.as_deref_mut() {
            let emitted = entity.emit_vertices(writer)?;
            if emitted % VERTICES_PER_QUAD != 0 {
                return Err(RenderError::UnalignedEntityQuads {
                    entity: entity.id().to_string(),
                    vertices: emitted,
                });
            }
            quad_count += emitted;
        }
        if let Some(writer) = lines.as_deref_mut() {
            line_count += entity.emit_lines(writer)?;
        }
    }
    Ok((quad_count, line_count))
}

/// Rewrites geometry targets from the world when it changes.
#[derive(Debug, Default)]
pub struct GeometryBatcher {
    remaps: u64,
}

impl GeometryBatcher {
    pub const fn new() -> Self {
        Self { remaps: 0 }
    }

    /// Number of remaps that wrote to a target.
    pub const fn remap_count(&self) -> u64 {
        self.remaps
    }

    /// Rewrite whichever regions `state` marks dirty and clear those flags.
    ///
    /// When nothing is dirty the target is not mapped at all. On error the
    /// flags stay set and the target counts are unchanged.
    pub fn remap<T: GeometryTarget + ?Sized>(
        &mut self,
        world: &World,
        state: &mut SimState,
        target: &mut T,
    ) -> Result<RemapOutcome> {
        if !state.needs_remap() {
            return Ok(RemapOutcome::Skipped);
        }

        let remap_quads = state.needs_triangle_remap;
        let remap_lines = state.needs_line_remap;
        let mut counts = target.counts();

        {
            let regions = target.regions()?;
            let mut quad_writer = VertexWriter::new(regions.quad_vertices, GeometryKind::Quads);
            let mut line_writer = VertexWriter::new(regions.line_vertices, GeometryKind::Lines);

            let (quad_count, line_count) = collect(
                world.entities(),
                remap_quads.then_some(&mut quad_writer),
                (remap_lines && state.show_debug_lines).then_some(&mut line_writer),
            )?;

            if remap_quads {
                counts.indices = write_quad_indices(quad_count, regions.indices)?;
                counts.quad_vertices = quad_count;
            }
            if remap_lines {
                counts.line_vertices = line_count;
            }
        }

        target.set_counts(counts);
        self.remaps += 1;

        let outcome = RemapOutcome::Remapped {
            quad_vertices: remap_quads.then_some(counts.quad_vertices),
            line_vertices: remap_lines.then_some(counts.line_vertices),
        };
        state.needs_triangle_remap = false;
        state.needs_line_remap = false;

        tracing::trace!("Remapped geometry: {outcome:?}");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_pattern() {
        assert_eq!(
            quad_indices(8).unwrap(),
            vec![0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]
        );
        assert!(quad_indices(0).unwrap().is_empty());
    }

    #[test]
    fn index_count_is_one_and_a_half_times_vertices() {
        for quads in [1, 3, 17, MAX_QUADS] {
            let vertices = quads * VERTICES_PER_QUAD;
            assert_eq!(quad_indices(vertices).unwrap().len(), vertices * 3 / 2);
        }
    }

    #[test]
    fn unaligned_vertex_count_is_rejected() {
        let mut dst = [0; 12];
        assert!(matches!(
            write_quad_indices(6, &mut dst),
            Err(RenderError::UnalignedQuadVertices(6))
        ));
    }

    #[test]
    fn index_overflow_is_rejected() {
        let mut dst = [0; 6];
        assert!(matches!(
            write_quad_indices(8, &mut dst),
            Err(RenderError::CapacityExceeded {
                kind: GeometryKind::Indices,
                requested: 12,
                capacity: 6
            })
        ));
    }

    /// Emits `n` copies of the default vertex.
    struct Partial {
        id: &'static str,
        n: usize,
    }

    impl Entity for Partial {
        fn id(&self) -> &str {
            self.id
        }

        fn emit_vertices(&self, writer: &mut VertexWriter<'_>) -> spriteseer_core::Result<usize> {
            writer.extend(&vec![Vertex::default(); self.n])?;
            Ok(self.n)
        }

        fn rescale(&mut self, _state: &SimState) {}
    }

    #[test]
    fn each_entity_must_emit_whole_quads() {
        let six = Partial { id: "six", n: 6 };
        let two = Partial { id: "two", n: 2 };
        let mut storage = vec![Vertex::default(); 16];
        let mut writer = VertexWriter::new(&mut storage, GeometryKind::Quads);

        let err = collect([&six as &dyn Entity, &two], Some(&mut writer), None).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnalignedEntityQuads { ref entity, vertices: 6 } if entity == "six"
        ));
    }

    #[test]
    fn whole_quads_are_counted() {
        let one = Partial { id: "one", n: 4 };
        let two = Partial { id: "two", n: 8 };
        let mut storage = vec![Vertex::default(); 16];
        let mut writer = VertexWriter::new(&mut storage, GeometryKind::Quads);

        let counts = collect([&one as &dyn Entity, &two], Some(&mut writer), None).unwrap();
        assert_eq!(counts, (12, 0));
    }

    #[test]
    fn host_geometry_counts_mappings() {
        let mut geometry = HostGeometry::with_capacity(1, 1);
        assert_eq!(geometry.writes(), 0);
        let regions = geometry.regions().unwrap();
        assert_eq!(regions.quad_vertices.len(), 4);
        assert_eq!(regions.indices.len(), 6);
        assert_eq!(regions.line_vertices.len(), 2);
        assert_eq!(geometry.writes(), 1);
    }
}
