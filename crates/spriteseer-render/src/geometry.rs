//! Host-visible GPU buffers the batcher writes into.

use ash::vk;
use gpu_allocator::MemoryLocation;
use spriteseer_core::constants::{INDICES_PER_QUAD, VERTICES_PER_LINE, VERTICES_PER_QUAD};
use spriteseer_core::Vertex;
use spriteseer_gpu::{GpuBuffer, SharedAllocator};

use crate::batcher::{GeometryCounts, GeometryRegions, GeometryTarget};
use crate::error::Result;

/// The quad vertex, index and line vertex buffers.
///
/// Allocated once at full capacity, persistently mapped, and overwritten in
/// place. The buffers are freed when this is dropped, so the GPU must be
/// idle by then.
///
/// There is one set for all frames in flight. Waiting on a slot's fence only
/// proves that slot's last submission finished; the other slot's command
/// buffer may still be reading these buffers when a remap overwrites them.
/// A remap can therefore tear the geometry of the frame still in flight.
pub struct GeometryBuffers {
    quad_vertices: GpuBuffer,
    indices: GpuBuffer,
    line_vertices: GpuBuffer,
    counts: GeometryCounts,
    allocator: SharedAllocator,
}

impl GeometryBuffers {
    /// Allocate buffers for `max_quads` quads and `max_lines` line segments.
    pub fn new(allocator: SharedAllocator, max_quads: usize, max_lines: usize) -> Result<Self> {
        let vertex_size = std::mem::size_of::<Vertex>() as u64;
        let index_size = std::mem::size_of::<u32>() as u64;

        let (quad_vertices, indices, line_vertices) = {
            let mut alloc = allocator.lock();
            let quad_vertices = alloc.create_buffer(
                (max_quads * VERTICES_PER_QUAD) as u64 * vertex_size,
                vk::BufferUsageFlags::VERTEX_BUFFER,
                MemoryLocation::CpuToGpu,
                "quad vertices",
            )?;
            let indices = match alloc.create_buffer(
                (max_quads * INDICES_PER_QUAD) as u64 * index_size,
                vk::BufferUsageFlags::INDEX_BUFFER,
                MemoryLocation::CpuToGpu,
                "quad indices",
            ) {
                Ok(buffer) => buffer,
                Err(e) => {
                    let mut quad_vertices = quad_vertices;
                    alloc.free_buffer(&mut quad_vertices)?;
                    return Err(e.into());
                }
            };
            let line_vertices = match alloc.create_buffer(
                (max_lines * VERTICES_PER_LINE) as u64 * vertex_size,
                vk::BufferUsageFlags::VERTEX_BUFFER,
                MemoryLocation::CpuToGpu,
                "line vertices",
            ) {
                Ok(buffer) => buffer,
                Err(e) => {
                    let (mut quad_vertices, mut indices) = (quad_vertices, indices);
                    alloc.free_buffer(&mut quad_vertices)?;
                    alloc.free_buffer(&mut indices)?;
                    return Err(e.into());
                }
            };
            (quad_vertices, indices, line_vertices)
        };

        tracing::info!(
            "Geometry buffers allocated: {max_quads} quads, {max_lines} lines"
        );

        Ok(Self {
            quad_vertices,
            indices,
            line_vertices,
            counts: GeometryCounts::default(),
            allocator,
        })
    }

    pub const fn quad_vertex_buffer(&self) -> vk::Buffer {
        self.quad_vertices.buffer
    }

    pub const fn index_buffer(&self) -> vk::Buffer {
        self.indices.buffer
    }

    pub const fn line_vertex_buffer(&self) -> vk::Buffer {
        self.line_vertices.buffer
    }
}

impl GeometryTarget for GeometryBuffers {
    fn regions(&mut self) -> Result<GeometryRegions<'_>> {
        Ok(GeometryRegions {
            quad_vertices: self.quad_vertices.mapped_slice_mut()?,
            indices: self.indices.mapped_slice_mut()?,
            line_vertices: self.line_vertices.mapped_slice_mut()?,
        })
    }

    fn counts(&self) -> GeometryCounts {
        self.counts
    }

    fn set_counts(&mut self, counts: GeometryCounts) {
        self.counts = counts;
    }
}

impl Drop for GeometryBuffers {
    fn drop(&mut self) {
        let mut alloc = self.allocator.lock();
        for buffer in [
            &mut self.quad_vertices,
            &mut self.indices,
            &mut self.line_vertices,
        ] {
            if let Err(e) = alloc.free_buffer(buffer) {
                tracing::error!("Failed to free geometry buffer: {e}");
            }
        }
    }
}
