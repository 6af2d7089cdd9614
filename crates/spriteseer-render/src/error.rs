//! Error types for the sprite renderer.

use spriteseer_core::GeometryKind;
use spriteseer_gpu::GpuError;
use thiserror::Error;

/// Renderer errors. Every variant is fatal for the frame loop.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{kind} buffer overflow: {requested} needed, capacity is {capacity}")]
    CapacityExceeded {
        kind: GeometryKind,
        requested: usize,
        capacity: usize,
    },

    #[error("quad vertex count {0} is not a multiple of 4")]
    UnalignedQuadVertices(usize),

    #[error("entity '{entity}' emitted {vertices} quad vertices, not a multiple of 4")]
    UnalignedEntityQuads { entity: String, vertices: usize },

    #[error("no textures to bind")]
    NoTextures,

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

impl From<spriteseer_core::Error> for RenderError {
    fn from(e: spriteseer_core::Error) -> Self {
        match e {
            spriteseer_core::Error::CapacityExceeded {
                kind,
                requested,
                capacity,
            } => Self::CapacityExceeded {
                kind,
                requested,
                capacity,
            },
            spriteseer_core::Error::UnalignedQuadVertices(count) => {
                Self::UnalignedQuadVertices(count)
            }
        }
    }
}

impl From<ash::vk::Result> for RenderError {
    fn from(e: ash::vk::Result) -> Self {
        Self::Gpu(GpuError::Vulkan(e))
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
