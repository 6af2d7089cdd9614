//! Asset error types.

use std::path::PathBuf;

use ash::vk;
use spriteseer_gpu::GpuError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Resource directory not found: {0}")]
    MissingResourceDir(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Texture not found: {0}")]
    TextureNotFound(String),

    #[error("Sound not found: {0}")]
    SoundNotFound(String),

    #[error("Too many textures: {0}")]
    TooManyTextures(usize),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),
}

pub type Result<T> = std::result::Result<T, AssetError>;
