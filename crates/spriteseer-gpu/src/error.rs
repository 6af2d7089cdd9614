//! Errors raised while talking to Vulkan.

use ash::vk;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),

    #[error("could not load the Vulkan library: {0}")]
    Loading(String),

    /// No physical device passed the renderer's requirements.
    #[error("no GPU supports the sprite renderer")]
    NoSuitableDevice,

    #[error("missing Vulkan extension: {0}")]
    ExtensionNotSupported(String),

    #[error("device memory allocation failed: {0}")]
    AllocationFailed(String),

    #[error("window surface creation failed: {0}")]
    SurfaceCreation(String),

    #[error("swapchain creation failed: {0}")]
    SwapchainCreation(String),

    /// A fence or semaphore could not be created.
    #[error("sync object creation failed: {0}")]
    SyncCreation(vk::Result),

    #[error("shader module creation failed: {0}")]
    ShaderModule(String),

    #[error("pipeline creation failed: {0}")]
    PipelineCreation(String),

    /// An object was used outside the state it supports.
    #[error("invalid GPU state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, GpuError>;
