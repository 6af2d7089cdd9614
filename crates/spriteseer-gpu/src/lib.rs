//! Vulkan abstraction layer for the Sprite Seer engine.
//!
//! This crate provides:
//! - Vulkan instance and device management
//! - GPU capability detection
//! - Memory allocation via gpu-allocator
//! - Command buffer management
//! - Frame-in-flight synchronization
//! - Swapchain, depth buffer, framebuffer and render pass lifecycle

pub mod capabilities;
pub mod command;
pub mod context;
pub mod descriptors;
pub mod error;
pub mod instance;
pub mod memory;
pub mod pipeline;
pub mod render_pass;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use capabilities::{GpuCapabilities, GpuVendor};
pub use command::{CommandPool, Submission};
pub use context::{GpuContext, GpuContextBuilder};
pub use descriptors::{sampled_image_array_layout, write_combined_image_samplers, DescriptorPool};
pub use error::{GpuError, Result};
pub use memory::{GpuAllocator, GpuBuffer, GpuImage, SharedAllocator};
pub use pipeline::{create_pipeline_layout, GraphicsPipeline, GraphicsPipelineConfig};
pub use render_pass::RenderPass;
pub use surface::{SurfaceCapabilities, SurfaceContext};
pub use swapchain::{
    AcquireOutcome, DepthBuffer, PresentOutcome, SwapchainPlan, SwapchainResources,
};
pub use sync::{create_fence, create_semaphore, FrameSlot, FrameSynchronizer, SlotCounter, SlotDevice};
