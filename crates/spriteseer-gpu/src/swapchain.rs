//! Swapchain lifecycle: negotiation, the per-surface resource set, and
//! acquire/present outcome handling.

use crate::context::GpuContext;
use crate::error::{GpuError, Result};
use crate::memory::{GpuImage, SharedAllocator};
use crate::render_pass::{RenderPass, DEPTH_FORMAT};
use crate::surface::{SurfaceCapabilities, SurfaceContext};
use ash::prelude::VkResult;
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

/// Parameters a swapchain is created with, derived from what the surface
/// supports and what the window wants.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainPlan {
    pub image_count: u32,
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainPlan {
    /// Negotiate a plan for a window of `window_extent` pixels.
    pub fn negotiate(
        surface: &SurfaceCapabilities,
        window_extent: vk::Extent2D,
        vsync: bool,
    ) -> Result<Self> {
        let surface_format = select_surface_format(&surface.formats).ok_or_else(|| {
            GpuError::SwapchainCreation("surface reports no formats".to_string())
        })?;

        Ok(Self {
            image_count: select_image_count(&surface.capabilities),
            surface_format,
            present_mode: select_present_mode(&surface.present_modes, vsync),
            extent: calculate_extent(&surface.capabilities, window_extent),
            pre_transform: surface.capabilities.current_transform,
        })
    }
}

/// One more image than the minimum, within the surface's bounds.
///
/// A maximum of zero means the surface imposes no upper bound.
pub const fn select_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && desired > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        desired
    }
}

/// Select the best surface format.
pub fn select_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    available
        .iter()
        .find(|format| {
            format.format == vk::Format::B8G8R8A8_SRGB
                && format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| available.first())
        .copied()
}

/// Select the best present mode.
pub fn select_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }

    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Calculate swapchain extent.
///
/// The window's pixel size is clamped into the surface's supported range.
/// A window that reports no size falls back to the surface's current extent.
pub fn calculate_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: vk::Extent2D,
) -> vk::Extent2D {
    if window_extent.width == 0 || window_extent.height == 0 {
        if capabilities.current_extent.width != u32::MAX {
            return capabilities.current_extent;
        }
        return capabilities.min_image_extent;
    }

    vk::Extent2D {
        width: window_extent.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window_extent.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Result of asking for the next swapchain image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image was acquired; `suboptimal` asks for a rebuild after this frame.
    Acquired { image_index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface; nothing was acquired.
    Stale,
}

/// Result of presenting an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// The swapchain is out of date or suboptimal and should be rebuilt.
    Stale,
}

/// Map the raw acquire result: out-of-date is recoverable, other errors are fatal.
pub fn classify_acquire(result: VkResult<(u32, bool)>) -> Result<AcquireOutcome> {
    match result {
        Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Acquired {
            image_index,
            suboptimal,
        }),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::Stale),
        Err(e) => Err(GpuError::from(e)),
    }
}

/// Map the raw present result: out-of-date and suboptimal both request a rebuild.
pub fn classify_present(result: VkResult<bool>) -> Result<PresentOutcome> {
    match result {
        Ok(false) => Ok(PresentOutcome::Presented),
        Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::Stale),
        Err(e) => Err(GpuError::from(e)),
    }
}

/// Depth attachment shared by every framebuffer of a swapchain.
pub struct DepthBuffer {
    view: vk::ImageView,
    image: GpuImage,
    allocator: SharedAllocator,
    device: Arc<ash::Device>,
}

impl DepthBuffer {
    /// Create a device-local depth image and view of `extent`.
    pub fn new(
        device: Arc<ash::Device>,
        allocator: SharedAllocator,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let mut image =
            allocator
                .lock()
                .create_image(&create_info, MemoryLocation::GpuOnly, "depth buffer")?;

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::DEPTH)
                    .level_count(1)
                    .layer_count(1),
            );

        let view = match unsafe { device.create_image_view(&view_info, None) } {
            Ok(view) => view,
            Err(e) => {
                allocator.lock().free_image(&mut image)?;
                return Err(e.into());
            }
        };

        Ok(Self {
            view,
            image,
            allocator,
            device,
        })
    }

    pub const fn view(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.view, None);
        }
        if let Err(e) = self.allocator.lock().free_image(&mut self.image) {
            tracing::error!("Failed to free depth buffer: {e}");
        }
    }
}

struct Framebuffers {
    handles: Vec<vk::Framebuffer>,
    device: Arc<ash::Device>,
}

impl Drop for Framebuffers {
    fn drop(&mut self) {
        for &framebuffer in &self.handles {
            unsafe { self.device.destroy_framebuffer(framebuffer, None) };
        }
    }
}

struct ImageViews {
    views: Vec<vk::ImageView>,
    device: Arc<ash::Device>,
}

impl Drop for ImageViews {
    fn drop(&mut self) {
        for &view in &self.views {
            unsafe { self.device.destroy_image_view(view, None) };
        }
    }
}

struct SwapchainHandle {
    swapchain: vk::SwapchainKHR,
    loader: ash::khr::swapchain::Device,
}

impl Drop for SwapchainHandle {
    fn drop(&mut self) {
        unsafe { self.loader.destroy_swapchain(self.swapchain, None) };
    }
}

/// Everything that must be rebuilt when the surface changes: the swapchain,
/// one view and framebuffer per image, and the shared depth buffer.
///
/// Fields drop in declaration order, which is the reverse of creation:
/// depth buffer, framebuffers, image views, then the swapchain. The device
/// must be idle before the set is dropped.
pub struct SwapchainResources {
    depth: DepthBuffer,
    framebuffers: Framebuffers,
    image_views: ImageViews,
    swapchain: SwapchainHandle,
    images: Vec<vk::Image>,
    plan: SwapchainPlan,
}

impl SwapchainResources {
    /// Build a resource set for `plan`. Any previous set must already be
    /// dropped.
    pub fn create(
        gpu: &GpuContext,
        surface: &SurfaceContext,
        render_pass: &RenderPass,
        plan: SwapchainPlan,
    ) -> Result<Self> {
        let device = gpu.shared_device();
        let loader = surface.swapchain_loader().clone();

        let queue_families = [gpu.graphics_queue_family()];
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.handle())
            .min_image_count(plan.image_count)
            .image_format(plan.surface_format.format)
            .image_color_space(plan.surface_format.color_space)
            .image_extent(plan.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(&queue_families)
            .pre_transform(plan.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(plan.present_mode)
            .clipped(true);

        let swapchain = unsafe { loader.create_swapchain(&create_info, None) }
            .map_err(|e| GpuError::SwapchainCreation(e.to_string()))?;
        let swapchain = SwapchainHandle { swapchain, loader };

        let images = unsafe {
            swapchain
                .loader
                .get_swapchain_images(swapchain.swapchain)?
        };

        let mut image_views = ImageViews {
            views: Vec::with_capacity(images.len()),
            device: device.clone(),
        };
        for &image in &images {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(plan.surface_format.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(
                    vk::ImageSubresourceRange::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .level_count(1)
                        .layer_count(1),
                );
            image_views
                .views
                .push(unsafe { device.create_image_view(&view_info, None)? });
        }

        let depth = DepthBuffer::new(device.clone(), gpu.allocator().clone(), plan.extent)?;

        let mut framebuffers = Framebuffers {
            handles: Vec::with_capacity(images.len()),
            device: device.clone(),
        };
        for &view in &image_views.views {
            let attachments = [view, depth.view()];
            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(plan.extent.width)
                .height(plan.extent.height)
                .layers(1);
            framebuffers
                .handles
                .push(unsafe { device.create_framebuffer(&framebuffer_info, None)? });
        }

        Ok(Self {
            depth,
            framebuffers,
            image_views,
            swapchain,
            images,
            plan,
        })
    }

    pub const fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain.swapchain
    }

    pub const fn plan(&self) -> &SwapchainPlan {
        &self.plan
    }

    pub const fn extent(&self) -> vk::Extent2D {
        self.plan.extent
    }

    pub const fn format(&self) -> vk::Format {
        self.plan.surface_format.format
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn framebuffer(&self, image_index: u32) -> vk::Framebuffer {
        self.framebuffers.handles[image_index as usize]
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.handles.len()
    }

    pub fn image_view_count(&self) -> usize {
        self.image_views.views.len()
    }

    pub const fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Acquire the next image, signaling `semaphore` when it is writable.
    ///
    /// # Safety
    /// The semaphore must be unsignaled with no pending signal operation.
    pub unsafe fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<AcquireOutcome> {
        classify_acquire(self.swapchain.loader.acquire_next_image(
            self.swapchain.swapchain,
            u64::MAX,
            semaphore,
            vk::Fence::null(),
        ))
    }

    /// Present `image_index` once `wait_semaphore` signals.
    ///
    /// # Safety
    /// The queue must support presentation to this swapchain's surface.
    pub unsafe fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> Result<PresentOutcome> {
        let wait_semaphores = [wait_semaphore];
        let swapchains = [self.swapchain.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        classify_present(self.swapchain.loader.queue_present(queue, &present_info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(min: u32, max: u32) -> SurfaceCapabilities {
        SurfaceCapabilities {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: min,
                max_image_count: max,
                current_extent: vk::Extent2D {
                    width: u32::MAX,
                    height: u32::MAX,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                ..Default::default()
            },
            formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::R8G8B8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE],
        }
    }

    const WINDOW: vk::Extent2D = vk::Extent2D {
        width: 1600,
        height: 800,
    };

    #[test]
    fn image_count_is_min_plus_one_within_bounds() {
        assert_eq!(select_image_count(&surface(2, 8).capabilities), 3);
        assert_eq!(select_image_count(&surface(3, 3).capabilities), 3);
        assert_eq!(select_image_count(&surface(2, 0).capabilities), 3);
    }

    #[test]
    fn prefers_srgb_bgra() {
        let caps = surface(2, 3);
        let format = select_surface_format(&caps.formats).unwrap();
        assert_eq!(format.format, vk::Format::B8G8R8A8_SRGB);

        let fallback = select_surface_format(&caps.formats[..1]).unwrap();
        assert_eq!(fallback.format, vk::Format::R8G8B8A8_UNORM);
        assert!(select_surface_format(&[]).is_none());
    }

    #[test]
    fn present_mode_follows_vsync() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(select_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
        assert_eq!(
            select_present_mode(&modes, false),
            vk::PresentModeKHR::IMMEDIATE
        );
        assert_eq!(
            select_present_mode(&[vk::PresentModeKHR::FIFO], false),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn extent_is_clamped_window_size() {
        let mut caps = surface(2, 3).capabilities;
        assert_eq!(calculate_extent(&caps, WINDOW), WINDOW);

        caps.max_image_extent = vk::Extent2D {
            width: 1024,
            height: 1024,
        };
        assert_eq!(
            calculate_extent(&caps, WINDOW),
            vk::Extent2D {
                width: 1024,
                height: 800
            }
        );
    }

    #[test]
    fn undefined_window_size_uses_current_extent() {
        let mut caps = surface(2, 3).capabilities;
        caps.current_extent = vk::Extent2D {
            width: 640,
            height: 480,
        };
        let zero = vk::Extent2D::default();
        assert_eq!(calculate_extent(&caps, zero), caps.current_extent);
    }

    #[test]
    fn renegotiating_same_extent_is_idempotent() {
        let caps = surface(2, 8);
        let first = SwapchainPlan::negotiate(&caps, WINDOW, true).unwrap();
        let second = SwapchainPlan::negotiate(&caps, WINDOW, true).unwrap();
        assert_eq!(first.extent, second.extent);
        assert_eq!(first.image_count, second.image_count);
        assert_eq!(first.present_mode, second.present_mode);
        assert_eq!(first.surface_format.format, second.surface_format.format);
        assert_eq!(first.image_count, 3);
        assert_eq!(first.extent, WINDOW);
    }

    #[test]
    fn negotiation_fails_without_formats() {
        let mut caps = surface(2, 3);
        caps.formats.clear();
        assert!(SwapchainPlan::negotiate(&caps, WINDOW, true).is_err());
    }

    #[test]
    fn acquire_classification() {
        assert_eq!(
            classify_acquire(Ok((2, false))).unwrap(),
            AcquireOutcome::Acquired {
                image_index: 2,
                suboptimal: false
            }
        );
        assert_eq!(
            classify_acquire(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            AcquireOutcome::Stale
        );
        assert!(classify_acquire(Err(vk::Result::ERROR_DEVICE_LOST)).is_err());
    }

    #[test]
    fn present_classification() {
        assert_eq!(
            classify_present(Ok(false)).unwrap(),
            PresentOutcome::Presented
        );
        assert_eq!(classify_present(Ok(true)).unwrap(), PresentOutcome::Stale);
        assert_eq!(
            classify_present(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            PresentOutcome::Stale
        );
        assert!(classify_present(Err(vk::Result::ERROR_SURFACE_LOST_KHR)).is_err());
    }
}
