//! Window surface and the swapchain loader that goes with it.

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::context::GpuContext;
use crate::error::{GpuError, Result};

/// Presentation target for one window.
///
/// Must be dropped before the [`GpuContext`] that created it.
pub struct SurfaceContext {
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: ash::khr::swapchain::Device,
    physical_device: vk::PhysicalDevice,
}

impl SurfaceContext {
    /// Create a surface for `window`. Fails if the graphics queue cannot
    /// present to it.
    ///
    /// # Safety
    /// The window must outlive the returned surface.
    pub unsafe fn from_window<W>(gpu: &GpuContext, window: &W) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let surface_error = |what: &str, e: &dyn std::fmt::Display| {
            GpuError::SurfaceCreation(format!("{what}: {e}"))
        };
        let display = window
            .display_handle()
            .map_err(|e| surface_error("display handle", &e))?;
        let handle = window
            .window_handle()
            .map_err(|e| surface_error("window handle", &e))?;
        let surface = ash_window::create_surface(
            gpu.entry(),
            gpu.instance(),
            display.as_raw(),
            handle.as_raw(),
            None,
        )
        .map_err(|e| surface_error("vkCreateSurfaceKHR", &e))?;

        let surface_loader = ash::khr::surface::Instance::new(gpu.entry(), gpu.instance());
        if let Err(e) = check_presentable(&surface_loader, gpu, surface) {
            surface_loader.destroy_surface(surface, None);
            return Err(e);
        }

        Ok(Self {
            surface,
            swapchain_loader: ash::khr::swapchain::Device::new(gpu.instance(), gpu.device()),
            surface_loader,
            physical_device: gpu.physical_device(),
        })
    }

    pub const fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub const fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    /// Current capabilities, formats and present modes. Re-query before
    /// every swapchain (re)creation.
    pub fn capabilities(&self) -> Result<SurfaceCapabilities> {
        let (loader, device, surface) = (&self.surface_loader, self.physical_device, self.surface);
        unsafe {
            Ok(SurfaceCapabilities {
                capabilities: loader.get_physical_device_surface_capabilities(device, surface)?,
                formats: loader.get_physical_device_surface_formats(device, surface)?,
                present_modes: loader.get_physical_device_surface_present_modes(device, surface)?,
            })
        }
    }
}

unsafe fn check_presentable(
    loader: &ash::khr::surface::Instance,
    gpu: &GpuContext,
    surface: vk::SurfaceKHR,
) -> Result<()> {
    let supported = loader.get_physical_device_surface_support(
        gpu.physical_device(),
        gpu.graphics_queue_family(),
        surface,
    )?;
    if supported {
        Ok(())
    } else {
        Err(GpuError::SurfaceCreation(
            "graphics queue cannot present to this surface".to_string(),
        ))
    }
}

impl Drop for SurfaceContext {
    fn drop(&mut self) {
        unsafe { self.surface_loader.destroy_surface(self.surface, None) };
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceCapabilities {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}
