//! Instance, device and allocator lifetime.

use crate::capabilities::GpuCapabilities;
use crate::error::{GpuError, Result};
use crate::instance::{create_instance, select_physical_device};
use crate::memory::{GpuAllocator, SharedAllocator};
use ash::vk;
use parking_lot::Mutex;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr};
use std::sync::Arc;

/// Everything device-wide: instance, logical device, queue and allocator.
///
/// Resources built from it must be dropped first.
pub struct GpuContext {
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) debug: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: Arc<ash::Device>,
    pub(crate) capabilities: GpuCapabilities,
    pub(crate) allocator: SharedAllocator,
    pub(crate) dynamic_state3: ash::ext::extended_dynamic_state3::Device,

    pub(crate) graphics_queue_family: u32,
    pub(crate) graphics_queue: vk::Queue,
}

impl GpuContext {
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Owned device handle for resources that destroy themselves on drop.
    pub fn shared_device(&self) -> Arc<ash::Device> {
        self.device.clone()
    }

    pub const fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    pub const fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub const fn capabilities(&self) -> &GpuCapabilities {
        &self.capabilities
    }

    /// The single queue used for both rendering and presentation.
    pub const fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub const fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    pub const fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub const fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Loader for `VK_EXT_extended_dynamic_state3` commands.
    pub const fn dynamic_state3(&self) -> &ash::ext::extended_dynamic_state3::Device {
        &self.dynamic_state3
    }

    pub fn wait_idle(&self) -> Result<()> {
        Ok(unsafe { self.device.device_wait_idle()? })
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            // Allocator memory must be released before the device goes away
            self.allocator.lock().shutdown();

            self.device.destroy_device(None);
            if let Some((loader, messenger)) = self.debug.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        tracing::debug!("GPU context destroyed");
    }
}

/// Configures instance creation; [`build`](Self::build) picks the device.
pub struct GpuContextBuilder {
    app_name: String,
    enable_validation: bool,
    display: Option<RawDisplayHandle>,
}

impl Default for GpuContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Sprite Seer".to_string(),
            enable_validation: cfg!(debug_assertions),
            display: None,
        }
    }
}

impl GpuContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Enable or disable validation layers.
    pub const fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Request the surface extensions needed by this display.
    pub const fn display(mut self, display: RawDisplayHandle) -> Self {
        self.display = Some(display);
        self
    }

    pub fn build(self) -> Result<GpuContext> {
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| GpuError::Loading(e.to_string()))?;

        let handles = unsafe {
            create_instance(&entry, &self.app_name, self.enable_validation, self.display)
        }?;
        let instance = handles.instance;
        let debug = handles.debug;

        let (physical_device, capabilities) = match unsafe { select_physical_device(&instance) } {
            Ok(selected) => selected,
            Err(e) => {
                unsafe { destroy_instance(&instance, debug) };
                return Err(e);
            }
        };

        tracing::info!("Selected GPU: {}", capabilities.summary());

        let created = unsafe { find_graphics_queue_family(&instance, physical_device) }
            .and_then(|family| unsafe {
                create_device(&instance, physical_device, family).map(|d| (family, d))
            });
        let (graphics_queue_family, (device, graphics_queue)) = match created {
            Ok(created) => created,
            Err(e) => {
                unsafe { destroy_instance(&instance, debug) };
                return Err(e);
            }
        };

        let device = Arc::new(device);

        let allocator =
            match unsafe { GpuAllocator::new(&instance, device.clone(), physical_device) } {
                Ok(allocator) => allocator,
                Err(e) => {
                    unsafe {
                        device.destroy_device(None);
                        destroy_instance(&instance, debug);
                    }
                    return Err(e);
                }
            };

        let dynamic_state3 = ash::ext::extended_dynamic_state3::Device::new(&instance, &device);

        Ok(GpuContext {
            entry,
            instance,
            debug,
            physical_device,
            device,
            capabilities,
            allocator: Arc::new(Mutex::new(allocator)),
            dynamic_state3,
            graphics_queue_family,
            graphics_queue,
        })
    }
}

unsafe fn destroy_instance(
    instance: &ash::Instance,
    debug: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
) {
    if let Some((loader, messenger)) = debug {
        loader.destroy_debug_utils_messenger(messenger, None);
    }
    instance.destroy_instance(None);
}

/// Find the first queue family with graphics support.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn find_graphics_queue_family(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<u32> {
    instance
        .get_physical_device_queue_family_properties(physical_device)
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .and_then(|i| u32::try_from(i).ok())
        .ok_or(GpuError::NoSuitableDevice)
}

/// Required device extensions.
fn required_device_extensions() -> Vec<&'static CStr> {
    vec![
        ash::khr::swapchain::NAME,
        ash::ext::extended_dynamic_state3::NAME,
        #[cfg(target_os = "macos")]
        ash::khr::portability_subset::NAME,
    ]
}

/// Create the logical device and retrieve the graphics queue.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn create_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    graphics_family: u32,
) -> Result<(ash::Device, vk::Queue)> {
    let queue_priority = 1.0_f32;
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(graphics_family)
        .queue_priorities(std::slice::from_ref(&queue_priority))];

    let extensions = required_device_extensions();
    let extension_names: Vec<*const c_char> = extensions.iter().map(|ext| ext.as_ptr()).collect();

    // Texture array indexed per draw by the vertex's texture slot
    let mut vulkan_1_2_features = vk::PhysicalDeviceVulkan12Features::default()
        .descriptor_indexing(true)
        .runtime_descriptor_array(true)
        .shader_sampled_image_array_non_uniform_indexing(true);

    let mut dynamic_state3_features =
        vk::PhysicalDeviceExtendedDynamicState3FeaturesEXT::default()
            .extended_dynamic_state3_polygon_mode(true);

    let features = vk::PhysicalDeviceFeatures::default().fill_mode_non_solid(true);

    let mut features2 = vk::PhysicalDeviceFeatures2::default()
        .features(features)
        .push_next(&mut vulkan_1_2_features)
        .push_next(&mut dynamic_state3_features);

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .push_next(&mut features2);

    let device = instance
        .create_device(physical_device, &device_create_info, None)
        .map_err(GpuError::from)?;

    let graphics_queue = device.get_device_queue(graphics_family, 0);

    Ok((device, graphics_queue))
}
