//! What a physical device offers, and whether the sprite renderer can use it.

use std::ffi::CStr;

use ash::vk;

/// Lowest Vulkan version the renderer targets.
pub const MIN_API_VERSION: u32 = vk::API_VERSION_1_3;

/// Vendor decoded from the PCI vendor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Other(u32),
}

impl GpuVendor {
    pub const fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }
}

/// Snapshot of the properties and features device selection looks at.
#[derive(Debug, Clone)]
pub struct GpuCapabilities {
    pub vendor: GpuVendor,
    pub device_name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub api_version: u32,

    pub has_graphics_queue: bool,
    pub supports_swapchain: bool,
    /// `VK_EXT_extended_dynamic_state3` with polygon mode enabled.
    pub supports_dynamic_polygon_mode: bool,
    /// Needed for line polygon mode.
    pub supports_fill_mode_non_solid: bool,
    /// Runtime-sized sampler arrays with non-uniform indexing.
    pub supports_texture_arrays: bool,

    pub device_local_memory_mb: u64,
    /// Upper bound on the number of textures in the descriptor array.
    pub max_per_stage_samplers: u32,
}

impl GpuCapabilities {
    /// # Safety
    /// The instance and physical device must be valid.
    pub unsafe fn query(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Self {
        let properties = instance.get_physical_device_properties(physical_device);
        let extensions = instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default();
        let has_extension = |wanted: &CStr| {
            extensions
                .iter()
                .any(|ext| ext.extension_name_as_c_str().is_ok_and(|name| name == wanted))
        };
        let supports_swapchain = has_extension(ash::khr::swapchain::NAME);
        let has_dynamic_state3 = has_extension(ash::ext::extended_dynamic_state3::NAME);

        let mut vulkan_1_2 = vk::PhysicalDeviceVulkan12Features::default();
        let mut dynamic_state3 = vk::PhysicalDeviceExtendedDynamicState3FeaturesEXT::default();
        let mut features = vk::PhysicalDeviceFeatures2::default().push_next(&mut vulkan_1_2);
        if has_dynamic_state3 {
            features = features.push_next(&mut dynamic_state3);
        }
        instance.get_physical_device_features2(physical_device, &mut features);
        let fill_mode_non_solid = features.features.fill_mode_non_solid == vk::TRUE;

        let has_graphics_queue = instance
            .get_physical_device_queue_family_properties(physical_device)
            .iter()
            .any(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS));

        let memory = instance.get_physical_device_memory_properties(physical_device);
        let device_local_memory_mb = memory
            .memory_heaps_as_slice()
            .iter()
            .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
            .map(|heap| heap.size >> 20)
            .sum();

        Self {
            vendor: GpuVendor::from_vendor_id(properties.vendor_id),
            device_name: properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            device_type: properties.device_type,
            api_version: properties.api_version,
            has_graphics_queue,
            supports_swapchain,
            supports_dynamic_polygon_mode: has_dynamic_state3
                && dynamic_state3.extended_dynamic_state3_polygon_mode == vk::TRUE,
            supports_fill_mode_non_solid: fill_mode_non_solid,
            supports_texture_arrays: vulkan_1_2.runtime_descriptor_array == vk::TRUE
                && vulkan_1_2.shader_sampled_image_array_non_uniform_indexing == vk::TRUE,
            device_local_memory_mb,
            max_per_stage_samplers: properties.limits.max_per_stage_descriptor_samplers,
        }
    }

    /// Names of the requirements this device fails. Empty means usable.
    pub fn missing_requirements(&self) -> Vec<&'static str> {
        let checks = [
            (self.api_version >= MIN_API_VERSION, "Vulkan 1.3"),
            (self.has_graphics_queue, "graphics queue"),
            (self.supports_swapchain, "VK_KHR_swapchain"),
            (self.supports_dynamic_polygon_mode, "dynamic polygon mode"),
            (self.supports_fill_mode_non_solid, "fillModeNonSolid"),
            (self.supports_texture_arrays, "descriptor indexing"),
        ];
        checks
            .into_iter()
            .filter_map(|(ok, name)| (!ok).then_some(name))
            .collect()
    }

    pub fn meets_requirements(&self) -> bool {
        self.missing_requirements().is_empty()
    }

    /// Preference among usable devices; discrete GPUs first, then larger
    /// sampler tables.
    pub fn score(&self) -> u32 {
        let kind = match self.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => 1000,
            vk::PhysicalDeviceType::INTEGRATED_GPU => 100,
            vk::PhysicalDeviceType::VIRTUAL_GPU => 50,
            _ => 1,
        };
        kind + self.max_per_stage_samplers.min(1024) / 64
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}) - Vulkan {}.{}.{} - {} MB VRAM",
            self.device_name,
            self.vendor,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
            self.device_local_memory_mb,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capable() -> GpuCapabilities {
        GpuCapabilities {
            vendor: GpuVendor::Amd,
            device_name: "Test GPU".to_string(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            api_version: vk::make_api_version(0, 1, 3, 250),
            has_graphics_queue: true,
            supports_swapchain: true,
            supports_dynamic_polygon_mode: true,
            supports_fill_mode_non_solid: true,
            supports_texture_arrays: true,
            device_local_memory_mb: 4096,
            max_per_stage_samplers: 1024,
        }
    }

    #[test]
    fn vendor_ids() {
        assert_eq!(GpuVendor::from_vendor_id(0x10DE), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_vendor_id(0x8086), GpuVendor::Intel);
        assert_eq!(GpuVendor::from_vendor_id(0x1234), GpuVendor::Other(0x1234));
    }

    #[test]
    fn missing_requirements_are_named() {
        assert!(capable().meets_requirements());

        let weak = GpuCapabilities {
            api_version: vk::make_api_version(0, 1, 2, 0),
            supports_dynamic_polygon_mode: false,
            ..capable()
        };
        assert_eq!(
            weak.missing_requirements(),
            vec!["Vulkan 1.3", "dynamic polygon mode"]
        );
        assert!(!weak.meets_requirements());
    }

    #[test]
    fn discrete_outscores_integrated() {
        let integrated = GpuCapabilities {
            device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
            ..capable()
        };
        assert!(capable().score() > integrated.score());
        assert_eq!(capable().score(), 1016);
    }

    #[test]
    fn summary_names_device() {
        assert!(capable()
            .summary()
            .starts_with("Test GPU (Amd) - Vulkan 1.3.250"));
    }
}
