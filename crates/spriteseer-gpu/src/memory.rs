//! Device memory for buffers and images, backed by `gpu-allocator`.

use std::ops::Range;
use std::sync::Arc;

use ash::vk;
use bytemuck::Pod;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use gpu_allocator::{AllocationSizes, AllocatorDebugSettings, MemoryLocation};
use parking_lot::Mutex;

use crate::error::{GpuError, Result};

/// Allocator handle shared by every resource that owns device memory.
pub type SharedAllocator = Arc<Mutex<GpuAllocator>>;

/// Owns the `gpu-allocator` instance and binds its allocations to Vulkan
/// objects.
///
/// After [`shutdown`](Self::shutdown) every call fails with
/// [`GpuError::InvalidState`]; resources dropped that late only log.
pub struct GpuAllocator {
    allocator: Option<Allocator>,
    device: Arc<ash::Device>,
}

impl GpuAllocator {
    /// # Safety
    /// The instance, device, and physical device must be valid.
    pub unsafe fn new(
        instance: &ash::Instance,
        device: Arc<ash::Device>,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let debug_settings = AllocatorDebugSettings {
            log_memory_information: cfg!(debug_assertions),
            log_leaks_on_shutdown: true,
            ..AllocatorDebugSettings::default()
        };
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: (*device).clone(),
            physical_device,
            debug_settings,
            buffer_device_address: false,
            allocation_sizes: AllocationSizes::default(),
        })
        .map_err(|e| GpuError::AllocationFailed(e.to_string()))?;

        Ok(Self {
            allocator: Some(allocator),
            device,
        })
    }

    fn allocate(
        &mut self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        let allocator = self
            .allocator
            .as_mut()
            .ok_or_else(|| GpuError::InvalidState("allocator is shut down".to_string()))?;
        allocator
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| GpuError::AllocationFailed(format!("{name}: {e}")))
    }

    fn release(&mut self, allocation: Option<Allocation>) -> Result<()> {
        let (Some(allocation), Some(allocator)) = (allocation, self.allocator.as_mut()) else {
            return Ok(());
        };
        allocator
            .free(allocation)
            .map_err(|e| GpuError::AllocationFailed(e.to_string()))
    }

    /// Create a buffer of `size` bytes with memory from `location`.
    ///
    /// `CpuToGpu` buffers stay persistently mapped.
    pub fn create_buffer(
        &mut self,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> Result<GpuBuffer> {
        let info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let device = self.device.clone();
        let buffer = unsafe { device.create_buffer(&info, None)? };
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let bound = self
            .allocate(name, requirements, location, true)
            .and_then(|allocation| {
                unsafe { device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) }
                    .map(|()| allocation)
                    .map_err(GpuError::from)
            });
        let allocation = match bound {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        tracing::debug!("Allocated buffer '{name}' ({size} bytes, {location:?})");
        Ok(GpuBuffer {
            buffer,
            allocation: Some(allocation),
            size,
        })
    }

    /// Destroy the buffer, then return its memory.
    pub fn free_buffer(&mut self, buffer: &mut GpuBuffer) -> Result<()> {
        unsafe { self.device.destroy_buffer(buffer.buffer, None) };
        buffer.buffer = vk::Buffer::null();
        self.release(buffer.allocation.take())
    }

    /// Create an optimally tiled image described by `create_info`.
    pub fn create_image(
        &mut self,
        create_info: &vk::ImageCreateInfo,
        location: MemoryLocation,
        name: &str,
    ) -> Result<GpuImage> {
        let device = self.device.clone();
        let image = unsafe { device.create_image(create_info, None)? };
        let requirements = unsafe { device.get_image_memory_requirements(image) };

        let bound = self
            .allocate(name, requirements, location, false)
            .and_then(|allocation| {
                unsafe { device.bind_image_memory(image, allocation.memory(), allocation.offset()) }
                    .map(|()| allocation)
                    .map_err(GpuError::from)
            });
        let allocation = match bound {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        Ok(GpuImage {
            image,
            allocation: Some(allocation),
            format: create_info.format,
            extent: create_info.extent,
        })
    }

    /// Destroy the image, then return its memory.
    pub fn free_image(&mut self, image: &mut GpuImage) -> Result<()> {
        unsafe { self.device.destroy_image(image.image, None) };
        image.image = vk::Image::null();
        self.release(image.allocation.take())
    }

    /// Drop the underlying allocator; must happen before the device is
    /// destroyed. Allocations still live are reported as leaks.
    pub fn shutdown(&mut self) {
        drop(self.allocator.take());
    }
}

impl Drop for GpuAllocator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A buffer and the memory bound to it.
pub struct GpuBuffer {
    pub buffer: vk::Buffer,
    pub allocation: Option<Allocation>,
    pub size: u64,
}

impl GpuBuffer {
    fn mapped_bytes(&mut self) -> Result<&mut [u8]> {
        let len = usize::try_from(self.size)
            .map_err(|_| GpuError::InvalidState("buffer too large to map".to_string()))?;
        self.allocation
            .as_mut()
            .and_then(Allocation::mapped_slice_mut)
            .and_then(|bytes| bytes.get_mut(..len))
            .ok_or_else(|| GpuError::InvalidState("buffer is not host visible".to_string()))
    }

    /// The whole mapped buffer as a slice of `T`.
    pub fn mapped_slice_mut<T: Pod>(&mut self) -> Result<&mut [T]> {
        bytemuck::try_cast_slice_mut(self.mapped_bytes()?)
            .map_err(|e| GpuError::InvalidState(format!("mapped buffer layout: {e}")))
    }

    /// Copy `data` to the start of the mapped buffer.
    pub fn write<T: Pod>(&mut self, data: &[T]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let range = byte_range(bytes.len(), self.size)?;
        self.mapped_bytes()?[range].copy_from_slice(bytes);
        Ok(())
    }
}

/// `0..len`, if `len` bytes fit in a buffer of `size` bytes.
fn byte_range(len: usize, size: u64) -> Result<Range<usize>> {
    if len as u64 > size {
        return Err(GpuError::InvalidState(format!(
            "write of {len} bytes exceeds buffer size {size}"
        )));
    }
    Ok(0..len)
}

/// An image and the memory bound to it.
pub struct GpuImage {
    pub image: vk::Image,
    pub allocation: Option<Allocation>,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_must_fit() {
        assert_eq!(byte_range(16, 64).unwrap(), 0..16);
        assert_eq!(byte_range(64, 64).unwrap(), 0..64);
        assert!(matches!(
            byte_range(65, 64),
            Err(GpuError::InvalidState(_))
        ));
    }
}
