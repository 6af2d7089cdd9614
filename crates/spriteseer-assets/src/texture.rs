//! Sampled 2D textures uploaded through a staging buffer.

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use image::RgbaImage;
use spriteseer_gpu::{CommandPool, GpuContext, GpuImage, SharedAllocator};

use crate::error::{AssetError, Result};

/// Sprites are authored in sRGB.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// A device-local image with its view and sampler, ready for the fragment
/// shader.
pub struct Texture {
    name: String,
    image: GpuImage,
    view: vk::ImageView,
    sampler: vk::Sampler,
    device: Arc<ash::Device>,
    allocator: SharedAllocator,
}

impl Texture {
    /// Decode `path` and upload it.
    pub fn load(gpu: &GpuContext, pool: &CommandPool, name: &str, path: &Path) -> Result<Self> {
        let pixels = image::open(path)
            .map_err(|e| AssetError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .into_rgba8();
        Self::from_rgba(gpu, pool, name, &pixels)
    }

    /// Upload already decoded RGBA8 pixels.
    pub fn from_rgba(
        gpu: &GpuContext,
        pool: &CommandPool,
        name: &str,
        pixels: &RgbaImage,
    ) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        let device = gpu.shared_device();
        let allocator = gpu.allocator().clone();

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(TEXTURE_FORMAT)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = allocator
            .lock()
            .create_image(&image_info, MemoryLocation::GpuOnly, name)?;

        // From here on `texture` owns whatever has been created so far.
        let mut texture = Self {
            name: name.to_string(),
            image,
            view: vk::ImageView::null(),
            sampler: vk::Sampler::null(),
            device,
            allocator,
        };

        texture.upload(gpu, pool, pixels)?;

        let view_info = vk::ImageViewCreateInfo::default()
            .image(texture.image.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(TEXTURE_FORMAT)
            .subresource_range(color_range());
        texture.view = unsafe { texture.device.create_image_view(&view_info, None)? };

        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);
        texture.sampler = unsafe { texture.device.create_sampler(&sampler_info, None)? };

        tracing::debug!("Uploaded texture '{name}' ({width}x{height})");
        Ok(texture)
    }

    fn upload(&self, gpu: &GpuContext, pool: &CommandPool, pixels: &RgbaImage) -> Result<()> {
        let bytes = pixels.as_raw();
        let mut staging = self.allocator.lock().create_buffer(
            bytes.len() as u64,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            &format!("{} staging", self.name),
        )?;

        let extent = self.image.extent;
        let image = self.image.image;
        let copied = staging.write(bytes).and_then(|()| unsafe {
            pool.execute_single_time(gpu.graphics_queue(), |device, cmd| {
                transition(
                    device,
                    cmd,
                    image,
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                );
                let region = vk::BufferImageCopy::default()
                    .image_subresource(
                        vk::ImageSubresourceLayers::default()
                            .aspect_mask(vk::ImageAspectFlags::COLOR)
                            .layer_count(1),
                    )
                    .image_extent(extent);
                device.cmd_copy_buffer_to_image(
                    cmd,
                    staging.buffer,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
                transition(
                    device,
                    cmd,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                );
            })
        });

        // execute_single_time waits for the queue, so staging is free to go.
        self.allocator.lock().free_buffer(&mut staging)?;
        copied?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn extent(&self) -> vk::Extent3D {
        self.image.extent
    }

    pub const fn view(&self) -> vk::ImageView {
        self.view
    }

    pub const fn sampler(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.view, None);
        }
        if let Err(e) = self.allocator.lock().free_image(&mut self.image) {
            tracing::warn!("Failed to free texture '{}': {e}", self.name);
        }
    }
}

const fn color_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// Access masks and stages for the two transitions an upload needs.
fn transition_masks(
    old: vk::ImageLayout,
    new: vk::ImageLayout,
) -> (
    vk::AccessFlags,
    vk::AccessFlags,
    vk::PipelineStageFlags,
    vk::PipelineStageFlags,
) {
    if old == vk::ImageLayout::UNDEFINED {
        (
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
        )
    } else {
        debug_assert_eq!(new, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        (
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        )
    }
}

unsafe fn transition(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    old: vk::ImageLayout,
    new: vk::ImageLayout,
) {
    let (src_access, dst_access, src_stage, dst_stage) = transition_masks(old, new);
    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(old)
        .new_layout(new)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(color_range())
        .src_access_mask(src_access)
        .dst_access_mask(dst_access);

    unsafe {
        device.cmd_pipeline_barrier(
            cmd,
            src_stage,
            dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_transitions_wait_on_transfer() {
        let (_, dst, _, dst_stage) = transition_masks(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        assert_eq!(dst, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(dst_stage, vk::PipelineStageFlags::TRANSFER);

        let (src, dst, src_stage, dst_stage) = transition_masks(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        assert_eq!(src, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(dst, vk::AccessFlags::SHADER_READ);
        assert_eq!(src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    }
}
