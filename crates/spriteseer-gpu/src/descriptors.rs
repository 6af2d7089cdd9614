//! Descriptor layouts, pools and writes for sampled texture arrays.

use std::sync::Arc;

use ash::vk;

use crate::error::{GpuError, Result};

fn sampled_image_binding(
    binding: u32,
    count: u32,
    stages: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding<'static> {
    vk::DescriptorSetLayoutBinding::default()
        .binding(binding)
        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .descriptor_count(count)
        .stage_flags(stages)
}

/// Layout with a single binding holding `count` combined image samplers.
///
/// # Safety
/// The device must be valid.
pub unsafe fn sampled_image_array_layout(
    device: &ash::Device,
    binding: u32,
    count: u32,
    stages: vk::ShaderStageFlags,
) -> Result<vk::DescriptorSetLayout> {
    let bindings = [sampled_image_binding(binding, count, stages)];
    let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
    Ok(device.create_descriptor_set_layout(&info, None)?)
}

/// Pool that frees its sets when dropped.
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    device: Arc<ash::Device>,
}

impl DescriptorPool {
    /// Pool sized for exactly one set of `count` combined image samplers.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn for_sampled_images(device: Arc<ash::Device>, count: u32) -> Result<Self> {
        let sizes = [vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: count,
        }];
        let pool = device.create_descriptor_pool(
            &vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&sizes)
                .max_sets(1),
            None,
        )?;
        Ok(Self { pool, device })
    }

    /// Allocate one set with `layout`.
    pub fn allocate_one(&self, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let layouts = [layout];
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);
        let sets = unsafe { self.device.allocate_descriptor_sets(&info)? };
        sets.first()
            .copied()
            .ok_or_else(|| GpuError::InvalidState("descriptor pool returned no set".to_string()))
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe { self.device.destroy_descriptor_pool(self.pool, None) };
    }
}

fn image_infos(images: &[(vk::ImageView, vk::Sampler)]) -> Vec<vk::DescriptorImageInfo> {
    images
        .iter()
        .map(|&(image_view, sampler)| vk::DescriptorImageInfo {
            sampler,
            image_view,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        })
        .collect()
}

/// Fill array elements `0..images.len()` of `binding`, in order.
///
/// # Safety
/// Every view and sampler must be valid and `set` must not be in use.
pub unsafe fn write_combined_image_samplers(
    device: &ash::Device,
    set: vk::DescriptorSet,
    binding: u32,
    images: &[(vk::ImageView, vk::Sampler)],
) {
    let infos = image_infos(images);
    if infos.is_empty() {
        return;
    }
    let write = vk::WriteDescriptorSet::default()
        .dst_set(set)
        .dst_binding(binding)
        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .image_info(&infos);
    device.update_descriptor_sets(&[write], &[]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_holds_whole_texture_array() {
        let binding = sampled_image_binding(0, 8, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(binding.descriptor_count, 8);
        assert_eq!(
            binding.descriptor_type,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn image_infos_keep_texture_order() {
        use ash::vk::Handle;

        let images = [
            (vk::ImageView::from_raw(1), vk::Sampler::from_raw(10)),
            (vk::ImageView::from_raw(2), vk::Sampler::from_raw(20)),
        ];
        let infos = image_infos(&images);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].image_view.as_raw(), 2);
        assert_eq!(infos[1].sampler.as_raw(), 20);
        assert_eq!(
            infos[0].image_layout,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        );
    }
}
