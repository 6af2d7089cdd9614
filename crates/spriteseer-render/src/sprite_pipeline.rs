//! Quad and line pipelines plus the texture descriptor set they share.

use ash::vk;
use spriteseer_core::Vertex;
use spriteseer_gpu::{
    create_pipeline_layout, sampled_image_array_layout, write_combined_image_samplers,
    DescriptorPool, GraphicsPipeline, GraphicsPipelineConfig, RenderPass,
};
use std::sync::Arc;

use crate::error::{RenderError, Result};

/// Vertex buffer binding shared by both pipelines.
pub fn vertex_bindings() -> Vec<vk::VertexInputBindingDescription> {
    vec![vk::VertexInputBindingDescription::default()
        .binding(0)
        .stride(Vertex::STRIDE)
        .input_rate(vk::VertexInputRate::VERTEX)]
}

/// Attribute layout matching [`Vertex`].
pub fn vertex_attributes() -> Vec<vk::VertexInputAttributeDescription> {
    [
        (vk::Format::R32G32_SFLOAT, Vertex::POS_OFFSET),
        (vk::Format::R32G32_SFLOAT, Vertex::TEX_COORD_OFFSET),
        (vk::Format::R32_SINT, Vertex::TEX_INDEX_OFFSET),
        (vk::Format::R32_SINT, Vertex::INTERACTION_OFFSET),
    ]
    .into_iter()
    .zip(0..)
    .map(|((format, offset), location)| {
        vk::VertexInputAttributeDescription::default()
            .binding(0)
            .location(location)
            .format(format)
            .offset(offset)
    })
    .collect()
}

/// Pipelines for textured quads (triangle list) and debug lines (line list).
///
/// Both use one pipeline layout with a single descriptor set holding every
/// texture as an array of combined image samplers.
pub struct SpritePipelines {
    quads: GraphicsPipeline,
    lines: GraphicsPipeline,
    descriptor_pool: DescriptorPool,
    descriptor_set: vk::DescriptorSet,
    texture_count: u32,
    layouts: Layouts,
}

/// Descriptor set layout and pipeline layout, destroyed after the pipelines.
struct Layouts {
    set_layout: vk::DescriptorSetLayout,
    layout: vk::PipelineLayout,
    device: Arc<ash::Device>,
}

impl Drop for Layouts {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.layout, None);
            self.device
                .destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}

impl SpritePipelines {
    /// Build both pipelines for `render_pass` and bind `textures` into the
    /// descriptor set in index order.
    ///
    /// # Safety
    /// The image views and samplers must stay valid for the lifetime of the pipelines.
    pub unsafe fn new(
        device: &Arc<ash::Device>,
        render_pass: &RenderPass,
        textures: &[(vk::ImageView, vk::Sampler)],
    ) -> Result<Self> {
        if textures.is_empty() {
            return Err(RenderError::NoTextures);
        }
        let texture_count = u32::try_from(textures.len())
            .map_err(|_| spriteseer_gpu::GpuError::InvalidState("too many textures".into()))?;

        let set_layout =
            sampled_image_array_layout(device, 0, texture_count, vk::ShaderStageFlags::FRAGMENT)?;

        let layout = match create_pipeline_layout(device, &[set_layout], &[]) {
            Ok(layout) => layout,
            Err(e) => {
                device.destroy_descriptor_set_layout(set_layout, None);
                return Err(e.into());
            }
        };
        let layouts = Layouts {
            set_layout,
            layout,
            device: device.clone(),
        };

        let (quads, lines, descriptor_pool, descriptor_set) =
            Self::build_parts(device, render_pass, set_layout, layout, texture_count)?;

        write_combined_image_samplers(device, descriptor_set, 0, textures);

        tracing::info!("Sprite pipelines created with {texture_count} textures");

        Ok(Self {
            quads,
            lines,
            descriptor_pool,
            descriptor_set,
            texture_count,
            layouts,
        })
    }

    unsafe fn build_parts(
        device: &Arc<ash::Device>,
        render_pass: &RenderPass,
        set_layout: vk::DescriptorSetLayout,
        layout: vk::PipelineLayout,
        texture_count: u32,
    ) -> Result<(
        GraphicsPipeline,
        GraphicsPipeline,
        DescriptorPool,
        vk::DescriptorSet,
    )> {
        let mut config = GraphicsPipelineConfig {
            vertex_shader: spriteseer_shaders::sprite_vertex_shader(),
            fragment_shader: spriteseer_shaders::sprite_fragment_shader(),
            vertex_bindings: vertex_bindings(),
            vertex_attributes: vertex_attributes(),
            ..GraphicsPipelineConfig::default()
        };

        let quads = GraphicsPipeline::new(device.clone(), &config, layout, render_pass.handle())?;

        config.topology = vk::PrimitiveTopology::LINE_LIST;
        let lines = GraphicsPipeline::new(device.clone(), &config, layout, render_pass.handle())?;

        let descriptor_pool = DescriptorPool::for_sampled_images(device.clone(), texture_count)?;
        let descriptor_set = descriptor_pool.allocate_one(set_layout)?;

        Ok((quads, lines, descriptor_pool, descriptor_set))
    }

    pub const fn quads(&self) -> &GraphicsPipeline {
        &self.quads
    }

    pub const fn lines(&self) -> &GraphicsPipeline {
        &self.lines
    }

    pub const fn layout(&self) -> vk::PipelineLayout {
        self.layouts.layout
    }

    pub const fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }

    pub const fn texture_count(&self) -> u32 {
        self.texture_count
    }

    pub const fn descriptor_pool(&self) -> &DescriptorPool {
        &self.descriptor_pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_cover_vertex_layout() {
        let attributes = vertex_attributes();
        assert_eq!(attributes.len(), 4);
        assert_eq!(attributes[0].offset, 0);
        assert_eq!(attributes[1].offset, 8);
        assert_eq!(attributes[2].format, vk::Format::R32_SINT);
        assert_eq!(attributes[3].location, 3);
        assert_eq!(attributes[3].offset, 20);
    }

    #[test]
    fn binding_stride_is_vertex_size() {
        assert_eq!(vertex_bindings()[0].stride, 24);
    }
}
