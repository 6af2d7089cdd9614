//! Graphics pipeline creation.

use crate::error::{GpuError, Result};
use ash::vk;
use std::sync::Arc;

/// Create a pipeline layout.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_pipeline_layout(
    device: &ash::Device,
    descriptor_set_layouts: &[vk::DescriptorSetLayout],
    push_constant_ranges: &[vk::PushConstantRange],
) -> Result<vk::PipelineLayout> {
    let layout_info = vk::PipelineLayoutCreateInfo::default()
        .set_layouts(descriptor_set_layouts)
        .push_constant_ranges(push_constant_ranges);

    device
        .create_pipeline_layout(&layout_info, None)
        .map_err(|e| GpuError::PipelineCreation(e.to_string()))
}

/// Graphics pipeline configuration.
#[derive(Clone)]
pub struct GraphicsPipelineConfig<'a> {
    pub vertex_shader: &'a [u32],
    pub fragment_shader: &'a [u32],
    pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    pub topology: vk::PrimitiveTopology,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare_op: vk::CompareOp,
    pub alpha_blend: bool,
    /// Whether the polygon mode is set per command buffer instead of baked in.
    pub dynamic_polygon_mode: bool,
}

impl Default for GraphicsPipelineConfig<'_> {
    fn default() -> Self {
        Self {
            vertex_shader: &[],
            fragment_shader: &[],
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            depth_test: true,
            depth_write: true,
            depth_compare_op: vk::CompareOp::LESS_OR_EQUAL,
            alpha_blend: true,
            dynamic_polygon_mode: true,
        }
    }
}

impl GraphicsPipelineConfig<'_> {
    /// Viewport and scissor always; polygon mode only when requested.
    pub fn dynamic_states(&self) -> Vec<vk::DynamicState> {
        let mut states = vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        if self.dynamic_polygon_mode {
            states.push(vk::DynamicState::POLYGON_MODE_EXT);
        }
        states
    }

    fn rasterization(&self) -> vk::PipelineRasterizationStateCreateInfo<'static> {
        vk::PipelineRasterizationStateCreateInfo {
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: self.cull_mode,
            front_face: self.front_face,
            line_width: 1.0,
            ..Default::default()
        }
    }

    fn depth_stencil(&self) -> vk::PipelineDepthStencilStateCreateInfo<'static> {
        vk::PipelineDepthStencilStateCreateInfo {
            depth_test_enable: self.depth_test.into(),
            depth_write_enable: self.depth_write.into(),
            depth_compare_op: self.depth_compare_op,
            ..Default::default()
        }
    }

    /// Straight alpha: `src * a + dst * (1 - a)`, destination alpha discarded.
    fn blend_attachment(&self) -> vk::PipelineColorBlendAttachmentState {
        let base = vk::PipelineColorBlendAttachmentState {
            color_write_mask: vk::ColorComponentFlags::RGBA,
            ..Default::default()
        };
        if !self.alpha_blend {
            return base;
        }
        vk::PipelineColorBlendAttachmentState {
            blend_enable: vk::TRUE,
            src_color_blend_factor: vk::BlendFactor::SRC_ALPHA,
            dst_color_blend_factor: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
            color_blend_op: vk::BlendOp::ADD,
            src_alpha_blend_factor: vk::BlendFactor::ONE,
            dst_alpha_blend_factor: vk::BlendFactor::ZERO,
            alpha_blend_op: vk::BlendOp::ADD,
            ..base
        }
    }
}

/// Shader module destroyed when dropped.
struct ShaderModule<'a> {
    module: vk::ShaderModule,
    device: &'a ash::Device,
}

impl<'a> ShaderModule<'a> {
    unsafe fn new(device: &'a ash::Device, code: &[u32], stage: &str) -> Result<Self> {
        let info = vk::ShaderModuleCreateInfo::default().code(code);
        let module = device
            .create_shader_module(&info, None)
            .map_err(|e| GpuError::ShaderModule(format!("{stage}: {e}")))?;
        Ok(Self { module, device })
    }
}

impl Drop for ShaderModule<'_> {
    fn drop(&mut self) {
        unsafe { self.device.destroy_shader_module(self.module, None) };
    }
}

/// Graphics pipeline for one subpass of a render pass.
///
/// Borrows its layout; the layout owner must outlive the pipeline.
pub struct GraphicsPipeline {
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
    topology: vk::PrimitiveTopology,
    device: Arc<ash::Device>,
}

impl GraphicsPipeline {
    /// Create a graphics pipeline for subpass 0 of `render_pass`.
    ///
    /// # Safety
    /// Shader code must be valid SPIR-V matching the vertex layout and `layout`.
    pub unsafe fn new(
        device: Arc<ash::Device>,
        config: &GraphicsPipelineConfig<'_>,
        layout: vk::PipelineLayout,
        render_pass: vk::RenderPass,
    ) -> Result<Self> {
        let vert = ShaderModule::new(&device, config.vertex_shader, "vertex")?;
        let frag = ShaderModule::new(&device, config.fragment_shader, "fragment")?;

        let stage = |stage, module| {
            vk::PipelineShaderStageCreateInfo::default()
                .stage(stage)
                .module(module)
                .name(c"main")
        };
        let stages = [
            stage(vk::ShaderStageFlags::VERTEX, vert.module),
            stage(vk::ShaderStageFlags::FRAGMENT, frag.module),
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&config.vertex_bindings)
            .vertex_attribute_descriptions(&config.vertex_attributes);
        let input_assembly =
            vk::PipelineInputAssemblyStateCreateInfo::default().topology(config.topology);
        let viewport = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);
        let rasterization = config.rasterization();
        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);
        let depth_stencil = config.depth_stencil();
        let attachments = [config.blend_attachment()];
        let blend = vk::PipelineColorBlendStateCreateInfo::default().attachments(&attachments);
        let dynamic_states = config.dynamic_states();
        let dynamic = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&blend)
            .dynamic_state(&dynamic)
            .layout(layout)
            .render_pass(render_pass);

        let pipelines = device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[info], None)
            .map_err(|(_pipelines, e)| GpuError::PipelineCreation(e.to_string()))?;

        let pipeline = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| GpuError::PipelineCreation("driver returned no pipeline".to_string()))?;

        tracing::debug!("Created {:?} graphics pipeline", config.topology);

        // The shader modules borrow `device`; release them before it moves.
        drop(vert);
        drop(frag);

        Ok(Self {
            pipeline,
            layout,
            topology: config.topology,
            device,
        })
    }

    pub const fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub const fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    pub const fn topology(&self) -> vk::PrimitiveTopology {
        self.topology
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe { self.device.destroy_pipeline(self.pipeline, None) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_sprite_rendering() {
        let config = GraphicsPipelineConfig::default();
        assert_eq!(config.cull_mode, vk::CullModeFlags::NONE);
        assert_eq!(config.depth_compare_op, vk::CompareOp::LESS_OR_EQUAL);
        assert!(config.alpha_blend);
    }

    #[test]
    fn polygon_mode_is_dynamic_only_when_requested() {
        let mut config = GraphicsPipelineConfig::default();
        assert_eq!(
            config.dynamic_states(),
            vec![
                vk::DynamicState::VIEWPORT,
                vk::DynamicState::SCISSOR,
                vk::DynamicState::POLYGON_MODE_EXT
            ]
        );

        config.dynamic_polygon_mode = false;
        assert_eq!(config.dynamic_states().len(), 2);
    }

    #[test]
    fn depth_state_follows_config() {
        let config = GraphicsPipelineConfig {
            depth_write: false,
            ..GraphicsPipelineConfig::default()
        };
        let depth = config.depth_stencil();
        assert_eq!(depth.depth_test_enable, vk::TRUE);
        assert_eq!(depth.depth_write_enable, vk::FALSE);
        assert_eq!(config.rasterization().line_width, 1.0);
    }

    #[test]
    fn opaque_pipelines_skip_blending() {
        let config = GraphicsPipelineConfig {
            alpha_blend: false,
            ..GraphicsPipelineConfig::default()
        };
        assert_eq!(config.blend_attachment().blend_enable, vk::FALSE);
    }

    #[test]
    fn alpha_blend_uses_source_alpha() {
        let attachment = GraphicsPipelineConfig::default().blend_attachment();
        assert_eq!(attachment.blend_enable, vk::TRUE);
        assert_eq!(
            attachment.src_color_blend_factor,
            vk::BlendFactor::SRC_ALPHA
        );
        assert_eq!(
            attachment.dst_color_blend_factor,
            vk::BlendFactor::ONE_MINUS_SRC_ALPHA
        );
    }
}
