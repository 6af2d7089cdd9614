//! Per-frame command buffer recording.

use ash::vk;
use spriteseer_core::PolygonMode;
use spriteseer_gpu::command::{begin_command_buffer, end_command_buffer};
use spriteseer_gpu::RenderPass;

use crate::batcher::{GeometryCounts, GeometryTarget};
use crate::error::Result;
use crate::geometry::GeometryBuffers;
use crate::sprite_pipeline::SpritePipelines;

/// Background colour behind every sprite.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Draw calls a frame needs; zero counts mean the call is skipped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawPlan {
    pub index_count: u32,
    pub line_vertex_count: u32,
}

impl DrawPlan {
    pub fn from_counts(counts: GeometryCounts) -> Self {
        Self {
            index_count: u32::try_from(counts.indices).unwrap_or(u32::MAX),
            line_vertex_count: u32::try_from(counts.line_vertices).unwrap_or(u32::MAX),
        }
    }

    pub const fn draws_quads(&self) -> bool {
        self.index_count > 0
    }

    pub const fn draws_lines(&self) -> bool {
        self.line_vertex_count > 0
    }
}

/// Clear values for the color and depth attachments, in attachment order.
pub fn clear_values() -> [vk::ClearValue; 2] {
    [
        vk::ClearValue {
            color: vk::ClearColorValue {
                float32: CLEAR_COLOR,
            },
        },
        vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
        },
    ]
}

/// Viewport covering the whole of `extent` with the full depth range.
#[allow(clippy::cast_precision_loss)]
pub fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

pub const fn vk_polygon_mode(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Fill => vk::PolygonMode::FILL,
        PolygonMode::Line => vk::PolygonMode::LINE,
    }
}

/// Everything a frame's commands refer to.
pub struct FrameRecording<'a> {
    pub device: &'a ash::Device,
    pub dynamic_state3: &'a ash::ext::extended_dynamic_state3::Device,
    pub render_pass: &'a RenderPass,
    pub pipelines: &'a SpritePipelines,
    pub geometry: &'a GeometryBuffers,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
    pub polygon_mode: PolygonMode,
}

/// Record one frame into `cmd`, which must already be reset.
///
/// # Safety
/// `cmd` must not be pending execution and every handle in `frame` must be valid.
pub unsafe fn record_frame(cmd: vk::CommandBuffer, frame: &FrameRecording<'_>) -> Result<()> {
    let device = frame.device;
    let plan = DrawPlan::from_counts(frame.geometry.counts());

    begin_command_buffer(device, cmd, vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;

    let clear_values = clear_values();
    let render_area = vk::Rect2D {
        offset: vk::Offset2D::default(),
        extent: frame.extent,
    };
    let begin_info = vk::RenderPassBeginInfo::default()
        .render_pass(frame.render_pass.handle())
        .framebuffer(frame.framebuffer)
        .render_area(render_area)
        .clear_values(&clear_values);
    device.cmd_begin_render_pass(cmd, &begin_info, vk::SubpassContents::INLINE);

    let pipelines = frame.pipelines;
    device.cmd_bind_pipeline(
        cmd,
        vk::PipelineBindPoint::GRAPHICS,
        pipelines.quads().handle(),
    );
    device.cmd_set_viewport(cmd, 0, &[full_viewport(frame.extent)]);
    device.cmd_set_scissor(cmd, 0, &[render_area]);
    frame
        .dynamic_state3
        .cmd_set_polygon_mode(cmd, vk_polygon_mode(frame.polygon_mode));
    device.cmd_bind_descriptor_sets(
        cmd,
        vk::PipelineBindPoint::GRAPHICS,
        pipelines.layout(),
        0,
        &[pipelines.descriptor_set()],
        &[],
    );

    if plan.draws_quads() {
        device.cmd_bind_vertex_buffers(cmd, 0, &[frame.geometry.quad_vertex_buffer()], &[0]);
        device.cmd_bind_index_buffer(
            cmd,
            frame.geometry.index_buffer(),
            0,
            vk::IndexType::UINT32,
        );
        device.cmd_draw_indexed(cmd, plan.index_count, 1, 0, 0, 0);
    }

    if plan.draws_lines() {
        device.cmd_bind_pipeline(
            cmd,
            vk::PipelineBindPoint::GRAPHICS,
            pipelines.lines().handle(),
        );
        device.cmd_bind_vertex_buffers(cmd, 0, &[frame.geometry.line_vertex_buffer()], &[0]);
        device.cmd_draw(cmd, plan.line_vertex_count, 1, 0, 0);
    }

    device.cmd_end_render_pass(cmd);
    end_command_buffer(device, cmd)?;

    tracing::trace!(
        "Recorded frame: {} indices, {} line vertices",
        plan.index_count,
        plan.line_vertex_count
    );
    Ok(())
}
