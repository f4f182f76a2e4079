/// VulkanPipeline - Vulkan implementation of the graphics_device
/// Pipeline trait
///
/// Pipeline-state construction is the material collaborator's job; this
/// type only carries the handles the frame pipeline binds and pushes
/// constants against, and destroys them when the material is dropped.

use nebula_3d_engine::nebula3d::graphics_device::Pipeline;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// A compiled graphics pipeline + layout handed in by the material
/// system.
pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
}

impl VulkanPipeline {
    /// Wrap raw handles. Takes ownership: both are destroyed when this
    /// value drops.
    pub fn from_raw(
        ctx: Arc<GpuContext>,
        pipeline: vk::Pipeline,
        layout: vk::PipelineLayout,
    ) -> Self {
        Self { ctx, pipeline, layout }
    }
}

impl Pipeline for VulkanPipeline {}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
