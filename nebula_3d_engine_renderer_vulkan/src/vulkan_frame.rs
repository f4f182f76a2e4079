/// Frame - resources owned by one in-flight frame slot
///
/// Two slots exist for the whole engine lifetime and cycle round-robin.
/// Each owns its command buffer, the acquire/present signals, the
/// completion fence, the camera/light uniform buffers and one shadow
/// map per light slot. The fence wait at the start of a slot's frame is
/// what makes rewriting these buffers safe: no GPU work referencing the
/// previous generation of the slot's data can still be outstanding.

use nebula_3d_engine::nebula3d::{Result, Error};
use nebula_3d_engine::nebula3d::graphics_device::{Buffer, BufferDesc, BufferUsage};
use nebula_3d_engine::nebula3d::MAX_LIGHTS;
use nebula_3d_engine::{engine_err, engine_error};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_texture::VulkanImage;
use crate::vulkan_uniforms::{CameraUniform, LightsUniform};

/// One in-flight frame slot.
pub struct Frame {
    ctx: Arc<GpuContext>,

    /// Command buffer re-recorded by every pass of this slot's frame
    pub(crate) command_buffer: vk::CommandBuffer,
    /// Signaled when the acquired image is ready to be rendered to
    pub(crate) image_available: vk::Semaphore,
    /// Signaled when rendering finished; presentation waits on it
    pub(crate) render_finished: vk::Semaphore,
    /// Signaled when the GPU finished this slot's submission
    pub(crate) in_flight: vk::Fence,

    /// Per-frame camera uniform buffer (binding 0)
    camera_buffer: VulkanBuffer,
    /// Per-frame light list uniform buffer (binding 1)
    lights_buffer: VulkanBuffer,
    /// One square depth image per light slot (binding 2, sampled)
    pub(crate) shadow_maps: Vec<VulkanImage>,
    /// One framebuffer per shadow map over the shadow render pass
    pub(crate) shadow_framebuffers: Vec<vk::Framebuffer>,
    /// Set 0: camera UBO + lights UBO + shadow map array
    pub(crate) descriptor_set: vk::DescriptorSet,
}

impl Frame {
    /// Build one slot's resources.
    ///
    /// `descriptor_set` must come from a pool whose layout matches the
    /// frame set layout (two uniform buffers + MAX_LIGHTS samplers).
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        command_buffer: vk::CommandBuffer,
        shadow_render_pass: vk::RenderPass,
        shadow_resolution: u32,
        descriptor_set: vk::DescriptorSet,
        shadow_sampler: vk::Sampler,
    ) -> Result<Self> {
        unsafe {
            let semaphore_create_info = vk::SemaphoreCreateInfo::default();
            let image_available = ctx.device
                .create_semaphore(&semaphore_create_info, None)
                .map_err(|e| Error::InitializationFailed(
                    format!("Failed to create image-available semaphore: {:?}", e)))?;
            let render_finished = ctx.device
                .create_semaphore(&semaphore_create_info, None)
                .map_err(|e| Error::InitializationFailed(
                    format!("Failed to create render-finished semaphore: {:?}", e)))?;

            // Created signaled so the very first frame's fence wait
            // returns immediately
            let fence_create_info = vk::FenceCreateInfo::default()
                .flags(vk::FenceCreateFlags::SIGNALED);
            let in_flight = ctx.device
                .create_fence(&fence_create_info, None)
                .map_err(|e| Error::InitializationFailed(
                    format!("Failed to create in-flight fence: {:?}", e)))?;

            let camera_buffer = VulkanBuffer::new(ctx.clone(), BufferDesc {
                size: std::mem::size_of::<CameraUniform>() as u64,
                usage: BufferUsage::Uniform,
            })?;
            let lights_buffer = VulkanBuffer::new(ctx.clone(), BufferDesc {
                size: std::mem::size_of::<LightsUniform>() as u64,
                usage: BufferUsage::Uniform,
            })?;

            let mut shadow_maps = Vec::with_capacity(MAX_LIGHTS);
            for _ in 0..MAX_LIGHTS {
                shadow_maps.push(VulkanImage::new_shadow_map(ctx.clone(), shadow_resolution)?);
            }

            // The main pass samples every shadow map slot whether or not
            // a shadow pass wrote it this frame; give the images a
            // readable layout before the first frame.
            ctx.submit_one_shot(|cmd| {
                let barriers: Vec<vk::ImageMemoryBarrier> = shadow_maps
                    .iter()
                    .map(|map| {
                        vk::ImageMemoryBarrier::default()
                            .old_layout(vk::ImageLayout::UNDEFINED)
                            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .image(map.image)
                            .subresource_range(vk::ImageSubresourceRange {
                                aspect_mask: vk::ImageAspectFlags::DEPTH,
                                base_mip_level: 0,
                                level_count: 1,
                                base_array_layer: 0,
                                layer_count: 1,
                            })
                            .src_access_mask(vk::AccessFlags::empty())
                            .dst_access_mask(vk::AccessFlags::SHADER_READ)
                    })
                    .collect();
                ctx.device.cmd_pipeline_barrier(
                    cmd,
                    vk::PipelineStageFlags::TOP_OF_PIPE,
                    vk::PipelineStageFlags::FRAGMENT_SHADER,
                    vk::DependencyFlags::empty(),
                    &[], &[], &barriers,
                );
            })?;

            let shadow_framebuffers: Vec<vk::Framebuffer> = shadow_maps
                .iter()
                .map(|map| {
                    let attachments = [map.view];
                    let framebuffer_info = vk::FramebufferCreateInfo::default()
                        .render_pass(shadow_render_pass)
                        .attachments(&attachments)
                        .width(shadow_resolution)
                        .height(shadow_resolution)
                        .layers(1);
                    ctx.device.create_framebuffer(&framebuffer_info, None)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::InitializationFailed(
                    format!("Failed to create shadow framebuffers: {:?}", e)))?;

            let frame = Self {
                ctx,
                command_buffer,
                image_available,
                render_finished,
                in_flight,
                camera_buffer,
                lights_buffer,
                shadow_maps,
                shadow_framebuffers,
                descriptor_set,
            };
            frame.write_descriptor_set(shadow_sampler);
            Ok(frame)
        }
    }

    /// Point the slot's descriptor set at its buffers and shadow maps.
    ///
    /// Done once: the resources live as long as the slot.
    fn write_descriptor_set(&self, shadow_sampler: vk::Sampler) {
        unsafe {
            let camera_info = [vk::DescriptorBufferInfo::default()
                .buffer(self.camera_buffer.buffer)
                .offset(0)
                .range(vk::WHOLE_SIZE)];
            let lights_info = [vk::DescriptorBufferInfo::default()
                .buffer(self.lights_buffer.buffer)
                .offset(0)
                .range(vk::WHOLE_SIZE)];
            let shadow_infos: Vec<vk::DescriptorImageInfo> = self.shadow_maps
                .iter()
                .map(|map| {
                    vk::DescriptorImageInfo::default()
                        .sampler(shadow_sampler)
                        .image_view(map.view)
                        .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                })
                .collect();

            let writes = [
                vk::WriteDescriptorSet::default()
                    .dst_set(self.descriptor_set)
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&camera_info),
                vk::WriteDescriptorSet::default()
                    .dst_set(self.descriptor_set)
                    .dst_binding(1)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&lights_info),
                vk::WriteDescriptorSet::default()
                    .dst_set(self.descriptor_set)
                    .dst_binding(2)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(&shadow_infos),
            ];

            self.ctx.device.update_descriptor_sets(&writes, &[]);
        }
    }

    /// Write this slot's camera uniform buffer.
    pub(crate) fn write_camera(&self, camera: &CameraUniform) -> Result<()> {
        self.camera_buffer.update(0, bytemuck::bytes_of(camera))
    }

    /// Write this slot's light-list uniform buffer.
    pub(crate) fn write_lights(&self, lights: &LightsUniform) -> Result<()> {
        self.lights_buffer.update(0, bytemuck::bytes_of(lights))
    }

    /// Block until this slot's previous submission completed.
    ///
    /// This is the CPU-side pacing point that keeps the CPU from
    /// outrunning the GPU by more than the in-flight count. Timeout is
    /// effectively unbounded; a hung GPU hangs the process.
    pub(crate) fn wait_in_flight(&self) -> Result<()> {
        unsafe {
            self.ctx.device
                .wait_for_fences(&[self.in_flight], true, u64::MAX)
                .map_err(|e| engine_err!("nebula3d::vulkan",
                    "Failed to wait for in-flight fence: {:?}", e))
        }
    }

    /// Reset the fence before resubmitting this slot.
    pub(crate) fn reset_in_flight(&self) -> Result<()> {
        unsafe {
            self.ctx.device
                .reset_fences(&[self.in_flight])
                .map_err(|e| engine_err!("nebula3d::vulkan",
                    "Failed to reset in-flight fence: {:?}", e))
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        unsafe {
            if self.ctx.device.wait_for_fences(&[self.in_flight], true, u64::MAX).is_err() {
                engine_error!("nebula3d::vulkan", "Fence wait failed during frame teardown");
            }
            for &framebuffer in &self.shadow_framebuffers {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }
            self.ctx.device.destroy_semaphore(self.image_available, None);
            self.ctx.device.destroy_semaphore(self.render_finished, None);
            self.ctx.device.destroy_fence(self.in_flight, None);
            // Command buffer and descriptor set are freed with their pools
        }
    }
}
