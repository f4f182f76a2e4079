/// GpuContext - Shared GPU resources for all Vulkan objects
///
/// Contains everything needed for GPU operations:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Queue for command submission
/// - Command pool for one-shot upload/transition operations
///
/// The context is created once by the renderer bootstrap and injected
/// (via `Arc`) into every resource that needs the device; nothing in
/// this crate reaches the device through a global.

use nebula_3d_engine::nebula3d::Result;
use nebula_3d_engine::engine_err;
use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

/// Shared GPU context for all Vulkan resources.
///
/// Shared (via `Arc`) by textures, buffers and frames to avoid
/// duplicating device/allocator/queue references in each resource.
///
/// Note: Device and instance destruction is handled by
/// VulkanRenderer::drop() to avoid drop-ordering issues; this struct's
/// Drop intentionally does nothing.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety).
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device.
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Reusable command pool for one-shot operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub upload_command_pool: Mutex<vk::CommandPool>,

    /// Vulkan instance (kept for reference, destroyed by VulkanRenderer)
    #[allow(dead_code)]
    pub(crate) instance: ash::Instance,

    /// Debug utils loader (validation builds only)
    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    /// Debug messenger handle (validation builds only)
    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    /// Record and synchronously submit a one-shot command buffer.
    ///
    /// Used for initialization-time work (image layout transitions);
    /// blocks until the GPU has executed the commands.
    pub fn submit_one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        unsafe {
            let pool = *self.upload_command_pool.lock().unwrap();
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self.device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!("nebula3d::vulkan",
                    "Failed to allocate one-shot command buffer: {:?}", e))?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("nebula3d::vulkan",
                    "Failed to begin one-shot command buffer: {:?}", e))?;

            record(command_buffer);

            self.device
                .end_command_buffer(command_buffer)
                .map_err(|e| engine_err!("nebula3d::vulkan",
                    "Failed to end one-shot command buffer: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            self.device
                .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("nebula3d::vulkan",
                    "Failed to submit one-shot command buffer: {:?}", e))?;
            self.device
                .queue_wait_idle(self.graphics_queue)
                .map_err(|e| engine_err!("nebula3d::vulkan",
                    "Failed to wait for one-shot submission: {:?}", e))?;

            self.device.free_command_buffers(pool, &command_buffers);
            Ok(())
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        // NOTE: Device and instance destruction is handled by
        // VulkanRenderer::drop() to avoid drop-ordering issues. This
        // Drop impl intentionally does nothing.
    }
}
