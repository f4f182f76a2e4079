/// VulkanImage - depth and shadow-map images
///
/// The frame pipeline needs two kinds of images it owns itself: the
/// shared depth buffer of the main pass and the per-frame square shadow
/// maps. Both are GPU-only depth images; shadow maps additionally carry
/// SAMPLED usage so the main pass can read them.

use nebula_3d_engine::nebula3d::{Result, Error};
use nebula_3d_engine::engine_err;
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Depth format used by the main pass depth buffer and the shadow maps.
pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// A device-local image + view owned by the renderer.
pub struct VulkanImage {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
}

impl VulkanImage {
    /// Create the main-pass depth buffer for the given extent.
    pub fn new_depth_buffer(ctx: Arc<GpuContext>, extent: vk::Extent2D) -> Result<Self> {
        Self::new_depth(ctx, extent, vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
    }

    /// Create one square shadow map of `resolution` pixels per side.
    ///
    /// Rendered as a depth attachment by the shadow pass, then sampled
    /// by the main pass.
    pub fn new_shadow_map(ctx: Arc<GpuContext>, resolution: u32) -> Result<Self> {
        Self::new_depth(
            ctx,
            vk::Extent2D { width: resolution, height: resolution },
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
        )
    }

    fn new_depth(
        ctx: Arc<GpuContext>,
        extent: vk::Extent2D,
        usage: vk::ImageUsageFlags,
    ) -> Result<Self> {
        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(DEPTH_FORMAT)
                .extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device
                .create_image(&image_create_info, None)
                .map_err(|e| engine_err!("nebula3d::vulkan",
                    "Failed to create depth image: {:?}", e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);

            let allocation = ctx.allocator.lock().unwrap().allocate(&AllocationCreateDesc {
                name: "depth image",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_) => {
                    ctx.device.destroy_image(image, None);
                    return Err(Error::OutOfMemory);
                }
            };

            if let Err(e) = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                ctx.allocator.lock().unwrap().free(allocation).ok();
                ctx.device.destroy_image(image, None);
                return Err(engine_err!("nebula3d::vulkan",
                    "Failed to bind depth image memory: {:?}", e));
            }

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(DEPTH_FORMAT)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::DEPTH,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = match ctx.device.create_image_view(&view_create_info, None) {
                Ok(view) => view,
                Err(e) => {
                    ctx.allocator.lock().unwrap().free(allocation).ok();
                    ctx.device.destroy_image(image, None);
                    return Err(engine_err!("nebula3d::vulkan",
                        "Failed to create depth image view: {:?}", e));
                }
            };

            Ok(Self {
                ctx,
                image,
                view,
                allocation: Some(allocation),
            })
        }
    }
}

impl Drop for VulkanImage {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
