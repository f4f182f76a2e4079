/// Swapchain - presentation images and their acquire/present/rebuild
/// lifecycle
///
/// Completely separated from pass recording: the renderer asks for an
/// image, records into it, and hands it back for presentation. The only
/// retried condition in the whole frame pipeline is the out-of-date /
/// suboptimal result surfaced here, which triggers a full rebuild from
/// fresh surface capabilities.

use nebula_3d_engine::nebula3d::{Result, Error};
use nebula_3d_engine::{engine_err, engine_error};
use ash::vk;

/// Result of an image acquire.
pub(crate) enum AcquireOutcome {
    /// Image acquired; recording may proceed
    Acquired(u32),
    /// Image acquired but the surface no longer matches; rebuild after
    /// this frame
    Suboptimal(u32),
    /// No image; rebuild the swapchain and skip the frame
    OutOfDate,
}

/// Result of a present.
pub(crate) enum PresentOutcome {
    /// Presented normally
    Presented,
    /// Presented (or failed) against a stale surface; rebuild
    NeedsRebuild,
}

/// Vulkan swapchain implementation
pub struct Swapchain {
    device: ash::Device,
    physical_device: vk::PhysicalDevice,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for `surface` from current capabilities.
    pub fn new(
        device: ash::Device,
        physical_device: vk::PhysicalDevice,
        instance: &ash::Instance,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
    ) -> Result<Self> {
        unsafe {
            let surface_capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(|e| {
                    engine_error!("nebula3d::vulkan", "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;

            let surface_formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(|e| {
                    engine_error!("nebula3d::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;

            let surface_format = surface_formats
                .iter()
                .find(|f| f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB)
                .unwrap_or(&surface_formats[0]);

            let extent = surface_capabilities.current_extent;

            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(3.min(surface_capabilities.max_image_count.max(
                    surface_capabilities.min_image_count,
                )))
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(surface_capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO);

            let swapchain_loader = ash::khr::swapchain::Device::new(instance, &device);
            let swapchain = swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| {
                    engine_error!("nebula3d::vulkan", "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;

            let images = swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| {
                    engine_error!("nebula3d::vulkan", "Failed to get swapchain images: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
                })?;

            let image_views = Self::create_image_views(&device, &images, surface_format.format)?;

            Ok(Self {
                device,
                physical_device,
                surface,
                surface_loader,
                swapchain,
                swapchain_loader,
                images,
                image_views,
                format: surface_format.format,
                extent,
            })
        }
    }

    fn create_image_views(
        device: &ash::Device,
        images: &[vk::Image],
        format: vk::Format,
    ) -> Result<Vec<vk::ImageView>> {
        unsafe {
            images
                .iter()
                .map(|&image| {
                    let create_info = vk::ImageViewCreateInfo::default()
                        .image(image)
                        .view_type(vk::ImageViewType::TYPE_2D)
                        .format(format)
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: vk::ImageAspectFlags::COLOR,
                            base_mip_level: 0,
                            level_count: 1,
                            base_array_layer: 0,
                            layer_count: 1,
                        });
                    device.create_image_view(&create_info, None)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    engine_error!("nebula3d::vulkan", "Failed to create swapchain image views: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create image views: {:?}", e))
                })
        }
    }

    /// Acquire the next presentable image.
    ///
    /// `signal` is the frame slot's image-available semaphore. An
    /// out-of-date surface is a recoverable outcome, not an error.
    pub(crate) fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<AcquireOutcome> {
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                signal,
                vk::Fence::null(),
            ) {
                Ok((index, false)) => Ok(AcquireOutcome::Acquired(index)),
                Ok((index, true)) => Ok(AcquireOutcome::Suboptimal(index)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
                Err(e) => Err(engine_err!("nebula3d::vulkan",
                    "Failed to acquire next swapchain image: {:?}", e)),
            }
        }
    }

    /// Present `image_index` on `queue` after `wait` signals.
    pub(crate) fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> Result<PresentOutcome> {
        unsafe {
            let swapchains = [self.swapchain];
            let image_indices = [image_index];
            let wait_semaphores = [wait];

            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&wait_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);

            match self.swapchain_loader.queue_present(queue, &present_info) {
                Ok(false) => Ok(PresentOutcome::Presented),
                Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    Ok(PresentOutcome::NeedsRebuild)
                }
                Err(e) => Err(engine_err!("nebula3d::vulkan",
                    "Failed to present swapchain image: {:?}", e)),
            }
        }
    }

    /// Rebuild the swapchain from fresh surface capabilities.
    ///
    /// The caller must have waited for device idle and destroyed any
    /// framebuffers referencing the old image views.
    pub(crate) fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            for image_view in &self.image_views {
                self.device.destroy_image_view(*image_view, None);
            }
            self.image_views.clear();

            let surface_capabilities = self.surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| {
                    engine_error!("nebula3d::vulkan",
                        "Failed to get surface capabilities during swapchain recreate: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;

            let extent = if surface_capabilities.current_extent.width != u32::MAX {
                surface_capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: width.clamp(
                        surface_capabilities.min_image_extent.width,
                        surface_capabilities.max_image_extent.width,
                    ),
                    height: height.clamp(
                        surface_capabilities.min_image_extent.height,
                        surface_capabilities.max_image_extent.height,
                    ),
                }
            };

            let image_count = surface_capabilities.min_image_count + 1;
            let image_count = if surface_capabilities.max_image_count > 0 {
                image_count.min(surface_capabilities.max_image_count)
            } else {
                image_count
            };

            let old_swapchain = self.swapchain;
            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(self.format)
                .image_color_space(vk::ColorSpaceKHR::SRGB_NONLINEAR)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(surface_capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = self.swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| {
                    engine_error!("nebula3d::vulkan", "Failed to recreate swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to recreate swapchain: {:?}", e))
                })?;

            self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            self.swapchain = swapchain;
            self.extent = extent;

            self.images = self.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| {
                    engine_error!("nebula3d::vulkan",
                        "Failed to get swapchain images during recreate: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
                })?;

            self.image_views = Self::create_image_views(&self.device, &self.images, self.format)?;

            Ok(())
        }
    }

    /// Raw image for layout transitions.
    pub(crate) fn image(&self, index: u32) -> vk::Image {
        self.images[index as usize]
    }

    /// Image view for framebuffer creation.
    pub(crate) fn image_view(&self, index: usize) -> vk::ImageView {
        self.image_views[index]
    }

    /// Number of swapchain images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Swapchain surface format.
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Current extent in pixels.
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            // Renderer waits for device idle before dropping us
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
