/// VulkanRenderer - the double-buffered, multi-pass frame pipeline
///
/// Owns the device bootstrap, the swapchain and the two in-flight frame
/// slots, and drives the per-frame sequence: collect lights, run one
/// serialized shadow depth pass per shadow-casting light, then record
/// the frustum-culled main pass and present.
///
/// Per frame slot the states cycle
/// Idle -> Acquiring -> Recording(Shadow x N) -> Recording(Main)
/// -> Submitted -> Presented -> Idle, round-robin over
/// [`MAX_FRAMES_IN_FLIGHT`] slots.

use nebula_3d_engine::nebula3d::{Result, Error};
use nebula_3d_engine::nebula3d::camera::Camera;
use nebula_3d_engine::nebula3d::graphics_device::{Buffer, BufferDesc, Pipeline};
use nebula_3d_engine::nebula3d::scene::{NodeData, Scene};
use nebula_3d_engine::nebula3d::resource::{Mesh, RenderFlags};
use nebula_3d_engine::nebula3d::{CollectedLight, LightList, MAX_LIGHTS};
use nebula_3d_engine::{engine_err, engine_info, engine_warn};
use ash::vk;
use glam::Mat4;
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use winit::window::Window;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame::Frame;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_swapchain::{AcquireOutcome, PresentOutcome, Swapchain};
use crate::vulkan_texture::{VulkanImage, DEPTH_FORMAT};
use crate::vulkan_uniforms::{CameraUniform, LightsUniform};

/// Number of frames that can be in flight concurrently.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Renderer configuration, passed by value into the constructor.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Enable the Khronos validation layer (effective only when the
    /// crate is built with the `vulkan-validation` feature)
    pub enable_validation: bool,
    /// Side length of each square shadow map, in pixels
    pub shadow_map_resolution: u32,
    /// Main pass clear color
    pub clear_color: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "Nebula3D App".to_string(),
            app_version: (0, 1, 0),
            enable_validation: false,
            shadow_map_resolution: 2048,
            clear_color: [0.02, 0.02, 0.05, 1.0],
        }
    }
}

/// The Vulkan frame pipeline.
pub struct VulkanRenderer {
    // Core Vulkan objects
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    ctx: Arc<GpuContext>,
    present_queue: vk::Queue,

    // Presentation and attachments
    swapchain: ManuallyDrop<Swapchain>,
    depth_image: ManuallyDrop<VulkanImage>,
    render_pass: vk::RenderPass,
    shadow_render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,

    // Frame-slot plumbing
    command_pool: vk::CommandPool,
    descriptor_pool: vk::DescriptorPool,
    frame_set_layout: vk::DescriptorSetLayout,
    shadow_sampler: vk::Sampler,
    frames: ManuallyDrop<Vec<Frame>>,
    current_frame: usize,

    // Shadow pass inputs
    shadow_pipeline: Option<Arc<dyn Pipeline>>,
    shadow_pipeline_warned: bool,
    shadow_map_resolution: u32,

    // Frame state
    clear_color: [f32; 4],
    start_time: Instant,
    window_width: u32,
    window_height: u32,
    framebuffer_resized: bool,
}

impl VulkanRenderer {
    /// Bootstrap the device and build all frame resources.
    ///
    /// Initialization failures are fatal and propagate to the caller;
    /// nothing here is retried.
    pub fn new(window: &Window, config: RendererConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| Error::InitializationFailed(format!("Failed to load Vulkan: {}", e)))?;

            // Instance
            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| Error::InitializationFailed(format!("Invalid app name: {}", e)))?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(
                    0,
                    config.app_version.0,
                    config.app_version.1,
                    config.app_version.2,
                ))
                .engine_name(c"Nebula3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| Error::InitializationFailed(format!("Failed to get display handle: {}", e)))?;
            let extension_names = Self::instance_extensions(display_handle.as_raw(), &config)?;
            let layer_names = Self::instance_layers(&config);

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create instance: {:?}", e)))?;

            #[cfg(feature = "vulkan-validation")]
            let (debug_utils_loader, debug_messenger) =
                Self::create_debug_messenger(&entry, &instance, &config)?;

            // Surface
            let window_handle = window.window_handle()
                .map_err(|e| Error::InitializationFailed(format!("Failed to get window handle: {}", e)))?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| Error::InitializationFailed(format!("Failed to create surface: {:?}", e)))?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Physical device
            let physical_devices = instance
                .enumerate_physical_devices()
                .map_err(|e| Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e)))?;

            let physical_device = physical_devices
                .into_iter()
                .next()
                .ok_or_else(|| Error::InitializationFailed("No Vulkan-capable GPU found".to_string()))?;

            // Queue families
            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);

            let graphics_family_index = queue_families
                .iter()
                .enumerate()
                .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(i, _)| i as u32)
                .ok_or_else(|| Error::InitializationFailed("No graphics queue family found".to_string()))?;

            let present_family_index = (0..queue_families.len() as u32)
                .find(|&i| {
                    surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
                })
                .ok_or_else(|| Error::InitializationFailed("No present queue family found".to_string()))?;

            // Logical device
            let queue_priorities = [1.0];
            let queue_create_infos = [
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family_index)
                    .queue_priorities(&queue_priorities),
            ];

            let device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create device: {:?}", e)))?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let present_queue = device.get_device_queue(present_family_index, 0);

            // Allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)))?;

            // One-shot upload pool
            let upload_pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT
                    | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let upload_command_pool = device
                .create_command_pool(&upload_pool_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e)))?;

            let ctx = Arc::new(GpuContext {
                device: device.clone(),
                allocator: ManuallyDrop::new(Arc::new(Mutex::new(allocator))),
                graphics_queue,
                graphics_queue_family: graphics_family_index,
                upload_command_pool: Mutex::new(upload_command_pool),
                instance: instance.clone(),
                #[cfg(feature = "vulkan-validation")]
                debug_utils_loader,
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
            });

            // Swapchain and attachments
            let swapchain = Swapchain::new(
                device.clone(),
                physical_device,
                &instance,
                surface,
                surface_loader,
            )?;
            let extent = swapchain.extent();

            let depth_image = VulkanImage::new_depth_buffer(ctx.clone(), extent)?;

            let render_pass = Self::create_main_render_pass(&device, swapchain.format())?;
            let shadow_render_pass = Self::create_shadow_render_pass(&device)?;

            let framebuffers = Self::create_framebuffers(
                &device, render_pass, &swapchain, depth_image.view, extent,
            )?;

            // Frame-slot command buffers
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = device
                .create_command_pool(&command_pool_create_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create command pool: {:?}", e)))?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(MAX_FRAMES_IN_FLIGHT as u32);
            let command_buffers = device
                .allocate_command_buffers(&command_buffer_allocate_info)
                .map_err(|e| Error::InitializationFailed(format!("Failed to allocate command buffers: {:?}", e)))?;

            // Set 0 layout: camera UBO + lights UBO + shadow map array
            let bindings = [
                vk::DescriptorSetLayoutBinding::default()
                    .binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(1)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(2)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .descriptor_count(MAX_LIGHTS as u32)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
            ];
            let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            let frame_set_layout = device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create frame set layout: {:?}", e)))?;

            let pool_sizes = [
                vk::DescriptorPoolSize::default()
                    .ty(vk::DescriptorType::UNIFORM_BUFFER)
                    .descriptor_count(2 * MAX_FRAMES_IN_FLIGHT as u32),
                vk::DescriptorPoolSize::default()
                    .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .descriptor_count((MAX_LIGHTS * MAX_FRAMES_IN_FLIGHT) as u32),
            ];
            let descriptor_pool_info = vk::DescriptorPoolCreateInfo::default()
                .max_sets(MAX_FRAMES_IN_FLIGHT as u32)
                .pool_sizes(&pool_sizes);
            let descriptor_pool = device
                .create_descriptor_pool(&descriptor_pool_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create descriptor pool: {:?}", e)))?;

            let set_layouts = [frame_set_layout; MAX_FRAMES_IN_FLIGHT];
            let set_allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(descriptor_pool)
                .set_layouts(&set_layouts);
            let descriptor_sets = device
                .allocate_descriptor_sets(&set_allocate_info)
                .map_err(|e| Error::InitializationFailed(format!("Failed to allocate frame descriptor sets: {:?}", e)))?;

            let sampler_info = vk::SamplerCreateInfo::default()
                .mag_filter(vk::Filter::LINEAR)
                .min_filter(vk::Filter::LINEAR)
                .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE);
            let shadow_sampler = device
                .create_sampler(&sampler_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create shadow sampler: {:?}", e)))?;

            // The two in-flight frame slots
            let mut frames = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
            for slot in 0..MAX_FRAMES_IN_FLIGHT {
                frames.push(Frame::new(
                    ctx.clone(),
                    command_buffers[slot],
                    shadow_render_pass,
                    config.shadow_map_resolution,
                    descriptor_sets[slot],
                    shadow_sampler,
                )?);
            }

            engine_info!("nebula3d::vulkan",
                "Renderer initialized: {}x{}, {} swapchain images, {} frame slots",
                extent.width, extent.height, swapchain.image_count(), MAX_FRAMES_IN_FLIGHT);

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                ctx,
                present_queue,
                swapchain: ManuallyDrop::new(swapchain),
                depth_image: ManuallyDrop::new(depth_image),
                render_pass,
                shadow_render_pass,
                framebuffers,
                command_pool,
                descriptor_pool,
                frame_set_layout,
                shadow_sampler,
                frames: ManuallyDrop::new(frames),
                current_frame: 0,
                shadow_pipeline: None,
                shadow_pipeline_warned: false,
                shadow_map_resolution: config.shadow_map_resolution,
                clear_color: config.clear_color,
                start_time: Instant::now(),
                window_width: extent.width,
                window_height: extent.height,
                framebuffer_resized: false,
            })
        }
    }

    fn instance_extensions(
        display_handle: raw_window_handle::RawDisplayHandle,
        _config: &RendererConfig,
    ) -> Result<Vec<*const std::os::raw::c_char>> {
        #[allow(unused_mut)]
        let mut extension_names = ash_window::enumerate_required_extensions(display_handle)
            .map_err(|e| Error::InitializationFailed(format!("Failed to get required extensions: {:?}", e)))?
            .to_vec();
        #[cfg(feature = "vulkan-validation")]
        if _config.enable_validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        }
        Ok(extension_names)
    }

    fn instance_layers(_config: &RendererConfig) -> Vec<*const std::os::raw::c_char> {
        #[cfg(feature = "vulkan-validation")]
        if _config.enable_validation {
            return vec![c"VK_LAYER_KHRONOS_validation".as_ptr()];
        }
        vec![]
    }

    #[cfg(feature = "vulkan-validation")]
    #[allow(clippy::type_complexity)]
    fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
        config: &RendererConfig,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        if !config.enable_validation {
            return Ok((None, None));
        }
        unsafe {
            let loader = ash::ext::debug_utils::Instance::new(entry, instance);
            let messenger = loader
                .create_debug_utils_messenger(&crate::vulkan_debug::messenger_create_info(), None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e)))?;
            Ok((Some(loader), Some(messenger)))
        }
    }

    /// Main pass: one color attachment (cleared, kept in attachment
    /// layout for the explicit present transition) + shared depth.
    fn create_main_render_pass(device: &ash::Device, format: vk::Format) -> Result<vk::RenderPass> {
        unsafe {
            let attachments = [
                vk::AttachmentDescription::default()
                    .format(format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
                vk::AttachmentDescription::default()
                    .format(DEPTH_FORMAT)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
            ];

            let color_attachment_ref = vk::AttachmentReference::default()
                .attachment(0)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
            let depth_attachment_ref = vk::AttachmentReference::default()
                .attachment(1)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

            let subpass = vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(std::slice::from_ref(&color_attachment_ref))
                .depth_stencil_attachment(&depth_attachment_ref);

            let dependency = vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
                .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE);

            let render_pass_info = vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(std::slice::from_ref(&subpass))
                .dependencies(std::slice::from_ref(&dependency));

            device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create render pass: {:?}", e)))
        }
    }

    /// Shadow pass: depth-only, leaving the map shader-readable for the
    /// main pass that samples it.
    fn create_shadow_render_pass(device: &ash::Device) -> Result<vk::RenderPass> {
        unsafe {
            let attachment = vk::AttachmentDescription::default()
                .format(DEPTH_FORMAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);

            let depth_attachment_ref = vk::AttachmentReference::default()
                .attachment(0)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

            let subpass = vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .depth_stencil_attachment(&depth_attachment_ref);

            let dependencies = [
                vk::SubpassDependency::default()
                    .src_subpass(vk::SUBPASS_EXTERNAL)
                    .dst_subpass(0)
                    .src_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                    .src_access_mask(vk::AccessFlags::SHADER_READ)
                    .dst_stage_mask(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
                    .dst_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE),
                vk::SubpassDependency::default()
                    .src_subpass(0)
                    .dst_subpass(vk::SUBPASS_EXTERNAL)
                    .src_stage_mask(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS)
                    .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
                    .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                    .dst_access_mask(vk::AccessFlags::SHADER_READ),
            ];

            let render_pass_info = vk::RenderPassCreateInfo::default()
                .attachments(std::slice::from_ref(&attachment))
                .subpasses(std::slice::from_ref(&subpass))
                .dependencies(&dependencies);

            device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| Error::InitializationFailed(format!("Failed to create shadow render pass: {:?}", e)))
        }
    }

    fn create_framebuffers(
        device: &ash::Device,
        render_pass: vk::RenderPass,
        swapchain: &Swapchain,
        depth_view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> Result<Vec<vk::Framebuffer>> {
        unsafe {
            (0..swapchain.image_count())
                .map(|index| {
                    let attachments = [swapchain.image_view(index), depth_view];
                    let framebuffer_info = vk::FramebufferCreateInfo::default()
                        .render_pass(render_pass)
                        .attachments(&attachments)
                        .width(extent.width)
                        .height(extent.height)
                        .layers(1);
                    device.create_framebuffer(&framebuffer_info, None)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::InitializationFailed(format!("Failed to create framebuffers: {:?}", e)))
        }
    }

    // ===== PUBLIC SURFACE =====

    /// Shared GPU context, for resource creation by collaborators.
    pub fn ctx(&self) -> Arc<GpuContext> {
        self.ctx.clone()
    }

    /// Physical device, for collaborators querying limits and formats.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Create a GPU buffer usable by scene resources.
    pub fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(VulkanBuffer::new(self.ctx.clone(), desc)?))
    }

    /// Set 0 layout every material pipeline must build against.
    pub fn frame_set_layout(&self) -> vk::DescriptorSetLayout {
        self.frame_set_layout
    }

    /// Render pass material pipelines must target.
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Render pass the depth-only shadow pipeline must target.
    pub fn shadow_render_pass(&self) -> vk::RenderPass {
        self.shadow_render_pass
    }

    /// Install the depth-only pipeline used by every shadow pass
    /// (position-only vertex stream, no material bindings).
    pub fn set_shadow_pipeline(&mut self, pipeline: Arc<dyn Pipeline>) {
        self.shadow_pipeline = Some(pipeline);
    }

    /// Note a window resize; the swapchain is rebuilt on the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.window_width = width;
            self.window_height = height;
            self.framebuffer_resized = true;
        }
    }

    /// Block until all GPU work completed. Required before teardown.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx.device
                .device_wait_idle()
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to wait idle: {:?}", e))
        }
    }

    // ===== FRAME PIPELINE =====

    /// Render one frame of `scene` from `camera`.
    ///
    /// Sequence: collect lights (capacity-capped), one serialized
    /// shadow pass per shadow-casting light, then the culled main pass,
    /// uniform writes, submit and present. A stale swapchain rebuilds
    /// and skips the frame; any other failure drops the frame — the
    /// caller logs and continues.
    pub fn try_render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        if self.framebuffer_resized {
            self.framebuffer_resized = false;
            self.recreate_swapchain()?;
            return Ok(());
        }

        let elapsed = self.start_time.elapsed().as_secs_f32();

        // Traversal #1: gather lights into the fixed-capacity list.
        // Lights beyond capacity were dropped at collection time.
        let mut lights = LightList::new();
        scene.collect_lights(&mut lights);

        // Shadow passes, one per shadow-casting collected light, fully
        // serialized: each records the slot's command buffer, submits
        // it synchronously and waits for device idle before the next.
        let shadow_casters: Vec<(usize, CollectedLight)> = lights
            .lights()
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, collected)| collected.light.casts_shadows)
            .collect();

        if !shadow_casters.is_empty() {
            if self.shadow_pipeline.is_some() {
                // The slot's command buffer may still be pending from
                // its previous frame; the fence bounds the re-record.
                self.frames[self.current_frame].wait_in_flight()?;
                for (slot, collected) in &shadow_casters {
                    self.record_and_submit_shadow_pass(scene, *slot, collected)?;
                }
            } else if !self.shadow_pipeline_warned {
                engine_warn!("nebula3d::vulkan",
                    "{} shadow-casting lights but no shadow pipeline installed; shadows disabled",
                    shadow_casters.len());
                self.shadow_pipeline_warned = true;
            }
        }

        // Main pass
        let image_index = match self.begin_frame()? {
            Some(index) => index,
            None => {
                // Out-of-date at acquire: rebuild and skip this frame
                self.recreate_swapchain()?;
                return Ok(());
            }
        };

        self.draw_main_pass(scene, camera);

        // Per-slot uniforms; the fence wait in begin_frame guarantees
        // the GPU no longer reads the previous generation.
        let frame = &self.frames[self.current_frame];
        frame.write_camera(&CameraUniform::new(
            *camera.view_matrix(),
            *camera.projection_matrix(),
            elapsed,
        ))?;
        frame.write_lights(&LightsUniform::from_list(&lights))?;

        let needs_rebuild = self.end_frame(image_index)?;
        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        if needs_rebuild {
            self.recreate_swapchain()?;
        }
        Ok(())
    }

    /// Begin the main pass: fence wait, image acquire, command buffer
    /// reset, layout transition, render pass begin, negated viewport.
    ///
    /// Returns `None` when the swapchain is out of date (caller
    /// rebuilds and skips the frame).
    fn begin_frame(&mut self) -> Result<Option<u32>> {
        let frame = &self.frames[self.current_frame];
        frame.wait_in_flight()?;

        let image_index = match self.swapchain.acquire_next_image(frame.image_available)? {
            AcquireOutcome::Acquired(index) => index,
            AcquireOutcome::Suboptimal(index) => {
                // Usable image; render it, present will flag the rebuild
                index
            }
            AcquireOutcome::OutOfDate => return Ok(None),
        };

        // The fence is NOT reset here: it stays signaled until just
        // before the submit in end_frame, so a frame dropped partway
        // (failed acquire, recording error) cannot deadlock the next
        // frame's fence wait.

        unsafe {
            let device = &self.ctx.device;
            let cmd = frame.command_buffer;

            device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(cmd, &begin_info)
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to begin command buffer: {:?}", e))?;

            // Transition the target image to a drawable layout
            let to_drawable = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(self.swapchain.image(image_index))
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::DependencyFlags::empty(),
                &[], &[], &[to_drawable],
            );

            let extent = self.swapchain.extent();
            let clear_values = [
                vk::ClearValue {
                    color: vk::ClearColorValue { float32: self.clear_color },
                },
                vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
                },
            ];

            let render_pass_info = vk::RenderPassBeginInfo::default()
                .render_pass(self.render_pass)
                .framebuffer(self.framebuffers[image_index as usize])
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent,
                })
                .clear_values(&clear_values);

            device.cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE);

            // Negative-height viewport: the API's top-down clip space is
            // converted to the engine's Y-up convention here and ONLY
            // here. Every matrix in the system assumes Y-up.
            let viewport = vk::Viewport::default()
                .x(0.0)
                .y(extent.height as f32)
                .width(extent.width as f32)
                .height(-(extent.height as f32))
                .min_depth(0.0)
                .max_depth(1.0);
            device.cmd_set_viewport(cmd, 0, &[viewport]);

            let scissor = vk::Rect2D::default()
                .offset(vk::Offset2D { x: 0, y: 0 })
                .extent(extent);
            device.cmd_set_scissor(cmd, 0, &[scissor]);
        }

        Ok(Some(image_index))
    }

    /// Traversal #2: frustum-cull mesh nodes and record their draws.
    ///
    /// A culled node's children keep traversing (a large parent can be
    /// off-screen while a child is visible); stale mesh handles skip
    /// the node for this frame.
    fn draw_main_pass(&self, scene: &Scene, camera: &Camera) {
        let frame = &self.frames[self.current_frame];
        let cmd = frame.command_buffer;
        let frustum = camera.frustum();

        scene.graph.traverse(|_, node, world| {
            let mesh_handle = match &node.data {
                NodeData::StaticMesh(handle) => Some(*handle),
                NodeData::SkeletalMesh(instance) => Some(instance.mesh),
                NodeData::Empty | NodeData::Light(_) => None,
            };

            if let Some(handle) = mesh_handle {
                if let Some(mesh) = scene.meshes.get(handle) {
                    if mesh.flags().contains(RenderFlags::VISIBLE) {
                        let world_aabb = mesh.bounding_box().transformed(world);
                        if frustum.intersects_aabb(&world_aabb) {
                            self.draw_mesh(cmd, frame.descriptor_set, mesh, world);
                        }
                    }
                }
            }
            true
        });
    }

    /// Bind the mesh's material pipeline, push its world matrix and
    /// issue the draw.
    fn draw_mesh(
        &self,
        cmd: vk::CommandBuffer,
        descriptor_set: vk::DescriptorSet,
        mesh: &Mesh,
        world: &Mat4,
    ) {
        unsafe {
            let device = &self.ctx.device;

            // Downcast to the Vulkan pipeline implementation
            let pipeline = mesh.material().as_ref() as *const dyn Pipeline as *const VulkanPipeline;
            let pipeline = &*pipeline;

            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline.pipeline);
            device.cmd_bind_descriptor_sets(
                cmd,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.layout,
                0,
                &[descriptor_set],
                &[],
            );
            device.cmd_push_constants(
                cmd,
                pipeline.layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::bytes_of(world),
            );

            let vertex_buffer = mesh.vertex_buffer().as_ref() as *const dyn Buffer as *const VulkanBuffer;
            let vertex_buffer = &*vertex_buffer;
            device.cmd_bind_vertex_buffers(cmd, 0, &[vertex_buffer.buffer], &[0]);

            match mesh.index_buffer() {
                Some(index_buffer) => {
                    let index_buffer = index_buffer.as_ref() as *const dyn Buffer as *const VulkanBuffer;
                    let index_buffer = &*index_buffer;
                    device.cmd_bind_index_buffer(cmd, index_buffer.buffer, 0, vk::IndexType::UINT32);
                    device.cmd_draw_indexed(cmd, mesh.index_count(), 1, 0, 0, 0);
                }
                None => {
                    device.cmd_draw(cmd, mesh.vertex_count(), 1, 0, 0);
                }
            }
        }
    }

    /// One shadow sub-pass: re-record the slot's command buffer with a
    /// depth-only pass over slot `slot`'s shadow map, submit it
    /// synchronously, and wait for device idle.
    ///
    /// The idle wait fully serializes shadow-map production against
    /// everything else on the GPU: simple, and it guarantees the map is
    /// shader-readable before the main pass that samples it is even
    /// recorded.
    fn record_and_submit_shadow_pass(
        &self,
        scene: &Scene,
        slot: usize,
        collected: &CollectedLight,
    ) -> Result<()> {
        let frame = &self.frames[self.current_frame];
        let shadow_pipeline = self.shadow_pipeline.as_ref()
            .ok_or_else(|| Error::InvalidResource("No shadow pipeline installed".to_string()))?;

        let light_vp = collected.light.shadow_view_projection(&collected.world);

        unsafe {
            let device = &self.ctx.device;
            let cmd = frame.command_buffer;

            device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to reset shadow command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(cmd, &begin_info)
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to begin shadow command buffer: {:?}", e))?;

            let clear_values = [vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            }];
            let resolution = self.shadow_map_resolution;
            let render_pass_info = vk::RenderPassBeginInfo::default()
                .render_pass(self.shadow_render_pass)
                .framebuffer(frame.shadow_framebuffers[slot])
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent: vk::Extent2D { width: resolution, height: resolution },
                })
                .clear_values(&clear_values);

            device.cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE);

            let viewport = vk::Viewport::default()
                .x(0.0)
                .y(0.0)
                .width(resolution as f32)
                .height(resolution as f32)
                .min_depth(0.0)
                .max_depth(1.0);
            device.cmd_set_viewport(cmd, 0, &[viewport]);
            let scissor = vk::Rect2D::default()
                .offset(vk::Offset2D { x: 0, y: 0 })
                .extent(vk::Extent2D { width: resolution, height: resolution });
            device.cmd_set_scissor(cmd, 0, &[scissor]);

            let pipeline = shadow_pipeline.as_ref() as *const dyn Pipeline as *const VulkanPipeline;
            let pipeline = &*pipeline;
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline.pipeline);

            // Opaque shadow-casting geometry only; position-only vertex
            // stream, no material bindings
            scene.graph.traverse(|_, node, world| {
                let mesh_handle = match &node.data {
                    NodeData::StaticMesh(handle) => Some(*handle),
                    NodeData::SkeletalMesh(instance) => Some(instance.mesh),
                    NodeData::Empty | NodeData::Light(_) => None,
                };
                if let Some(handle) = mesh_handle {
                    if let Some(mesh) = scene.meshes.get(handle) {
                        let flags = mesh.flags();
                        if flags.contains(RenderFlags::OPAQUE | RenderFlags::CAST_SHADOW) {
                            self.draw_shadow_mesh(cmd, pipeline, mesh, &(light_vp * *world));
                        }
                    }
                }
                true
            });

            device.cmd_end_render_pass(cmd);
            device
                .end_command_buffer(cmd)
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to end shadow command buffer: {:?}", e))?;

            // Synchronous submit: no semaphores, no fence, just a full
            // device idle before the next pass touches this buffer
            let command_buffers = [cmd];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to submit shadow pass: {:?}", e))?;
            device
                .device_wait_idle()
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to wait idle after shadow pass: {:?}", e))?;
        }

        Ok(())
    }

    /// Record one mesh into the shadow pass with the light's
    /// view-projection folded into the per-draw constant.
    fn draw_shadow_mesh(
        &self,
        cmd: vk::CommandBuffer,
        pipeline: &VulkanPipeline,
        mesh: &Mesh,
        light_mvp: &Mat4,
    ) {
        unsafe {
            let device = &self.ctx.device;
            device.cmd_push_constants(
                cmd,
                pipeline.layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::bytes_of(light_mvp),
            );

            let vertex_buffer = mesh.vertex_buffer().as_ref() as *const dyn Buffer as *const VulkanBuffer;
            let vertex_buffer = &*vertex_buffer;
            device.cmd_bind_vertex_buffers(cmd, 0, &[vertex_buffer.buffer], &[0]);

            match mesh.index_buffer() {
                Some(index_buffer) => {
                    let index_buffer = index_buffer.as_ref() as *const dyn Buffer as *const VulkanBuffer;
                    let index_buffer = &*index_buffer;
                    device.cmd_bind_index_buffer(cmd, index_buffer.buffer, 0, vk::IndexType::UINT32);
                    device.cmd_draw_indexed(cmd, mesh.index_count(), 1, 0, 0, 0);
                }
                None => {
                    device.cmd_draw(cmd, mesh.vertex_count(), 1, 0, 0);
                }
            }
        }
    }

    /// Close the main pass, transition to presentable layout, submit
    /// with acquire/finish semaphores and the slot fence, and present.
    ///
    /// Returns whether the swapchain must be rebuilt.
    fn end_frame(&mut self, image_index: u32) -> Result<bool> {
        let frame = &self.frames[self.current_frame];

        unsafe {
            let device = &self.ctx.device;
            let cmd = frame.command_buffer;

            device.cmd_end_render_pass(cmd);

            // Transition the image to a presentable layout
            let to_present = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(self.swapchain.image(image_index))
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_access_mask(vk::AccessFlags::empty());
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::DependencyFlags::empty(),
                &[], &[], &[to_present],
            );

            device
                .end_command_buffer(cmd)
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to end command buffer: {:?}", e))?;

            // Wait for the acquired image, signal render-finished for
            // presentation, and the slot fence for CPU pacing
            let wait_semaphores = [frame.image_available];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let signal_semaphores = [frame.render_finished];
            let command_buffers = [cmd];

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            // Last possible moment to reset: everything before this
            // point degrades to a dropped frame with the fence still
            // signaled
            frame.reset_in_flight()?;
            device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], frame.in_flight)
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to submit queue: {:?}", e))?;
        }

        match self.swapchain.present(self.present_queue, image_index, frame.render_finished)? {
            PresentOutcome::Presented => Ok(false),
            PresentOutcome::NeedsRebuild => Ok(true),
        }
    }

    /// Full swapchain rebuild: wait idle, drop swapchain-dependent
    /// images/views, rebuild from fresh surface capabilities.
    fn recreate_swapchain(&mut self) -> Result<()> {
        unsafe {
            self.ctx.device
                .device_wait_idle()
                .map_err(|e| engine_err!("nebula3d::vulkan", "Failed to wait idle before swapchain recreate: {:?}", e))?;

            for framebuffer in self.framebuffers.drain(..) {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }

            self.swapchain.recreate(self.window_width, self.window_height)?;
            let extent = self.swapchain.extent();

            // Depth buffer matches the new extent
            let new_depth = VulkanImage::new_depth_buffer(self.ctx.clone(), extent)?;
            let old_depth = std::mem::replace(&mut *self.depth_image, new_depth);
            drop(old_depth);

            self.framebuffers = Self::create_framebuffers(
                &self.ctx.device,
                self.render_pass,
                &self.swapchain,
                self.depth_image.view,
                extent,
            )?;

            engine_info!("nebula3d::vulkan",
                "Swapchain recreated: {}x{}", extent.width, extent.height);
        }
        Ok(())
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        unsafe {
            // All GPU work must be idle before teardown
            self.ctx.device.device_wait_idle().ok();

            // Frame slots first: they own per-frame buffers and shadow
            // maps whose allocations go back through the allocator
            ManuallyDrop::drop(&mut self.frames);

            self.ctx.device.destroy_sampler(self.shadow_sampler, None);
            self.ctx.device.destroy_descriptor_pool(self.descriptor_pool, None);
            self.ctx.device.destroy_descriptor_set_layout(self.frame_set_layout, None);

            for &framebuffer in &self.framebuffers {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }
            self.ctx.device.destroy_render_pass(self.render_pass, None);
            self.ctx.device.destroy_render_pass(self.shadow_render_pass, None);

            ManuallyDrop::drop(&mut self.depth_image);

            self.ctx.device.destroy_command_pool(self.command_pool, None);
            if let Ok(pool) = self.ctx.upload_command_pool.lock() {
                self.ctx.device.destroy_command_pool(*pool, None);
            }

            // Swapchain drop also destroys the surface
            ManuallyDrop::drop(&mut self.swapchain);

            #[cfg(feature = "vulkan-validation")]
            if let (Some(loader), Some(messenger)) =
                (&self.ctx.debug_utils_loader, self.ctx.debug_messenger)
            {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            // NOTE: the allocator Arc inside GpuContext is intentionally
            // never released (ManuallyDrop); outstanding resource Arcs
            // held by the application would otherwise free against a
            // destroyed device. Remaining GPU memory is reclaimed by the
            // process exit.
            self.ctx.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
