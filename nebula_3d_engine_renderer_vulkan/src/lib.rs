/*!
# Nebula 3D Engine - Vulkan Renderer Backend

Vulkan implementation of the Nebula3D frame pipeline, built on the Ash
bindings and gpu-allocator for memory management.

This crate owns the device bootstrap, the swapchain, the two in-flight
frame slots and the per-frame passes (N shadow depth passes followed by
the lit, frustum-culled main pass). It implements the core crate's
`graphics_device` traits so scene resources can reference GPU buffers
and pipelines without knowing about Vulkan.
*/

// Vulkan implementation modules
mod vulkan_context;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_pipeline;
mod vulkan_swapchain;
mod vulkan_uniforms;
mod vulkan_frame;
mod vulkan_renderer;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub use vulkan_context::GpuContext;
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_texture::VulkanImage;
pub use vulkan_pipeline::VulkanPipeline;
pub use vulkan_uniforms::{CameraUniform, GpuLight, LightsUniform};
pub use vulkan_renderer::{RendererConfig, VulkanRenderer, MAX_FRAMES_IN_FLIGHT};
