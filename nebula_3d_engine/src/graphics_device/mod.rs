/// Graphics device seam - the narrow trait surface a backend implements
///
/// The core never talks to a graphics API directly. GPU-backed resources
/// (vertex/index/uniform buffers, material pipelines) are reached through
/// these traits; the Vulkan backend crate provides the concrete types.

pub mod buffer;
pub mod pipeline;

pub use buffer::*;
pub use pipeline::*;

// Mock buffer for tests (no GPU required)
#[cfg(test)]
pub mod mock_buffer;
