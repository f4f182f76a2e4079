/*!
# Nebula 3D Engine

Runtime core of the Nebula3D real-time renderer.

This crate owns everything that is not graphics-API specific: the
generational resource pool backing every reference type, the scene graph
and its traversal, frustum culling math, lights, and the skeletal
animation evaluator. GPU resources are reached through the narrow
`graphics_device` trait seam; the Vulkan backend crate implements those
traits and drives the double-buffered frame pipeline.

## Architecture

- **Pool / Handle**: index+generation slot storage; the engine's
  use-after-free defense
- **SceneGraph / Scene**: transform forest + the pools its payloads
  reference
- **Frustum / Camera**: visibility culling inputs for the main pass
- **AnimationSystem**: fixed-rate skeletal evaluation writing pose
  buffers
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod pool;
pub mod graphics_device;
pub mod camera;
pub mod light;
pub mod resource;
pub mod scene;
pub mod animation;

// Main nebula3d namespace module
pub mod nebula3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Generational pool
    pub use crate::pool::{Handle, Pool, MAX_INDEX};

    // Graphics device seam
    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    // Camera and culling
    pub mod camera {
        pub use crate::camera::*;
    }

    // Lights
    pub use crate::light::{
        CollectedLight, Light, LightKind, LightList, MAX_LIGHTS,
    };

    // Resources
    pub mod resource {
        pub use crate::resource::*;
    }

    // Scene graph
    pub mod scene {
        pub use crate::scene::*;
    }

    // Animation
    pub mod animation {
        pub use crate::animation::*;
    }
}

// Re-export math library at crate root
pub use glam;
