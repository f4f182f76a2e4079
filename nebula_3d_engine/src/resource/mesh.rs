/// Mesh resource.
///
/// A mesh bundles the GPU buffers produced by the asset-import
/// collaborator with its local-space bounds and the material pipeline
/// the main pass binds for it. Meshes live in the scene's mesh pool and
/// are referenced from nodes by handle.

use std::sync::Arc;
use bitflags::bitflags;
use crate::graphics_device::{Buffer, Pipeline};
use crate::scene::Aabb;

bitflags! {
    /// Per-mesh render flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderFlags: u32 {
        /// Drawn by the main pass
        const VISIBLE     = 1 << 0;
        /// Counts as opaque geometry for depth-only passes
        const OPAQUE      = 1 << 1;
        /// Rendered into shadow maps
        const CAST_SHADOW = 1 << 2;
    }
}

/// A renderable mesh.
pub struct Mesh {
    vertex_buffer: Arc<dyn Buffer>,
    index_buffer: Option<Arc<dyn Buffer>>,
    index_count: u32,
    vertex_count: u32,
    bounding_box: Aabb,
    material: Arc<dyn Pipeline>,
    flags: RenderFlags,
}

impl Mesh {
    /// Create a mesh over already-uploaded geometry buffers.
    ///
    /// `index_buffer`/`index_count` describe the indexed draw; a mesh
    /// without an index buffer draws `vertex_count` raw vertices.
    pub fn new(
        vertex_buffer: Arc<dyn Buffer>,
        index_buffer: Option<Arc<dyn Buffer>>,
        index_count: u32,
        vertex_count: u32,
        bounding_box: Aabb,
        material: Arc<dyn Pipeline>,
    ) -> Self {
        Self {
            vertex_buffer,
            index_buffer,
            index_count,
            vertex_count,
            bounding_box,
            material,
            flags: RenderFlags::VISIBLE | RenderFlags::OPAQUE | RenderFlags::CAST_SHADOW,
        }
    }

    /// Vertex buffer (interleaved attributes, position first).
    pub fn vertex_buffer(&self) -> &Arc<dyn Buffer> {
        &self.vertex_buffer
    }

    /// Index buffer, if the mesh is indexed.
    pub fn index_buffer(&self) -> Option<&Arc<dyn Buffer>> {
        self.index_buffer.as_ref()
    }

    /// Number of indices to draw.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Number of vertices (non-indexed draw count).
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Local-space bounding box.
    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    /// Material pipeline bound by the main pass.
    pub fn material(&self) -> &Arc<dyn Pipeline> {
        &self.material
    }

    /// Current render flags.
    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    /// Replace the render flags.
    pub fn set_flags(&mut self, flags: RenderFlags) {
        self.flags = flags;
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
