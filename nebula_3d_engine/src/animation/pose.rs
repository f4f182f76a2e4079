/// Pose — final bone matrices and their GPU buffer.
///
/// The CPU array is rewritten every animation tick; `flush` uploads it
/// to the GPU-visible buffer exactly once per tick, after all bone
/// matrices of the instance have been recomputed.

use std::sync::Arc;
use glam::Mat4;
use crate::error::Result;
use crate::graphics_device::Buffer;

/// Per-instance bone matrix array + GPU-visible buffer.
pub struct Pose {
    bone_matrices: Vec<Mat4>,
    buffer: Arc<dyn Buffer>,
}

impl Pose {
    /// Create a pose of `bone_count` identity matrices over `buffer`.
    ///
    /// The buffer must hold at least `bone_count * 64` bytes.
    pub fn new(bone_count: usize, buffer: Arc<dyn Buffer>) -> Self {
        debug_assert!(buffer.size() >= (bone_count * std::mem::size_of::<Mat4>()) as u64);
        Self {
            bone_matrices: vec![Mat4::IDENTITY; bone_count],
            buffer,
        }
    }

    /// Number of bones.
    pub fn bone_count(&self) -> usize {
        self.bone_matrices.len()
    }

    /// Current bone matrices.
    pub fn bone_matrices(&self) -> &[Mat4] {
        &self.bone_matrices
    }

    /// Overwrite the matrix of bone `index`. Out-of-range writes are
    /// ignored (a channel for a bone that no longer exists).
    pub fn set_bone_matrix(&mut self, index: usize, matrix: Mat4) {
        if let Some(slot) = self.bone_matrices.get_mut(index) {
            *slot = matrix;
        }
    }

    /// The GPU buffer the pose uploads into.
    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }

    /// Upload the CPU array to the GPU buffer.
    ///
    /// Call once per animation tick, after every bone matrix of the
    /// instance has been recomputed.
    pub fn flush(&self) -> Result<()> {
        self.buffer.update(0, bytemuck::cast_slice(&self.bone_matrices))
    }
}

#[cfg(test)]
#[path = "pose_tests.rs"]
mod tests;
