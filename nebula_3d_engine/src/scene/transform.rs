/// Transform — local TRS of a scene node.
///
/// Composes into a 4x4 local matrix. World matrices are never cached on
/// the node; they are recomputed during traversal from the parent chain,
/// so a transform edit is visible the next frame with no invalidation
/// bookkeeping.

use glam::{Mat4, Quat, Vec3};

/// Position, rotation and scale of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation relative to the parent
    pub position: Vec3,
    /// Rotation relative to the parent (unit quaternion)
    pub rotation: Quat,
    /// Per-axis scale relative to the parent
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform (no translation, no rotation, scale 1).
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Transform at `position` with identity rotation and unit scale.
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    /// Compose this transform into a local matrix (scale, then rotate,
    /// then translate).
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
