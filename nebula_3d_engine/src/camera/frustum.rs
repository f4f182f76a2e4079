/// Frustum — six clipping half-spaces for visibility culling.
///
/// Each plane is a Vec4 (A, B, C, D) with the normal (A, B, C) pointing
/// inward; a point P is inside when dot(plane, (P, 1)) >= 0 for all six
/// planes. Works for both perspective and orthographic projections.

use glam::{Mat4, Vec3, Vec4};
use crate::scene::Aabb;

/// Frustum plane indices: left, right, bottom, top, near, far.
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six half-space planes bounding a view volume.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Planes in [`PLANE_LEFT`]..[`PLANE_FAR`] order, unit normals
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the six planes from a combined view-projection matrix.
    ///
    /// Standard clip-space plane extraction (Gribb & Hartmann): each
    /// plane is a sum or difference of the last matrix row with one of
    /// the first three. Planes are normalized so distance tests are
    /// metric.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let r0 = vp.row(0);
        let r1 = vp.row(1);
        let r2 = vp.row(2);
        let r3 = vp.row(3);

        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r3 + r2, // near
            r3 - r2, // far
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    /// Test an AABB against the frustum.
    ///
    /// Positive-vertex test: for each plane, pick the AABB corner most
    /// along the plane normal; the box is outside as soon as that
    /// corner is on the negative side of any plane. Conservative — a
    /// straddling box is always kept, and false positives are possible
    /// near edges, but never false negatives.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();
            let positive_vertex = Vec3::select(
                normal.cmpge(Vec3::ZERO),
                aabb.max,
                aabb.min,
            );
            if normal.dot(positive_vertex) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
