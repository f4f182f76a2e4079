/// Camera — passive view/projection container.
///
/// The camera computes nothing on its own: the caller (game/update
/// logic) sets the view and projection matrices from whatever high-level
/// parameters it keeps. The engine only reads them. All matrices are
/// Y-up; the single conversion to the presentation API's convention is
/// the negated viewport in the frame pipeline.

use glam::Mat4;
use super::frustum::Frustum;

/// A camera: view + projection, set by the caller.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    /// Create a camera from explicit matrices.
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// Projection matrix (perspective or orthographic, 0..1 depth).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Frustum extracted from the current view-projection.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    /// Set the view matrix.
    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    /// Set the projection matrix.
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
