/// Light types and the per-frame light list.
///
/// Lights are pooled resources referenced by scene nodes; the frame
/// pipeline gathers them once per frame into a fixed-capacity
/// [`LightList`] (lights beyond capacity are silently dropped — this is
/// documented policy, not an error). Each shadow-casting light also
/// yields the view-projection matrix its shadow pass renders with.

use glam::{Mat4, Vec3};

/// Maximum number of lights the per-frame uniform list can hold.
///
/// Matches the shadow-map slot count per frame; lights past this are
/// dropped for the frame.
pub const MAX_LIGHTS: usize = 10;

/// Half-extent of the directional-light orthographic shadow volume.
const DIRECTIONAL_SHADOW_EXTENT: f32 = 20.0;

/// Near plane shared by all shadow projections.
const SHADOW_NEAR: f32 = 0.1;

/// Kind of light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Omnidirectional point light
    Point,
    /// Parallel rays along the node's forward axis
    Directional,
    /// Cone light with the given half-angle (radians)
    Spot {
        /// Half-angle of the cone, in radians
        half_angle: f32,
    },
}

/// A light source. Placement comes from the owning scene node.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    /// Light kind (point/directional/spot)
    pub kind: LightKind,
    /// Linear RGB color
    pub color: Vec3,
    /// Scalar intensity multiplier
    pub intensity: f32,
    /// Range of the light; doubles as the shadow far plane
    pub radius: f32,
    /// Whether a shadow pass is run for this light
    pub casts_shadows: bool,
}

impl Light {
    /// View-projection matrix for this light's shadow pass.
    ///
    /// Derived from the light kind:
    /// - point: looks straight down from the light position, 90°
    ///   vertical field of view, far plane = radius;
    /// - directional: orthographic along the node's forward axis, fixed
    ///   extent, far plane = radius;
    /// - spot: perspective with field of view = 2x the cone half-angle,
    ///   far plane = radius.
    pub fn shadow_view_projection(&self, world: &Mat4) -> Mat4 {
        let position = world.col(3).truncate();
        // Forward is the node's -Z axis, same convention as the camera.
        let forward = -world.col(2).truncate().normalize_or_zero();

        match self.kind {
            LightKind::Point => {
                let view = Mat4::look_at_rh(position, position - Vec3::Y, Vec3::NEG_Z);
                let projection = Mat4::perspective_rh(
                    std::f32::consts::FRAC_PI_2,
                    1.0,
                    SHADOW_NEAR,
                    self.radius,
                );
                projection * view
            }
            LightKind::Directional => {
                let view = Mat4::look_at_rh(position, position + forward, up_for(forward));
                let projection = Mat4::orthographic_rh(
                    -DIRECTIONAL_SHADOW_EXTENT,
                    DIRECTIONAL_SHADOW_EXTENT,
                    -DIRECTIONAL_SHADOW_EXTENT,
                    DIRECTIONAL_SHADOW_EXTENT,
                    SHADOW_NEAR,
                    self.radius,
                );
                projection * view
            }
            LightKind::Spot { half_angle } => {
                let view = Mat4::look_at_rh(position, position + forward, up_for(forward));
                let projection = Mat4::perspective_rh(
                    2.0 * half_angle,
                    1.0,
                    SHADOW_NEAR,
                    self.radius,
                );
                projection * view
            }
        }
    }
}

/// Up vector that is not collinear with `forward`.
fn up_for(forward: Vec3) -> Vec3 {
    if forward.dot(Vec3::Y).abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// A light gathered during traversal, with its world placement resolved.
#[derive(Debug, Clone, Copy)]
pub struct CollectedLight {
    /// Copy of the pooled light data
    pub light: Light,
    /// World matrix of the owning node at collection time
    pub world: Mat4,
}

impl CollectedLight {
    /// World-space position of the light.
    pub fn position(&self) -> Vec3 {
        self.world.col(3).truncate()
    }

    /// World-space forward direction of the light (-Z of the node).
    pub fn direction(&self) -> Vec3 {
        -self.world.col(2).truncate().normalize_or_zero()
    }
}

/// Fixed-capacity per-frame light list.
///
/// Holds at most [`MAX_LIGHTS`] entries; pushes past capacity are
/// dropped and counted, never an error.
pub struct LightList {
    entries: [CollectedLight; MAX_LIGHTS],
    len: usize,
    dropped: usize,
}

impl LightList {
    /// Create an empty list.
    pub fn new() -> Self {
        let empty = CollectedLight {
            light: Light {
                kind: LightKind::Point,
                color: Vec3::ZERO,
                intensity: 0.0,
                radius: 0.0,
                casts_shadows: false,
            },
            world: Mat4::IDENTITY,
        };
        Self {
            entries: [empty; MAX_LIGHTS],
            len: 0,
            dropped: 0,
        }
    }

    /// Append a light. Returns `false` (and drops it) when full.
    pub fn push(&mut self, light: CollectedLight) -> bool {
        if self.len == MAX_LIGHTS {
            self.dropped += 1;
            return false;
        }
        self.entries[self.len] = light;
        self.len += 1;
        true
    }

    /// Lights collected this frame.
    pub fn lights(&self) -> &[CollectedLight] {
        &self.entries[..self.len]
    }

    /// Number of lights in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lights dropped because the list was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Reset for the next frame.
    pub fn clear(&mut self) {
        self.len = 0;
        self.dropped = 0;
    }
}

impl Default for LightList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
