/// GPU-visible uniform layouts for the per-frame buffers
///
/// These structs are written verbatim into the frame slot's uniform
/// buffers, so their layout is part of the shader contract: std140-safe
/// (every field 16-byte aligned) and `#[repr(C)]`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use nebula_3d_engine::nebula3d::{CollectedLight, LightKind, LightList, MAX_LIGHTS};

/// Per-frame camera block (binding 0).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    /// View matrix
    pub view: Mat4,
    /// Projection matrix
    pub projection: Mat4,
    /// Eye position (xyz) + elapsed seconds (w)
    pub position_time: Vec4,
}

impl CameraUniform {
    /// Build the block from camera matrices and the elapsed time.
    pub fn new(view: Mat4, projection: Mat4, elapsed: f32) -> Self {
        // Eye position is the inverse view's translation column.
        let eye = view.inverse().col(3).truncate();
        Self {
            view,
            projection,
            position_time: eye.extend(elapsed),
        }
    }
}

/// Light kind codes as seen by the shaders.
const KIND_POINT: f32 = 0.0;
const KIND_DIRECTIONAL: f32 = 1.0;
const KIND_SPOT: f32 = 2.0;

/// One light as seen by the shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLight {
    /// Shadow view-projection for sampling this light's shadow map
    pub view_projection: Mat4,
    /// World position (xyz) + kind code (w)
    pub position_kind: Vec4,
    /// World direction (xyz) + radius (w)
    pub direction_radius: Vec4,
    /// Linear color (rgb) + intensity (w)
    pub color_intensity: Vec4,
    /// cos(spot half-angle) (x), casts-shadows flag (y), zw unused
    pub params: Vec4,
}

impl GpuLight {
    /// Flatten a collected light into the shader layout.
    pub fn from_collected(collected: &CollectedLight) -> Self {
        let light = collected.light;
        let (kind, cos_half_angle) = match light.kind {
            LightKind::Point => (KIND_POINT, 0.0),
            LightKind::Directional => (KIND_DIRECTIONAL, 0.0),
            LightKind::Spot { half_angle } => (KIND_SPOT, half_angle.cos()),
        };
        Self {
            view_projection: light.shadow_view_projection(&collected.world),
            position_kind: collected.position().extend(kind),
            direction_radius: collected.direction().extend(light.radius),
            color_intensity: light.color.extend(light.intensity),
            params: Vec4::new(
                cos_half_angle,
                if light.casts_shadows { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ),
        }
    }
}

/// Per-frame light block (binding 1): fixed-size array + live count.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightsUniform {
    /// The light slots; entries past `count` are zeroed
    pub lights: [GpuLight; MAX_LIGHTS],
    /// Live light count (x), yzw padding
    pub count: [u32; 4],
}

impl LightsUniform {
    /// Flatten the frame's light list. The list is already capped at
    /// [`MAX_LIGHTS`]; overflow was dropped at collection time.
    pub fn from_list(list: &LightList) -> Self {
        let mut uniform = Self::zeroed();
        for (slot, collected) in list.lights().iter().enumerate() {
            uniform.lights[slot] = GpuLight::from_collected(collected);
        }
        uniform.count[0] = list.len() as u32;
        uniform
    }
}

#[cfg(test)]
#[path = "vulkan_uniforms_tests.rs"]
mod tests;
