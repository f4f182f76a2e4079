//! Unit tests for the per-frame uniform layouts
//!
//! These layouts are a shader contract; the size/offset assertions are
//! the compile-side half of that contract.

use glam::{Mat4, Vec3};
use nebula_3d_engine::nebula3d::{CollectedLight, Light, LightKind, LightList, MAX_LIGHTS};
use super::*;

fn collected(kind: LightKind, casts_shadows: bool) -> CollectedLight {
    CollectedLight {
        light: Light {
            kind,
            color: Vec3::new(1.0, 0.5, 0.25),
            intensity: 3.0,
            radius: 12.0,
            casts_shadows,
        },
        world: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
    }
}

// ============================================================================
// Layout contract
// ============================================================================

#[test]
fn test_uniform_sizes_match_std140_layout() {
    assert_eq!(std::mem::size_of::<CameraUniform>(), 144);
    assert_eq!(std::mem::size_of::<GpuLight>(), 128);
    assert_eq!(
        std::mem::size_of::<LightsUniform>(),
        128 * MAX_LIGHTS + 16
    );
}

#[test]
fn test_camera_uniform_extracts_eye_position() {
    let eye = Vec3::new(0.0, 3.0, 8.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let uniform = CameraUniform::new(view, Mat4::IDENTITY, 1.5);

    assert!((uniform.position_time.truncate() - eye).length() < 1e-4);
    assert_eq!(uniform.position_time.w, 1.5);
}

// ============================================================================
// Light flattening
// ============================================================================

#[test]
fn test_gpu_light_encodes_kind_codes() {
    assert_eq!(GpuLight::from_collected(&collected(LightKind::Point, false)).position_kind.w, 0.0);
    assert_eq!(GpuLight::from_collected(&collected(LightKind::Directional, false)).position_kind.w, 1.0);
    let spot = GpuLight::from_collected(&collected(LightKind::Spot { half_angle: 0.5 }, false));
    assert_eq!(spot.position_kind.w, 2.0);
    assert!((spot.params.x - 0.5f32.cos()).abs() < 1e-6);
}

#[test]
fn test_gpu_light_carries_placement_and_shadow_flag() {
    let light = GpuLight::from_collected(&collected(LightKind::Point, true));
    assert!((light.position_kind.truncate() - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
    assert_eq!(light.direction_radius.w, 12.0);
    assert_eq!(light.color_intensity.w, 3.0);
    assert_eq!(light.params.y, 1.0);
}

#[test]
fn test_lights_uniform_zeroes_unused_slots() {
    let mut list = LightList::new();
    list.push(collected(LightKind::Point, false));
    list.push(collected(LightKind::Directional, true));

    let uniform = LightsUniform::from_list(&list);
    assert_eq!(uniform.count[0], 2);
    // Slot 2 onward stays zeroed
    assert_eq!(uniform.lights[2].color_intensity.w, 0.0);
    assert_eq!(uniform.lights[MAX_LIGHTS - 1].position_kind.w, 0.0);
}

#[test]
fn test_lights_uniform_fills_all_slots_when_full() {
    let mut list = LightList::new();
    for _ in 0..12 {
        list.push(collected(LightKind::Point, false));
    }
    let uniform = LightsUniform::from_list(&list);
    assert_eq!(uniform.count[0], MAX_LIGHTS as u32);
    assert_eq!(uniform.lights[MAX_LIGHTS - 1].color_intensity.w, 3.0);
}
