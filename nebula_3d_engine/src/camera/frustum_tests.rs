use glam::{Mat4, Vec3};
use crate::scene::Aabb;
use super::*;

fn camera_frustum(fov: f32, far: f32) -> Frustum {
    let projection = Mat4::perspective_rh(fov, 1.0, 0.1, far);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    Frustum::from_view_projection(&(projection * view))
}

// ============================================================================
// Plane extraction
// ============================================================================

#[test]
fn test_extracted_planes_are_normalized() {
    let frustum = camera_frustum(std::f32::consts::FRAC_PI_4, 100.0);
    for plane in &frustum.planes {
        let normal_len = plane.truncate().length();
        assert!((normal_len - 1.0).abs() < 1e-4, "plane normal should be unit length");
    }
}

#[test]
fn test_orthographic_extraction_is_supported() {
    let projection = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 100.0);
    let frustum = Frustum::from_view_projection(&projection);
    for plane in &frustum.planes {
        let normal_len = plane.truncate().length();
        assert!((normal_len - 1.0).abs() < 1e-4);
    }
}

#[test]
fn test_plane_order_constants() {
    assert_eq!(
        [PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR],
        [0, 1, 2, 3, 4, 5]
    );
}

// ============================================================================
// AABB tests: inside / outside / straddling
// ============================================================================

#[test]
fn test_box_fully_inside_is_never_culled() {
    let frustum = camera_frustum(std::f32::consts::FRAC_PI_2, 100.0);
    let aabb = Aabb {
        min: Vec3::splat(-1.0),
        max: Vec3::splat(1.0),
    };
    assert!(frustum.intersects_aabb(&aabb));
}

#[test]
fn test_box_outside_one_plane_is_always_culled() {
    let frustum = camera_frustum(std::f32::consts::FRAC_PI_4, 100.0);

    // Far to the right (outside the right plane only)
    let right = Aabb {
        min: Vec3::new(100.0, -1.0, -1.0),
        max: Vec3::new(102.0, 1.0, 1.0),
    };
    assert!(!frustum.intersects_aabb(&right));

    // Behind the camera (outside the near plane)
    let behind = Aabb {
        min: Vec3::new(-1.0, -1.0, 10.0),
        max: Vec3::new(1.0, 1.0, 12.0),
    };
    assert!(!frustum.intersects_aabb(&behind));
}

#[test]
fn test_box_beyond_far_plane_is_culled() {
    let frustum = camera_frustum(std::f32::consts::FRAC_PI_2, 10.0);
    let aabb = Aabb {
        min: Vec3::new(-1.0, -1.0, -20.0),
        max: Vec3::new(1.0, 1.0, -18.0),
    };
    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_straddling_box_is_kept_conservatively() {
    let projection = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 100.0);
    let frustum = Frustum::from_view_projection(&projection);

    // Straddles the right boundary at x = 5
    let aabb = Aabb {
        min: Vec3::new(4.0, 0.0, -10.0),
        max: Vec3::new(6.0, 1.0, -5.0),
    };
    assert!(frustum.intersects_aabb(&aabb));
}

#[test]
fn test_huge_box_containing_the_frustum_is_kept() {
    let frustum = camera_frustum(std::f32::consts::FRAC_PI_2, 50.0);
    let aabb = Aabb {
        min: Vec3::splat(-1000.0),
        max: Vec3::splat(1000.0),
    };
    assert!(frustum.intersects_aabb(&aabb));
}
