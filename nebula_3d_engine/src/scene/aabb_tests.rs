use glam::{Mat4, Quat, Vec3};
use super::*;

#[test]
fn test_identity_transform_preserves_box() {
    let aabb = Aabb {
        min: Vec3::new(-1.0, -2.0, -3.0),
        max: Vec3::new(1.0, 2.0, 3.0),
    };
    let out = aabb.transformed(&Mat4::IDENTITY);
    assert_eq!(out.min, aabb.min);
    assert_eq!(out.max, aabb.max);
}

#[test]
fn test_translation_shifts_both_corners() {
    let aabb = Aabb {
        min: Vec3::splat(-1.0),
        max: Vec3::splat(1.0),
    };
    let out = aabb.transformed(&Mat4::from_translation(Vec3::new(5.0, 0.0, -2.0)));
    assert_eq!(out.min, Vec3::new(4.0, -1.0, -3.0));
    assert_eq!(out.max, Vec3::new(6.0, 1.0, -1.0));
}

#[test]
fn test_rotation_keeps_box_axis_aligned_and_conservative() {
    let aabb = Aabb {
        min: Vec3::new(-1.0, -1.0, 0.0),
        max: Vec3::new(1.0, 1.0, 0.0),
    };
    // 45 degrees around Z: the rotated square's AABB grows to sqrt(2)
    let rotation = Mat4::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4));
    let out = aabb.transformed(&rotation);
    let expected = std::f32::consts::SQRT_2;
    assert!((out.max.x - expected).abs() < 1e-5);
    assert!((out.max.y - expected).abs() < 1e-5);
    assert!((out.min.x + expected).abs() < 1e-5);
}

#[test]
fn test_negative_scale_swaps_corners_correctly() {
    let aabb = Aabb {
        min: Vec3::new(1.0, 0.0, 0.0),
        max: Vec3::new(2.0, 1.0, 1.0),
    };
    let out = aabb.transformed(&Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)));
    // min must stay the lesser corner after mirroring
    assert_eq!(out.min.x, -2.0);
    assert_eq!(out.max.x, -1.0);
}
