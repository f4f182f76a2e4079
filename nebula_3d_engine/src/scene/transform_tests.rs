use glam::{Mat4, Quat, Vec3, Vec4};
use super::*;

#[test]
fn test_identity_composes_to_identity_matrix() {
    assert_eq!(Transform::IDENTITY.local_matrix(), Mat4::IDENTITY);
    assert_eq!(Transform::default().local_matrix(), Mat4::IDENTITY);
}

#[test]
fn test_from_position_translates_only() {
    let transform = Transform::from_position(Vec3::new(3.0, -1.0, 2.0));
    let matrix = transform.local_matrix();
    assert_eq!(matrix.col(3), Vec4::new(3.0, -1.0, 2.0, 1.0));
    // Rotation/scale part stays identity
    assert_eq!(matrix.col(0).truncate(), Vec3::X);
    assert_eq!(matrix.col(1).truncate(), Vec3::Y);
    assert_eq!(matrix.col(2).truncate(), Vec3::Z);
}

#[test]
fn test_trs_order_scale_then_rotate_then_translate() {
    let transform = Transform {
        position: Vec3::new(10.0, 0.0, 0.0),
        rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        scale: Vec3::splat(2.0),
    };
    // Point (1, 0, 0): scaled to (2, 0, 0), rotated to (0, 2, 0),
    // translated to (10, 2, 0).
    let point = transform.local_matrix().transform_point3(Vec3::X);
    assert!((point - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-5);
}
