use glam::{Mat4, Vec3};
use super::*;

#[test]
fn test_view_projection_is_projection_times_view() {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0);
    let camera = Camera::new(view, projection);

    assert_eq!(camera.view_projection_matrix(), projection * view);
}

#[test]
fn test_setters_replace_matrices() {
    let mut camera = Camera::default();
    let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
    camera.set_view(view);
    assert_eq!(*camera.view_matrix(), view);

    let projection = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.1, 10.0);
    camera.set_projection(projection);
    assert_eq!(*camera.projection_matrix(), projection);
}

#[test]
fn test_frustum_tracks_current_matrices() {
    let mut camera = Camera::new(
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y),
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0),
    );
    let box_at_origin = crate::scene::Aabb {
        min: Vec3::splat(-0.5),
        max: Vec3::splat(0.5),
    };
    assert!(camera.frustum().intersects_aabb(&box_at_origin));

    // Point the camera away; the same box must now be culled
    camera.set_view(Mat4::look_at_rh(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::Y,
    ));
    assert!(!camera.frustum().intersects_aabb(&box_at_origin));
}
