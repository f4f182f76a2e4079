use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::graphics_device::mock_buffer::MockBuffer;
use super::*;

#[test]
fn test_new_pose_is_identity() {
    let pose = Pose::new(4, Arc::new(MockBuffer::new(4 * 64)));
    assert_eq!(pose.bone_count(), 4);
    for matrix in pose.bone_matrices() {
        assert_eq!(*matrix, Mat4::IDENTITY);
    }
}

#[test]
fn test_out_of_range_bone_write_is_ignored() {
    let mut pose = Pose::new(2, Arc::new(MockBuffer::new(2 * 64)));
    pose.set_bone_matrix(5, Mat4::ZERO);
    assert_eq!(pose.bone_count(), 2);
    assert_eq!(pose.bone_matrices(), &[Mat4::IDENTITY, Mat4::IDENTITY]);
}

#[test]
fn test_flush_uploads_the_cpu_array() {
    let buffer = Arc::new(MockBuffer::new(2 * 64));
    let mut pose = Pose::new(2, buffer.clone());
    pose.set_bone_matrix(0, Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
    pose.set_bone_matrix(1, Mat4::from_scale(Vec3::splat(2.0)));
    pose.flush().unwrap();

    let bytes = buffer.contents();
    let uploaded: &[Mat4] = bytemuck::cast_slice(&bytes);
    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded[0].col(3).truncate(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(uploaded[1].col(0).x, 2.0);
}
