use std::sync::Arc;
use glam::Mat4;
use crate::animation::Pose;
use crate::graphics_device::mock_buffer::MockBuffer;
use crate::pool::{Handle, Pool};
use super::*;

fn handles(n: usize) -> Vec<Handle> {
    let mut pool = Pool::new();
    (0..n).map(|i| pool.malloc(i)).collect()
}

#[test]
fn test_skeletal_instance_maps_bones_both_ways() {
    let hs = handles(4);
    let pose = Pose::new(3, Arc::new(MockBuffer::new(3 * 64)));
    let instance = SkeletalMeshInstance::new(
        hs[0],
        hs[1],
        vec![hs[1], hs[2], hs[3]],
        vec![Mat4::IDENTITY; 3],
        pose,
    );

    assert_eq!(instance.bone_count(), 3);
    assert_eq!(instance.bone_index(hs[1]), Some(0));
    assert_eq!(instance.bone_index(hs[3]), Some(2));
    assert_eq!(instance.bone_index(hs[0]), None);
}

#[test]
fn test_new_instance_has_no_playback() {
    let hs = handles(2);
    let pose = Pose::new(1, Arc::new(MockBuffer::new(64)));
    let instance =
        SkeletalMeshInstance::new(hs[0], hs[1], vec![hs[1]], vec![Mat4::IDENTITY], pose);
    assert!(instance.playback.is_none());
}

#[test]
fn test_node_data_variants_match_exhaustively() {
    let hs = handles(1);
    // Compile-time exhaustiveness is the point; a new variant must be
    // handled by every consumer, starting with this match.
    let data = NodeData::StaticMesh(hs[0]);
    let described = match data {
        NodeData::Empty => "empty",
        NodeData::StaticMesh(_) => "static",
        NodeData::SkeletalMesh(_) => "skeletal",
        NodeData::Light(_) => "light",
    };
    assert_eq!(described, "static");
}
