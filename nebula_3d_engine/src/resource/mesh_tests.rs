use std::sync::Arc;
use glam::Vec3;
use crate::graphics_device::{mock_buffer::MockBuffer, Pipeline};
use crate::scene::Aabb;
use super::*;

struct NullPipeline;
impl Pipeline for NullPipeline {}

fn unit_box() -> Aabb {
    Aabb { min: Vec3::splat(-0.5), max: Vec3::splat(0.5) }
}

fn test_mesh(indexed: bool) -> Mesh {
    let vertices = Arc::new(MockBuffer::new(36 * 32));
    let indices: Option<Arc<dyn crate::graphics_device::Buffer>> = if indexed {
        Some(Arc::new(MockBuffer::new(36 * 4)))
    } else {
        None
    };
    Mesh::new(vertices, indices, 36, 24, unit_box(), Arc::new(NullPipeline))
}

#[test]
fn test_default_flags_make_mesh_fully_participating() {
    let mesh = test_mesh(true);
    assert!(mesh.flags().contains(RenderFlags::VISIBLE));
    assert!(mesh.flags().contains(RenderFlags::OPAQUE));
    assert!(mesh.flags().contains(RenderFlags::CAST_SHADOW));
}

#[test]
fn test_flags_can_opt_out_of_shadows() {
    let mut mesh = test_mesh(true);
    mesh.set_flags(RenderFlags::VISIBLE | RenderFlags::OPAQUE);
    assert!(!mesh.flags().contains(RenderFlags::CAST_SHADOW));
    assert!(mesh.flags().contains(RenderFlags::VISIBLE));
}

#[test]
fn test_indexed_mesh_exposes_counts() {
    let mesh = test_mesh(true);
    assert!(mesh.index_buffer().is_some());
    assert_eq!(mesh.index_count(), 36);
    assert_eq!(mesh.vertex_count(), 24);
}

#[test]
fn test_non_indexed_mesh_has_no_index_buffer() {
    let mesh = test_mesh(false);
    assert!(mesh.index_buffer().is_none());
}

#[test]
fn test_bounding_box_round_trips() {
    let mesh = test_mesh(true);
    assert_eq!(mesh.bounding_box().min, Vec3::splat(-0.5));
    assert_eq!(mesh.bounding_box().max, Vec3::splat(0.5));
}
