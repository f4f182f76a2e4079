//! Scene integration tests
//!
//! End-to-end scenarios over the public API: building a hierarchy with
//! mesh payloads, reparenting, light collection and animation driving
//! pose buffers — everything a frame does except the GPU submission.

use std::sync::{Arc, Mutex};
use nebula_3d_engine::glam::{Mat4, Vec3};
use nebula_3d_engine::nebula3d::{
    animation::{AnimationClip, AnimationPlayback, Channel, KeyframeTrack, PlaybackMode, Pose},
    camera::Camera,
    graphics_device::{Buffer, Pipeline},
    resource::Mesh,
    scene::{Aabb, NodeData, Scene, SkeletalMeshInstance, Transform},
    Light, LightKind, LightList, MAX_LIGHTS, Result,
};

// ============================================================================
// Test doubles
// ============================================================================

struct CaptureBuffer {
    size: u64,
    contents: Mutex<Vec<u8>>,
}

impl CaptureBuffer {
    fn new(size: u64) -> Self {
        Self { size, contents: Mutex::new(vec![0; size as usize]) }
    }
}

impl Buffer for CaptureBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut contents = self.contents.lock().unwrap();
        contents[offset as usize..offset as usize + data.len()].copy_from_slice(data);
        Ok(())
    }
    fn size(&self) -> u64 {
        self.size
    }
}

struct NullPipeline;
impl Pipeline for NullPipeline {}

fn unit_mesh() -> Mesh {
    Mesh::new(
        Arc::new(CaptureBuffer::new(1024)),
        None,
        0,
        36,
        Aabb { min: Vec3::splat(-0.5), max: Vec3::splat(0.5) },
        Arc::new(NullPipeline),
    )
}

// ============================================================================
// Hierarchy end-to-end
// ============================================================================

#[test]
fn test_child_world_position_follows_reparenting() {
    let mut scene = Scene::new();

    // Mesh node at the origin, scale 1
    let mesh_a = scene.meshes.malloc(unit_mesh());
    let first = scene.graph.create_node(NodeData::StaticMesh(mesh_a));

    // Second node parented to it at local (3, 0, 0)
    let mesh_b = scene.meshes.malloc(unit_mesh());
    let second = scene
        .graph
        .create_child_node(first, NodeData::StaticMesh(mesh_b))
        .unwrap();
    scene.graph.node_mut(second).unwrap().transform =
        Transform::from_position(Vec3::new(3.0, 0.0, 0.0));

    let position = scene.graph.world_matrix(second).unwrap().col(3).truncate();
    assert!((position - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);

    // Reparent to the root: world position unchanged because the root's
    // transform is identity and matrices are recomputed per traversal.
    assert!(scene.graph.parent_node(scene.graph.root(), second));
    let position = scene.graph.world_matrix(second).unwrap().col(3).truncate();
    assert!((position - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn test_culling_respects_traversed_world_positions() {
    let mut scene = Scene::new();
    let near_mesh = scene.meshes.malloc(unit_mesh());
    let far_mesh = scene.meshes.malloc(unit_mesh());

    let near = scene.graph.create_node(NodeData::StaticMesh(near_mesh));
    scene.graph.node_mut(near).unwrap().transform =
        Transform::from_position(Vec3::new(0.0, 0.0, -5.0));
    let far = scene.graph.create_node(NodeData::StaticMesh(far_mesh));
    scene.graph.node_mut(far).unwrap().transform =
        Transform::from_position(Vec3::new(500.0, 0.0, -5.0));

    let camera = Camera::new(
        Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y),
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0),
    );
    let frustum = camera.frustum();

    let mut drawn = Vec::new();
    scene.graph.traverse(|handle, node, world| {
        if let NodeData::StaticMesh(mesh) = node.data {
            if let Some(mesh) = scene.meshes.get(mesh) {
                let world_aabb = mesh.bounding_box().transformed(world);
                if frustum.intersects_aabb(&world_aabb) {
                    drawn.push(handle);
                }
            }
        }
        true
    });

    assert!(drawn.contains(&near));
    assert!(!drawn.contains(&far));
}

// ============================================================================
// Capacity scenario
// ============================================================================

#[test]
fn test_twelve_lights_yield_exactly_ten_in_the_list() {
    let mut scene = Scene::new();
    for i in 0..12 {
        let light = scene.lights.malloc(Light {
            kind: LightKind::Point,
            color: Vec3::ONE,
            intensity: 1.0,
            radius: 10.0,
            casts_shadows: i % 2 == 0,
        });
        scene.graph.create_node(NodeData::Light(light));
    }

    let mut list = LightList::new();
    scene.collect_lights(&mut list);

    assert_eq!(list.len(), MAX_LIGHTS);
    assert_eq!(list.lights().len(), MAX_LIGHTS);
}

// ============================================================================
// Animation end-to-end
// ============================================================================

#[test]
fn test_animation_tick_drives_mesh_pose_buffer() {
    let mut scene = Scene::new();
    let mesh = scene.meshes.malloc(unit_mesh());

    let bone = scene.graph.create_node(NodeData::Empty);
    let buffer = Arc::new(CaptureBuffer::new(64));
    let mut instance = SkeletalMeshInstance::new(
        mesh,
        bone,
        vec![bone],
        vec![Mat4::IDENTITY],
        Pose::new(1, buffer.clone()),
    );

    let channel = Channel {
        position: KeyframeTrack::new(
            vec![0.0, 1.0],
            vec![Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0)],
        ),
        rotation: KeyframeTrack::empty(),
        scale: KeyframeTrack::empty(),
    };
    let clip = scene.add_clip(AnimationClip::new("raise", 1.0, vec![channel]));
    instance.playback = Some(AnimationPlayback::new(clip, PlaybackMode::Once, 1.0));
    scene.graph.create_node(NodeData::SkeletalMesh(instance));

    scene.update_animations(0.5);

    let bytes = buffer.contents.lock().unwrap().clone();
    let uploaded: &[Mat4] = bytemuck::cast_slice(&bytes);
    let bone_position = uploaded[0].col(3).truncate();
    assert!((bone_position - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
}
