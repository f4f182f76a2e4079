/// Skeletal animation evaluator.
///
/// Runs once per fixed-rate animation tick, before the frame pipeline
/// samples pose buffers. For every playing skinned-mesh instance:
/// advance the playback, sample the clip channels onto the bone nodes
/// (bones ARE scene-graph nodes), recompute the bind-relative bone
/// matrices from the skeleton subtree's world transforms, and flush the
/// pose buffer once.

use glam::Mat4;
use crate::{engine_error, engine_warn};
use crate::pool::Handle;
use crate::scene::{NodeData, SceneGraph};
use super::clip::AnimationClip;

/// Stateless evaluator over a scene graph and a clip library.
pub struct AnimationSystem;

impl AnimationSystem {
    /// Advance every playing instance in the graph by `dt` seconds.
    pub fn tick(graph: &mut SceneGraph, clips: &[AnimationClip], dt: f32) {
        // Gather the skinned instances first; sampling mutates bone
        // nodes all over the graph, which a live traversal borrow would
        // forbid.
        let mut instances: Vec<Handle> = Vec::new();
        graph.traverse(|handle, node, _| {
            if matches!(node.data, NodeData::SkeletalMesh(_)) {
                instances.push(handle);
            }
            true
        });

        for instance in instances {
            Self::tick_instance(graph, clips, instance, dt);
        }
    }

    /// Advance one instance: sample, recompute, flush.
    fn tick_instance(
        graph: &mut SceneGraph,
        clips: &[AnimationClip],
        instance: Handle,
        dt: f32,
    ) {
        let (clip_index, time, bone_nodes, skeleton_root) = {
            let Some(node) = graph.node_mut(instance) else { return };
            let NodeData::SkeletalMesh(inst) = &mut node.data else { return };
            let Some(playback) = inst.playback.as_mut() else { return };
            if !playback.advance(dt) {
                return;
            }
            (playback.clip, playback.time, inst.bone_nodes.clone(), inst.skeleton_root)
        };

        let Some(clip) = clips.get(clip_index) else {
            engine_warn!("nebula3d::AnimationSystem",
                "playback references unknown clip {}", clip_index);
            return;
        };

        // Sample each channel onto its bone node's local transform.
        // Empty tracks hold the bind pose for that component; a stale
        // bone handle skips the bone.
        for (channel, &bone) in clip.channels.iter().zip(&bone_nodes) {
            let Some(bone_node) = graph.node_mut(bone) else { continue };
            if let Some(position) = channel.position.sample(time) {
                bone_node.transform.position = position;
            }
            if let Some(rotation) = channel.rotation.sample(time) {
                bone_node.transform.rotation = rotation;
            }
            if let Some(scale) = channel.scale.sample(time) {
                bone_node.transform.scale = scale;
            }
        }

        // Recompute the skeleton subtree's world matrices with the
        // shared traversal core, seeded by the skeleton root's parent.
        let parent_world = match graph.node(skeleton_root) {
            Some(node) => graph.world_matrix(node.parent).unwrap_or(Mat4::IDENTITY),
            None => return,
        };
        let mut bone_worlds: Vec<(Handle, Mat4)> = Vec::with_capacity(bone_nodes.len());
        graph.traverse_from(skeleton_root, parent_world, |handle, _, world| {
            bone_worlds.push((handle, *world));
            true
        });

        // Final bone matrix = bone world x inverse bind; one flush per
        // instance per tick.
        let Some(node) = graph.node_mut(instance) else { return };
        let NodeData::SkeletalMesh(inst) = &mut node.data else { return };
        for (bone, world) in bone_worlds {
            if let Some(index) = inst.bone_index(bone) {
                if let Some(inverse_bind) = inst.inverse_bind.get(index).copied() {
                    inst.pose.set_bone_matrix(index, world * inverse_bind);
                }
            }
        }
        if let Err(e) = inst.pose.flush() {
            engine_error!("nebula3d::AnimationSystem", "pose flush failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
