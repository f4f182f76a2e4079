/// Scene — the graph plus the pools its nodes reference.
///
/// Node payloads hold handles into the light and mesh pools; resolving
/// them through the pools is the only way payload data is reached, so a
/// destroyed resource degrades to a skipped node rather than a dangling
/// reference.

use crate::engine_warn;
use crate::animation::{AnimationClip, AnimationSystem};
use crate::light::{CollectedLight, Light, LightList};
use crate::pool::{Handle, Pool};
use crate::resource::Mesh;
use super::graph::SceneGraph;
use super::node::NodeData;

/// A renderable scene: the node forest and its backing resource pools.
pub struct Scene {
    /// Transform hierarchy
    pub graph: SceneGraph,
    /// Lights referenced by `NodeData::Light` payloads
    pub lights: Pool<Light>,
    /// Meshes referenced by mesh payloads
    pub meshes: Pool<Mesh>,
    /// Animation clips, indexed by `AnimationPlayback::clip`
    clips: Vec<AnimationClip>,
}

impl Scene {
    /// Create an empty scene (root node only).
    pub fn new() -> Self {
        Self {
            graph: SceneGraph::new(),
            lights: Pool::new(),
            meshes: Pool::new(),
            clips: Vec::new(),
        }
    }

    /// Register an animation clip; returns its index for playback.
    pub fn add_clip(&mut self, clip: AnimationClip) -> usize {
        self.clips.push(clip);
        self.clips.len() - 1
    }

    /// Registered animation clips.
    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    /// Clip by index.
    pub fn clip(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    /// Advance all animation playbacks by `dt` seconds.
    ///
    /// Runs at the caller's fixed update rate, independent of the render
    /// rate. Samples every playing clip onto its bone nodes, recomputes
    /// the bind-relative pose matrices and flushes the pose buffers.
    pub fn update_animations(&mut self, dt: f32) {
        AnimationSystem::tick(&mut self.graph, &self.clips, dt);
    }

    /// Gather all light nodes into `out` in traversal order.
    ///
    /// Stale light handles are skipped; lights beyond the list capacity
    /// are silently dropped (documented policy — the uniform list and
    /// the shadow-map slots are fixed-size).
    pub fn collect_lights(&self, out: &mut LightList) {
        out.clear();
        self.graph.traverse(|_, node, world| {
            if let NodeData::Light(handle) = node.data {
                if let Some(light) = self.lights.get(handle) {
                    out.push(CollectedLight {
                        light: *light,
                        world: *world,
                    });
                }
            }
            true
        });
    }

    /// Destroy a node subtree and free the pooled resources its payloads
    /// reference.
    ///
    /// Mesh payloads keep their pool entries (meshes are commonly shared
    /// between nodes); light payloads are freed with their node.
    pub fn destroy_node_cascade(&mut self, handle: Handle) -> usize {
        // Collect payload handles before the nodes disappear.
        let mut lights = Vec::new();
        if self.graph.node(handle).is_some() {
            let world = glam::Mat4::IDENTITY;
            self.graph.traverse_from(handle, world, |_, node, _| {
                match node.data {
                    NodeData::Light(light) => lights.push(light),
                    NodeData::Empty
                    | NodeData::StaticMesh(_)
                    | NodeData::SkeletalMesh(_) => {}
                }
                true
            });
        }

        let freed = self.graph.destroy_node_cascade(handle);
        if freed == 0 && !lights.is_empty() {
            engine_warn!("nebula3d::Scene", "cascade destroy freed no nodes");
            return 0;
        }
        for light in lights {
            self.lights.free(light);
        }
        freed
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
