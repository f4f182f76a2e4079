/// Scene node types.
///
/// A Node is a transform in the scene forest plus an optional payload:
/// a static mesh, a skinned mesh instance, or a light. Bones of a
/// skinned mesh are ordinary nodes; the skeletal instance maps bone
/// indices to their node handles.

use glam::Mat4;
use rustc_hash::FxHashMap;
use crate::pool::Handle;
use crate::animation::{AnimationPlayback, Pose};
use super::transform::Transform;

/// Payload attached to a scene node.
///
/// Every consumer (traversal visitors, the animation evaluator, the
/// destroy cascade) matches exhaustively on this.
pub enum NodeData {
    /// Pure transform node (grouping, bones without payload)
    Empty,
    /// Static mesh; handle into the scene's mesh pool
    StaticMesh(Handle),
    /// Skinned mesh instance with its pose and playback state
    SkeletalMesh(SkeletalMeshInstance),
    /// Light; handle into the scene's light pool
    Light(Handle),
}

/// A node in the scene forest.
///
/// The root node's `parent` is itself (sentinel). A node never lists
/// itself or an ancestor as a child; reparenting goes through
/// `SceneGraph::parent_node`, which maintains both directions of the
/// link.
pub struct Node {
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Parent node (self for the root)
    pub parent: Handle,
    /// Child nodes, unordered (reparenting swap-removes)
    pub children: Vec<Handle>,
    /// Payload variant
    pub data: NodeData,
}

impl Node {
    /// Create a node with the given payload and an identity transform.
    ///
    /// The parent link is set by the graph when the node is inserted.
    pub(crate) fn new(parent: Handle, data: NodeData) -> Self {
        Self {
            transform: Transform::IDENTITY,
            parent,
            children: Vec::new(),
            data,
        }
    }
}

/// One skinned mesh placed in the scene.
///
/// `bone_nodes[i]` is the scene-graph node driven by clip channel `i`;
/// `inverse_bind[i]` is that bone's inverse bind-pose matrix. The pose
/// holds the final (bind-relative) matrices and their GPU buffer.
pub struct SkeletalMeshInstance {
    /// Handle into the scene's mesh pool
    pub mesh: Handle,
    /// Node at the top of the bone hierarchy
    pub skeleton_root: Handle,
    /// Bone index -> scene-graph node
    pub bone_nodes: Vec<Handle>,
    /// Bone index -> inverse bind-pose matrix
    pub inverse_bind: Vec<Mat4>,
    /// Final bone matrices + GPU-visible buffer
    pub pose: Pose,
    /// Active playback, if any
    pub playback: Option<AnimationPlayback>,

    /// Reverse lookup used when harvesting world matrices from a
    /// skeleton traversal
    bone_index_of: FxHashMap<Handle, usize>,
}

impl SkeletalMeshInstance {
    /// Create an instance over `bone_nodes` (one entry per clip channel).
    ///
    /// `inverse_bind` must be the same length as `bone_nodes`.
    pub fn new(
        mesh: Handle,
        skeleton_root: Handle,
        bone_nodes: Vec<Handle>,
        inverse_bind: Vec<Mat4>,
        pose: Pose,
    ) -> Self {
        debug_assert_eq!(bone_nodes.len(), inverse_bind.len());
        let bone_index_of = bone_nodes
            .iter()
            .enumerate()
            .map(|(index, &handle)| (handle, index))
            .collect();
        Self {
            mesh,
            skeleton_root,
            bone_nodes,
            inverse_bind,
            pose,
            playback: None,
            bone_index_of,
        }
    }

    /// Bone index of `node`, if it is one of this instance's bones.
    pub fn bone_index(&self, node: Handle) -> Option<usize> {
        self.bone_index_of.get(&node).copied()
    }

    /// Number of bones driven by this instance.
    pub fn bone_count(&self) -> usize {
        self.bone_nodes.len()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
