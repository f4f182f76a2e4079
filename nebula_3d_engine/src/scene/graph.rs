/// Scene graph — a forest of transform nodes over a generational pool.
///
/// Maintains parent/child links and computes per-node world transforms
/// once per traversal. Traversal is iterative depth-first over an
/// explicit stack of (node handle, inherited parent-world-matrix) pairs,
/// both to bound stack depth on deep hierarchies and so the same
/// traversal core serves light collection, main-pass drawing and
/// shadow-pass drawing through a visitor callback.

use glam::Mat4;
use crate::engine_warn;
use crate::pool::{Handle, Pool};
use super::node::{Node, NodeData};

/// A forest of transform nodes owned by a [`Pool`].
///
/// The root node is created with the graph, parents to itself
/// (sentinel), and participates in parenting logic, but its own payload
/// is never rendered; its children are the traversal roots.
pub struct SceneGraph {
    nodes: Pool<Node>,
    root: Handle,
}

impl SceneGraph {
    /// Create a graph containing only the root node.
    pub fn new() -> Self {
        let mut nodes = Pool::new();
        // The root's parent is itself; patch the link once the handle
        // exists.
        let placeholder = Handle::from_packed(0);
        let root = nodes.malloc(Node::new(placeholder, NodeData::Empty));
        if let Some(node) = nodes.get_mut(root) {
            node.parent = root;
        }
        Self { nodes, root }
    }

    /// Handle of the root node.
    pub fn root(&self) -> Handle {
        self.root
    }

    /// Resolve a node handle. `None` on stale handles.
    pub fn node(&self, handle: Handle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    /// Mutable variant of [`SceneGraph::node`].
    pub fn node_mut(&mut self, handle: Handle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Create a node parented to the root.
    pub fn create_node(&mut self, data: NodeData) -> Handle {
        self.create_child_node(self.root, data)
            .expect("root node is always live")
    }

    /// Create a node parented to `parent`.
    ///
    /// Returns `None` if `parent` is stale.
    pub fn create_child_node(&mut self, parent: Handle, data: NodeData) -> Option<Handle> {
        if !self.nodes.contains(parent) {
            return None;
        }
        let child = self.nodes.malloc(Node::new(parent, data));
        self.nodes
            .get_mut(parent)
            .expect("parent checked above")
            .children
            .push(child);
        Some(child)
    }

    /// Move `child` under `parent`.
    ///
    /// Unhooks the child from its current parent first (swap-remove, so
    /// child lists carry no ordering guarantee), then appends it to the
    /// new parent's list and updates the parent pointer. Rejected (with
    /// a WARN) when either handle is stale, when `child` is the root,
    /// when `parent == child`, or when `parent` sits inside `child`'s
    /// subtree (which would create a cycle). Returns whether the
    /// reparent happened.
    pub fn parent_node(&mut self, parent: Handle, child: Handle) -> bool {
        if child == self.root {
            engine_warn!("nebula3d::SceneGraph", "cannot reparent the root node");
            return false;
        }
        if !self.nodes.contains(parent) || !self.nodes.contains(child) {
            return false;
        }
        if parent == child || self.is_descendant_of(parent, child) {
            engine_warn!("nebula3d::SceneGraph", "reparent rejected: would create a cycle");
            return false;
        }

        self.unhook_from_parent(child);

        self.nodes
            .get_mut(parent)
            .expect("parent checked above")
            .children
            .push(child);
        self.nodes
            .get_mut(child)
            .expect("child checked above")
            .parent = parent;
        true
    }

    /// Reattach `child` to the root.
    pub fn unparent_node(&mut self, child: Handle) -> bool {
        self.parent_node(self.root, child)
    }

    /// Destroy a node and its entire subtree.
    ///
    /// Frees every descendant handle; a destroyed subtree is never left
    /// reachable from a live parent. The root cannot be destroyed.
    /// Returns the number of nodes freed.
    pub fn destroy_node_cascade(&mut self, handle: Handle) -> usize {
        if handle == self.root {
            engine_warn!("nebula3d::SceneGraph", "cannot destroy the root node");
            return 0;
        }
        if !self.nodes.contains(handle) {
            return 0;
        }

        self.unhook_from_parent(handle);

        let mut freed = 0;
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().copied());
            }
            if self.nodes.free(current) {
                freed += 1;
            }
        }
        freed
    }

    /// Visit every live node below the root in depth-first order.
    ///
    /// The visitor receives the node's handle, the node, and its freshly
    /// computed world matrix; returning `false` prunes the subtree. The
    /// root itself is not visited, but its transform is inherited by its
    /// children. Nodes whose handle has gone stale are skipped along
    /// with their subtree (a destroy cascade removes them properly; this
    /// is only the mid-frame safety net).
    pub fn traverse<F>(&self, mut visitor: F)
    where
        F: FnMut(Handle, &Node, &Mat4) -> bool,
    {
        let root_world = match self.nodes.get(self.root) {
            Some(root) => root.transform.local_matrix(),
            None => return,
        };

        let mut stack: Vec<(Handle, Mat4)> = Vec::new();
        if let Some(root) = self.nodes.get(self.root) {
            for &child in root.children.iter().rev() {
                stack.push((child, root_world));
            }
        }
        self.run_traversal(stack, &mut visitor);
    }

    /// Visit `start` and its subtree with the given inherited matrix.
    ///
    /// Used by the animation evaluator to harvest skeleton world
    /// matrices without walking the whole scene.
    pub fn traverse_from<F>(&self, start: Handle, parent_world: Mat4, mut visitor: F)
    where
        F: FnMut(Handle, &Node, &Mat4) -> bool,
    {
        self.run_traversal(vec![(start, parent_world)], &mut visitor);
    }

    /// World matrix of a node, composed up the parent chain to the root.
    ///
    /// O(depth); traversal is the per-frame path, this is for spot
    /// queries. `None` on stale handles.
    pub fn world_matrix(&self, handle: Handle) -> Option<Mat4> {
        let node = self.nodes.get(handle)?;
        let mut world = node.transform.local_matrix();
        if node.parent == handle {
            return Some(world);
        }
        let mut current = node.parent;

        // The root parents to itself, which terminates the walk. Bound
        // the climb by the pool size in case a link is corrupted.
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(current)?;
            world = node.transform.local_matrix() * world;
            if node.parent == current {
                return Some(world);
            }
            current = node.parent;
        }
        None
    }

    /// Whether `node` lies in the subtree rooted at `ancestor`
    /// (inclusive), following parent pointers upward.
    fn is_descendant_of(&self, node: Handle, ancestor: Handle) -> bool {
        let mut current = node;
        for _ in 0..self.nodes.len() {
            if current == ancestor {
                return true;
            }
            match self.nodes.get(current) {
                Some(n) if n.parent != current => current = n.parent,
                _ => return false,
            }
        }
        false
    }

    /// Swap-remove `child` from its parent's child list.
    fn unhook_from_parent(&mut self, child: Handle) {
        let parent = match self.nodes.get(child) {
            Some(node) => node.parent,
            None => return,
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            if let Some(position) = parent_node.children.iter().position(|&c| c == child) {
                parent_node.children.swap_remove(position);
            }
        }
    }

    /// Shared explicit-stack traversal core.
    fn run_traversal<F>(&self, mut stack: Vec<(Handle, Mat4)>, visitor: &mut F)
    where
        F: FnMut(Handle, &Node, &Mat4) -> bool,
    {
        while let Some((handle, parent_world)) = stack.pop() {
            // Stale handle: skip the node and prune its subtree.
            let node = match self.nodes.get(handle) {
                Some(node) => node,
                None => continue,
            };

            let world = parent_world * node.transform.local_matrix();
            if !visitor(handle, node, &world) {
                continue;
            }

            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
