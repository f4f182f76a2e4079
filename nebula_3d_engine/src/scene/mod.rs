/// Scene module - the transform hierarchy and its resource pools

pub mod aabb;
pub mod transform;
pub mod node;
pub mod graph;
pub mod scene;

pub use aabb::Aabb;
pub use transform::Transform;
pub use node::{Node, NodeData, SkeletalMeshInstance};
pub use graph::SceneGraph;
pub use scene::Scene;
