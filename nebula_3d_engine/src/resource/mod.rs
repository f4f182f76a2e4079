/// Resource module - CPU-side descriptions of GPU-backed assets

pub mod mesh;

pub use mesh::*;
