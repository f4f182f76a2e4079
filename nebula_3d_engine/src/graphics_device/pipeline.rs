/// Pipeline trait
///
/// A compiled graphics pipeline plus its layout, produced by the
/// material/pipeline collaborator and handed to the core as an opaque
/// capability. The frame pipeline only binds what it is given; it never
/// constructs pipeline state itself.

/// Opaque graphics pipeline handle.
///
/// Implemented by backend-specific pipeline types (e.g., VulkanPipeline).
/// The backend downcasts to its concrete type at bind time.
pub trait Pipeline: Send + Sync {}
