//! component-forge
//!
//! Loads reusable 3D components from JSON descriptions, decodes their mesh
//! binaries and textures, and clones them into renderable instance trees that
//! share GPU resources. Components reference other components by file, so a
//! single load pulls in the whole component graph.
//!
//! High-level modules
//! - `context`: shaders that component materials resolve against
//! - `data_structures`: components, geometry, textures, instances and renderables
//! - `errors`: error types of the loading path
//! - `manager`: the component store, graph loader and instance cloner
//! - `resources`: mesh blob codec, texture cache and file helpers
//!

pub mod context;
pub mod data_structures;
pub mod errors;
pub mod manager;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use data_structures::component::{ChildReference, Component, ComponentId, Material, Mesh};
pub use data_structures::renderable::Renderable;
pub use errors::{ComponentError, MeshDecodeError, Result};
pub use manager::{ComponentManager, SharedComponent};
