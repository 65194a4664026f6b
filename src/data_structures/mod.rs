//! Component data structures: prototypes, geometry, textures and instances.
//!
//! - `component` holds the component prototype as read from JSON
//! - `geometry` contains decoded meshes and their lazily created GPU buffers
//! - `texture` contains decoded images and the GPU texture wrapper
//! - `instance` holds per-instance transformation data
//! - `renderable` builds instance trees out of shared geometry

pub mod component;
pub mod geometry;
pub mod instance;
pub mod renderable;
pub mod texture;
