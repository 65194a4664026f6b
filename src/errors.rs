//! Error types.
//!
//! [`ComponentError`] covers every way loading or saving a component can fail.
//! Structural failures (the component file itself or one of its mesh blobs)
//! are returned to the caller. Texture and child-component failures are not:
//! they are logged and the load carries on, see
//! [`ComponentError::MissingReference`].

use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading, decoding or saving a component.
#[derive(Error, Debug)]
pub enum ComponentError {
    /// The component file could not be read.
    #[error("failed to read the component file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The component JSON is malformed.
    #[error("failed to decode the component JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// A mesh names a binary file that could not be read.
    #[error("mesh #{index} failed to read the binary file {}: {source}", file.display())]
    MeshRead {
        index: usize,
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mesh binary file was read but is not a valid mesh.
    #[error("mesh #{index} failed to decode the binary file {}: {source}", file.display())]
    MeshDecode {
        index: usize,
        file: PathBuf,
        #[source]
        source: MeshDecodeError,
    },

    /// The component could not be serialized.
    #[error("failed to encode the component {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The component file could not be written.
    #[error("failed to write the component file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A child component could not be resolved. Only ever logged.
    #[error("component {component} has a child reference ({file}) that could not be resolved")]
    MissingReference { component: String, file: String },
}

/// Failure while decoding mesh geometry.
#[derive(Error, Debug)]
pub enum MeshDecodeError {
    #[error("not a mesh blob (bad magic)")]
    BadMagic,

    #[error("unsupported mesh blob version {0}")]
    UnsupportedVersion(u16),

    #[error("mesh blob is truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("mesh blob has {0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("index count {0} is not a multiple of three")]
    NotTriangles(usize),

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("obj parse error: {0}")]
    Obj(#[from] tobj::LoadError),
}

/// Alias for `Result<T, ComponentError>`.
pub type Result<T> = std::result::Result<T, ComponentError>;
