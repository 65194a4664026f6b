//! Component prototypes as described by component JSON files.
//!
//! ```json
//! {
//!   "name": "Table",
//!   "offset": [0.0, 0.0, 0.0],
//!   "meshes": [{
//!     "name": "top",
//!     "binfile": "top.bin",
//!     "material": { "diffuse": "wood.png", "textures": [] }
//!   }],
//!   "collisions": [],
//!   "child_references": [{ "file": "leg.json", "location": [1.0, 0.0, 0.0] }]
//! }
//! ```
//!
//! Every field is optional and unknown fields are ignored.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use cgmath::{InnerSpace, Rotation3, Zero};
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{geometry::Geometry, instance::Instance},
    errors::{ComponentError, Result},
};

static COMPONENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loaded or constructed [`Component`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    pub fn next() -> Self {
        Self(COMPONENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::next()
    }
}

/// A named prototype that instances are cloned from.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Component {
    #[serde(skip)]
    pub id: ComponentId,

    #[serde(default)]
    pub name: String,

    /// Translation applied to every instance of this component.
    #[serde(default)]
    pub offset: [f32; 3],

    #[serde(default)]
    pub meshes: Vec<Mesh>,

    /// Collision shapes; their structure belongs to the physics side.
    #[serde(default)]
    pub collisions: Vec<serde_json::Value>,

    #[serde(default)]
    pub child_references: Vec<ChildReference>,

    /// Base directory for relative mesh and texture paths, set by the loader.
    #[serde(skip)]
    pub directory: PathBuf,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| ComponentError::Encode {
            name: self.name.clone(),
            source,
        })
    }

    /// Writes the component in the same format it is loaded from.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| ComponentError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Releases the GPU buffers of every mesh.
    pub fn destroy(&mut self) {
        for mesh in &mut self.meshes {
            if let Some(geometry) = mesh.geometry.take() {
                geometry.release();
            }
        }
    }
}

/// One piece of geometry of a component, with its material and transform.
#[derive(Debug, Serialize, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub name: String,

    /// Binary geometry file, relative to the component directory.
    #[serde(default, rename = "binfile")]
    pub bin_file: String,

    #[serde(default)]
    pub material: Material,

    #[serde(default)]
    pub offset: [f32; 3],

    #[serde(default)]
    pub rotation_axis: [f32; 3],

    #[serde(default)]
    pub rotation_degrees: f32,

    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],

    /// Decoded geometry; present once the loader has read `bin_file`.
    #[serde(skip)]
    pub geometry: Option<Arc<Geometry>>,
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            name: String::new(),
            bin_file: String::new(),
            material: Material::default(),
            offset: [0.0; 3],
            rotation_axis: [0.0; 3],
            rotation_degrees: 0.0,
            scale: unit_scale(),
            geometry: None,
        }
    }
}

impl Mesh {
    pub fn full_bin_file_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.bin_file)
    }

    /// Path of the `i`th entry of the material's texture list.
    pub fn full_texture_path(&self, directory: &Path, i: usize) -> Option<PathBuf> {
        self.material
            .textures
            .get(i)
            .map(|texture| directory.join(texture))
    }

    /// The mesh transform relative to its component.
    pub fn local_transform(&self) -> Instance {
        let axis = cgmath::Vector3::from(self.rotation_axis);
        let rotation = if axis.is_zero() || self.rotation_degrees == 0.0 {
            Instance::new().rotation
        } else {
            cgmath::Quaternion::from_axis_angle(axis.normalize(), cgmath::Deg(self.rotation_degrees))
        };
        Instance {
            position: self.offset.into(),
            rotation,
            scale: self.scale.into(),
        }
    }
}

/// Texture paths (relative to the component directory) and shading inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub textures: Vec<String>,

    #[serde(default)]
    pub diffuse: String,

    #[serde(default)]
    pub normals: String,

    #[serde(default)]
    pub specular: String,

    /// Name of the shader in the manager's shader library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader: Option<String>,

    #[serde(default = "opaque_white")]
    pub diffuse_color: [f32; 4],
}

fn opaque_white() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

impl Default for Material {
    fn default() -> Self {
        Self {
            textures: Vec::new(),
            diffuse: String::new(),
            normals: String::new(),
            specular: String::new(),
            shader: None,
            diffuse_color: opaque_white(),
        }
    }
}

/// A by-path reference to another component, placed at an optional location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildReference {
    pub file: String,

    /// Replaces the child's own offset when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<[f32; 3]>,
}
