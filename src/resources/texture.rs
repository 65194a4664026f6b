use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context;

use crate::{
    data_structures::{
        component::Mesh,
        texture::{TextureData, TextureHandle},
    },
    resources::load_binary,
};

/// Shared texture store consulted while components load.
///
/// Keys are the texture paths exactly as written in the component file, so
/// two components naming the same texture share one entry.
pub trait TextureCache {
    /// Loads `path` under `key`, or returns the entry already cached for `key`.
    fn load_texture(&mut self, key: &str, path: &Path) -> anyhow::Result<TextureHandle>;

    fn get_texture(&self, key: &str) -> Option<TextureHandle>;
}

/// [`TextureCache`] that decodes image files with the `image` crate.
#[derive(Debug, Default)]
pub struct TextureManager {
    textures: HashMap<String, TextureHandle>,
}

impl TextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Drops every cached texture.
    pub fn clear(&mut self) {
        self.textures.clear();
    }
}

impl TextureCache for TextureManager {
    fn load_texture(&mut self, key: &str, path: &Path) -> anyhow::Result<TextureHandle> {
        if let Some(texture) = self.textures.get(key) {
            return Ok(texture.clone());
        }
        let bytes = load_binary(path)
            .with_context(|| format!("Could not read texture file {}", path.display()))?;
        let texture = Arc::new(TextureData::from_bytes(key, &bytes)?);
        self.textures.insert(key.to_string(), texture.clone());
        Ok(texture)
    }

    fn get_texture(&self, key: &str) -> Option<TextureHandle> {
        self.textures.get(key).cloned()
    }
}

/// Requests every texture `mesh` names. Failures are logged, never returned:
/// a missing texture degrades rendering but does not fail the load.
///
/// The diffuse, normal and specular maps resolve against `directory`; the
/// generic texture list resolves through [`Mesh::full_texture_path`].
pub fn request_mesh_textures(
    cache: &mut dyn TextureCache,
    directory: &Path,
    mesh_index: usize,
    mesh: &Mesh,
) {
    let material = &mesh.material;
    for (i, key) in material.textures.iter().enumerate() {
        let Some(path) = mesh.full_texture_path(directory, i) else {
            continue;
        };
        request(cache, mesh_index, "texture", key, &path);
    }
    let maps = [
        ("diffuse texture", &material.diffuse),
        ("normal map texture", &material.normals),
        ("specular map texture", &material.specular),
    ];
    for (kind, key) in maps {
        if !key.is_empty() {
            request(cache, mesh_index, kind, key, &directory.join(key));
        }
    }
}

fn request(cache: &mut dyn TextureCache, mesh_index: usize, kind: &str, key: &str, path: &Path) {
    match cache.load_texture(key, path) {
        Ok(_) => log::debug!("Mesh #{mesh_index} loaded {kind}: {key}"),
        Err(e) => log::error!("Mesh #{mesh_index} failed to load {kind}: {key}\n{e:#}"),
    }
}
