#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
};

use component_forge::{
    ComponentManager,
    context::ShaderLibrary,
    data_structures::{
        geometry::{DecodedMesh, ModelVertex},
        texture::{TextureData, TextureHandle},
    },
    resources::{mesh::encode_mesh, texture::TextureCache},
};
use tempfile::TempDir;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A unit quad in the XY plane with UVs, two triangles.
pub fn quad() -> DecodedMesh {
    let vertex = |position: [f32; 3], tex_coords: [f32; 2]| ModelVertex {
        position,
        tex_coords,
        normal: [0.0, 0.0, 1.0],
        ..Default::default()
    };
    DecodedMesh {
        vertices: vec![
            vertex([0.0, 0.0, 0.0], [0.0, 1.0]),
            vertex([1.0, 0.0, 0.0], [1.0, 1.0]),
            vertex([1.0, 1.0, 0.0], [1.0, 0.0]),
            vertex([0.0, 1.0, 0.0], [0.0, 0.0]),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Temporary asset directory that component fixtures are written into.
pub struct AssetDir {
    dir: TempDir,
}

impl AssetDir {
    pub fn new() -> Self {
        init_logger();
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    pub fn write(&self, file: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn write_component(&self, file: &str, json: serde_json::Value) -> PathBuf {
        self.write(file, json.to_string())
    }

    pub fn write_quad(&self, file: &str) -> PathBuf {
        self.write(file, encode_mesh(&quad()))
    }

    pub fn write_png(&self, file: &str) -> PathBuf {
        let path = self.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 100, 50, 255]))
            .save(&path)
            .expect("write png");
        path
    }
}

/// Texture cache that records every request and serves a 1x1 texture for
/// any path that exists.
#[derive(Clone, Default)]
pub struct RecordingTextures {
    pub requests: Rc<RefCell<Vec<(String, PathBuf)>>>,
    loaded: Rc<RefCell<HashMap<String, TextureHandle>>>,
}

impl RecordingTextures {
    pub fn requested_keys(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn manager(&self) -> ComponentManager {
        ComponentManager::new(Box::new(self.clone()), ShaderLibrary::new())
    }
}

impl TextureCache for RecordingTextures {
    fn load_texture(&mut self, key: &str, path: &Path) -> anyhow::Result<TextureHandle> {
        self.requests
            .borrow_mut()
            .push((key.to_string(), path.to_path_buf()));
        if let Some(texture) = self.loaded.borrow().get(key) {
            return Ok(texture.clone());
        }
        anyhow::ensure!(path.exists(), "no such texture {}", path.display());
        let texture = Arc::new(TextureData::new(
            key,
            image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255])),
        ));
        self.loaded.borrow_mut().insert(key.to_string(), texture.clone());
        Ok(texture)
    }

    fn get_texture(&self, key: &str) -> Option<TextureHandle> {
        self.loaded.borrow().get(key).cloned()
    }
}
