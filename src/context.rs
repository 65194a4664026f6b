//! Shader half of the render context.
//!
//! Components name their shader per mesh material. When a component's
//! canonical renderable is built the name is resolved against the
//! [`ShaderLibrary`] the manager was constructed with. The library carries a
//! revision so cached renderables built against an older set of shaders are
//! never handed out after the set changes.

use std::{
    collections::HashMap,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

static LIBRARY_REVISION: AtomicU64 = AtomicU64::new(1);

/// WGSL source for a named shader, compiled on first use.
#[derive(Debug)]
pub struct ShaderProgram {
    pub name: String,
    pub source: String,
    module: OnceLock<wgpu::ShaderModule>,
}

impl ShaderProgram {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            module: OnceLock::new(),
        }
    }

    pub fn module(&self, device: &wgpu::Device) -> &wgpu::ShaderModule {
        self.module.get_or_init(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&self.name),
                source: wgpu::ShaderSource::Wgsl(self.source.as_str().into()),
            })
        })
    }
}

/// Named shaders available to component materials.
#[derive(Debug)]
pub struct ShaderLibrary {
    shaders: HashMap<String, Arc<ShaderProgram>>,
    revision: u64,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            shaders: HashMap::new(),
            revision: LIBRARY_REVISION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Adds or replaces a shader. Any change gives the library a new revision.
    pub fn insert(&mut self, shader: ShaderProgram) -> Arc<ShaderProgram> {
        let shader = Arc::new(shader);
        self.shaders.insert(shader.name.clone(), shader.clone());
        self.revision = LIBRARY_REVISION.fetch_add(1, Ordering::Relaxed);
        shader
    }

    pub fn get(&self, name: &str) -> Option<Arc<ShaderProgram>> {
        self.shaders.get(name).cloned()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}
