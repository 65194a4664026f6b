//! Cloning components into renderable instances.
//!
//! The first clone of a component builds its canonical [`Renderable`]: one
//! part per decoded mesh, with textures and shaders resolved. Later clones
//! copy the cached canonical node, so every instance shares geometry and
//! textures while owning its transforms.

use std::collections::HashMap;

use crate::{
    context::ShaderLibrary,
    data_structures::{
        component::{Component, ComponentId, Mesh},
        renderable::{RenderMaterial, RenderPart, Renderable},
        texture::TextureHandle,
    },
    manager::ComponentManager,
    resources::texture::TextureCache,
};

/// Canonical renderables are only valid for the shader set they were built
/// against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct RenderableKey {
    component: ComponentId,
    shaders: u64,
}

#[derive(Debug, Default)]
pub struct RenderableCache {
    renderables: HashMap<RenderableKey, Renderable>,
}

impl RenderableCache {
    pub fn clear(&mut self) {
        self.renderables.clear();
    }

    /// Drops every cached renderable of `component`, whatever shader set it
    /// was built with.
    pub fn remove_component(&mut self, component: ComponentId) {
        self.renderables.retain(|key, _| key.component != component);
    }

    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }
}

impl ComponentManager {
    /// Produces an instance tree of `component`: a node with the component's
    /// meshes and one child node per resolvable child reference.
    ///
    /// Child references that are not in the store are logged and left out.
    /// A reference back to a component already on the current branch is
    /// skipped, so cyclic graphs produce finite trees.
    pub fn clone_instance(&mut self, component: &Component) -> Renderable {
        let mut ancestors = Vec::new();
        self.clone_instance_below(component, &mut ancestors)
    }

    /// Number of canonical renderables built so far.
    pub fn cached_renderables(&self) -> usize {
        self.renderables.len()
    }

    fn clone_instance_below(
        &mut self,
        component: &Component,
        ancestors: &mut Vec<ComponentId>,
    ) -> Renderable {
        let key = RenderableKey {
            component: component.id,
            shaders: self.shaders.revision(),
        };
        let textures = self.textures.as_ref();
        let shaders = &self.shaders;
        let mut instance = self
            .renderables
            .renderables
            .entry(key)
            .or_insert_with(|| build_renderable(component, textures, shaders))
            .clone();

        ancestors.push(component.id);
        for child_ref in &component.child_references {
            let Some(child) = self.get_by_file_path(&child_ref.file) else {
                log::error!(
                    "Component \"{}\" could not find child component {}",
                    component.name,
                    child_ref.file
                );
                continue;
            };
            let Ok(child) = child.try_borrow() else {
                log::error!(
                    "Component \"{}\" could not borrow child component {}, it is being edited",
                    component.name,
                    child_ref.file
                );
                continue;
            };
            if ancestors.contains(&child.id) {
                log::warn!(
                    "Component \"{}\" references its ancestor {}, skipping the cycle",
                    component.name,
                    child_ref.file
                );
                continue;
            }
            let mut child_instance = self.clone_instance_below(&child, ancestors);
            if let Some(location) = child_ref.location {
                child_instance.local.position = location.into();
            }
            instance.add_child(child_instance);
        }
        ancestors.pop();

        instance
    }
}

fn build_renderable(
    component: &Component,
    textures: &dyn TextureCache,
    shaders: &ShaderLibrary,
) -> Renderable {
    let mut renderable = Renderable::group(component.name.clone());
    renderable.local.position = component.offset.into();
    for (i, mesh) in component.meshes.iter().enumerate() {
        let Some(geometry) = &mesh.geometry else {
            log::debug!("Mesh #{i} of \"{}\" has no geometry", component.name);
            continue;
        };
        renderable.add_part(RenderPart {
            name: mesh.name.clone(),
            local: mesh.local_transform(),
            geometry: geometry.clone(),
            material: render_material(mesh, textures, shaders),
        });
    }
    log::debug!(
        "Built renderable for \"{}\" with {} parts",
        component.name,
        renderable.parts.len()
    );
    renderable
}

fn render_material(mesh: &Mesh, textures: &dyn TextureCache, shaders: &ShaderLibrary) -> RenderMaterial {
    let material = &mesh.material;
    let lookup = |key: &str| -> Option<TextureHandle> {
        if key.is_empty() {
            return None;
        }
        let texture = textures.get_texture(key);
        if texture.is_none() {
            log::error!("Mesh \"{}\" has no loaded texture {key}", mesh.name);
        }
        texture
    };
    let shader = material.shader.as_deref().and_then(|name| {
        let shader = shaders.get(name);
        if shader.is_none() {
            log::error!("Mesh \"{}\" uses unknown shader {name}", mesh.name);
        }
        shader
    });
    RenderMaterial {
        diffuse: lookup(&material.diffuse),
        normals: lookup(&material.normals),
        specular: lookup(&material.specular),
        textures: material.textures.iter().filter_map(|key| lookup(key)).collect(),
        shader,
        diffuse_color: material.diffuse_color,
    }
}
