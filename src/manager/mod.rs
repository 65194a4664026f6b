//! The component manager.
//!
//! [`ComponentManager`] owns every loaded [`Component`] under a storage key,
//! loads component files and their child components
//! ([`load_from_file`](ComponentManager::load_from_file)), and clones
//! components into renderable instances
//! ([`clone_instance`](ComponentManager::clone_instance)).
//!
//! The manager is single-threaded: components are shared as
//! `Rc<RefCell<Component>>` and nothing is locked. Callers that touch it from
//! several threads must serialize access themselves.

use std::{cell::RefCell, collections::HashMap, path::Path, rc::Rc};

use crate::{
    context::ShaderLibrary,
    data_structures::component::Component,
    manager::instancing::RenderableCache,
    resources::{storage_key, texture::TextureCache},
};

pub mod instancing;
pub mod loader;

/// A stored component. Edits through the handle are visible to every
/// holder, including the store.
pub type SharedComponent = Rc<RefCell<Component>>;

/// Loads and manages access to [`Component`] prototypes.
pub struct ComponentManager {
    storage: HashMap<String, SharedComponent>,
    textures: Box<dyn TextureCache>,
    shaders: ShaderLibrary,
    renderables: RenderableCache,
}

impl ComponentManager {
    /// Creates an empty manager that loads textures into `textures` and
    /// resolves material shaders from `shaders`.
    pub fn new(textures: Box<dyn TextureCache>, shaders: ShaderLibrary) -> Self {
        Self {
            storage: HashMap::new(),
            textures,
            shaders,
            renderables: RenderableCache::default(),
        }
    }

    /// Destroys every stored component, releasing its GPU buffers, and
    /// empties the store.
    pub fn destroy(&mut self) {
        log::debug!("Destroying {} components", self.storage.len());
        for (name, component) in &self.storage {
            match component.try_borrow_mut() {
                Ok(mut component) => component.destroy(),
                Err(_) => log::error!("Component {name} is borrowed and could not be destroyed"),
            }
        }
        self.storage.clear();
        self.renderables.clear();
    }

    /// Stores `component` under `name`, replacing any previous entry. The
    /// replaced component is not destroyed, but its cached renderables are
    /// dropped.
    pub fn add(&mut self, name: impl Into<String>, component: Component) -> SharedComponent {
        let shared = Rc::new(RefCell::new(component));
        if let Some(replaced) = self.storage.insert(name.into(), shared.clone()) {
            match replaced.try_borrow() {
                Ok(replaced) => self.renderables.remove_component(replaced.id),
                Err(_) => self.renderables.clear(),
            }
        }
        shared
    }

    pub fn get(&self, name: &str) -> Option<SharedComponent> {
        self.storage.get(name).cloned()
    }

    /// Looks a component up by the base filename of `path`.
    pub fn get_by_file_path(&self, path: impl AsRef<Path>) -> Option<SharedComponent> {
        self.get(&storage_key(path))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.storage.contains_key(name)
    }

    /// Calls `visit` once per stored component, in no particular order.
    pub fn for_each(&self, mut visit: impl FnMut(&SharedComponent)) {
        for component in self.storage.values() {
            visit(component);
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Components whose display name contains `query`, ignoring case, sorted
    /// by name. An empty query matches everything.
    pub fn find_by_name(&self, query: &str) -> Vec<SharedComponent> {
        let query = query.to_lowercase();
        let mut found: Vec<SharedComponent> = self
            .storage
            .values()
            .filter(|c| c.borrow().name.to_lowercase().contains(&query))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.borrow().name.cmp(&b.borrow().name));
        found
    }

    pub fn textures(&self) -> &dyn TextureCache {
        self.textures.as_ref()
    }

    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    /// Replaces the shader library. Instances cloned afterwards are built
    /// against the new shaders; renderables built against the old ones are
    /// dropped.
    pub fn set_shaders(&mut self, shaders: ShaderLibrary) {
        self.shaders = shaders;
        self.renderables.clear();
    }

    /// Forgets the cached renderable of `component`, e.g. after editing its
    /// meshes, so the next clone rebuilds it.
    pub fn invalidate_renderable(&mut self, component: &Component) {
        self.renderables.remove_component(component.id);
    }
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new(
            Box::new(crate::resources::texture::TextureManager::new()),
            ShaderLibrary::new(),
        )
    }
}
