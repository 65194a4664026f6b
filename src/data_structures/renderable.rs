//! Renderable trees.
//!
//! A [`Renderable`] is one node of a hierarchy: the mesh parts it draws, a
//! local transform and its child nodes.
//! Geometry, textures and shaders are shared through `Arc`s; transforms are
//! plain values. Cloning a renderable therefore yields an independent
//! instance that draws from the same GPU resources.

use std::sync::Arc;

use crate::{
    context::ShaderProgram,
    data_structures::{
        geometry::Geometry,
        instance::{Instance, InstanceRaw},
        texture::TextureHandle,
    },
};

/// Textures and shader a node is drawn with.
#[derive(Clone, Debug)]
pub struct RenderMaterial {
    pub diffuse: Option<TextureHandle>,
    pub normals: Option<TextureHandle>,
    pub specular: Option<TextureHandle>,
    pub textures: Vec<TextureHandle>,
    pub shader: Option<Arc<ShaderProgram>>,
    pub diffuse_color: [f32; 4],
}

impl Default for RenderMaterial {
    fn default() -> Self {
        Self {
            diffuse: None,
            normals: None,
            specular: None,
            textures: Vec::new(),
            shader: None,
            diffuse_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Shared geometry drawn with a material, placed relative to its node.
#[derive(Clone, Debug)]
pub struct RenderPart {
    pub name: String,
    pub local: Instance,
    pub geometry: Arc<Geometry>,
    pub material: RenderMaterial,
}

/// A node of a renderable hierarchy.
#[derive(Clone, Debug, Default)]
pub struct Renderable {
    pub name: String,
    pub local: Instance,
    world: Instance,
    pub parts: Vec<RenderPart>,
    pub children: Vec<Renderable>,
}

/// One part to draw, placed by its world transform.
#[derive(Debug)]
pub struct DrawItem<'a> {
    pub name: &'a str,
    pub geometry: &'a Arc<Geometry>,
    pub material: &'a RenderMaterial,
    pub world: Instance,
}

impl Renderable {
    /// A node without parts.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_part(&mut self, part: RenderPart) {
        self.parts.push(part);
    }

    pub fn add_child(&mut self, child: Renderable) {
        self.children.push(child);
    }

    pub fn world_transform(&self) -> &Instance {
        &self.world
    }

    /// Recomputes the world transforms of this subtree below `parent`.
    pub fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    /// Recomputes the world transforms treating this node as a root.
    pub fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Instance::default());
    }

    /// Number of nodes in this subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Renderable::node_count).sum::<usize>()
    }

    /// Whether any part of this tree draws the exact same geometry as any
    /// part of `other`.
    pub fn shares_geometry_with(&self, other: &Renderable) -> bool {
        let mine = self.geometries();
        other
            .geometries()
            .iter()
            .any(|theirs| mine.iter().any(|g| Arc::ptr_eq(g, theirs)))
    }

    fn geometries(&self) -> Vec<&Arc<Geometry>> {
        let mut out = Vec::new();
        self.visit(&mut |node| out.extend(node.parts.iter().map(|part| &part.geometry)));
        out
    }

    /// Depth-first, pre-order walk over the subtree.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Renderable)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Flattens the tree into draw items using the last computed world
    /// transforms. Call [`update_world_transform_all`](Self::update_world_transform_all) first.
    pub fn draw_items(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        self.visit(&mut |node| {
            for part in &node.parts {
                items.push(DrawItem {
                    name: &part.name,
                    geometry: &part.geometry,
                    material: &part.material,
                    world: &node.world * &part.local,
                });
            }
        });
        items
    }

    /// Per-instance buffer contents, one entry per draw item.
    pub fn instance_data(&self) -> Vec<InstanceRaw> {
        self.draw_items()
            .iter()
            .map(|item| item.world.to_raw())
            .collect()
    }

    /// Uploads every geometry and texture of the tree that is not on the
    /// GPU yet. Shared resources are uploaded once.
    pub fn write_to_buffers(&self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.visit(&mut |node| {
            for part in &node.parts {
                part.geometry.upload(device);
                let material = &part.material;
                if let Some(diffuse) = &material.diffuse {
                    diffuse.upload(device, queue, false);
                }
                if let Some(normals) = &material.normals {
                    normals.upload(device, queue, true);
                }
                if let Some(specular) = &material.specular {
                    specular.upload(device, queue, false);
                }
                for texture in &material.textures {
                    texture.upload(device, queue, false);
                }
            }
        });
    }
}
