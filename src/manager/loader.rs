//! Loading component files and the component graph they reference.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    data_structures::{component::Component, geometry::Geometry},
    errors::{ComponentError, Result},
    manager::{ComponentManager, SharedComponent},
    resources::{load_binary, mesh::load_mesh_bytes, storage_key, texture::request_mesh_textures},
};

impl ComponentManager {
    /// Loads the component file at `path` and stores it under `storage_name`.
    ///
    /// Loading a name that is already stored returns the stored component
    /// without touching the file.
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        storage_name: &str,
    ) -> Result<SharedComponent> {
        let path = path.as_ref();
        if let Some(loaded) = self.get(storage_name) {
            return Ok(loaded);
        }

        let json_bytes = load_binary(path).map_err(|source| ComponentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.load_from_bytes(&json_bytes, storage_name, directory)
    }

    /// Loads a component from JSON and stores it under `storage_name`.
    /// Mesh, texture and child component paths resolve against `directory`.
    ///
    /// Every mesh binary must decode or the whole load fails and nothing is
    /// stored. Textures and child components are best effort: failures are
    /// logged and the component loads without them. The component is stored
    /// before its children load, so cyclic references terminate.
    pub fn load_from_bytes(
        &mut self,
        json_bytes: &[u8],
        storage_name: &str,
        directory: impl Into<PathBuf>,
    ) -> Result<SharedComponent> {
        if let Some(loaded) = self.get(storage_name) {
            return Ok(loaded);
        }

        let mut component: Component = serde_json::from_slice(json_bytes)?;
        component.directory = directory.into();

        load_meshes(&mut component)?;

        for (mesh_index, mesh) in component.meshes.iter().enumerate() {
            request_mesh_textures(self.textures.as_mut(), &component.directory, mesh_index, mesh);
        }

        let name = component.name.clone();
        let directory = component.directory.clone();
        let child_files: Vec<String> = component
            .child_references
            .iter()
            .map(|child| child.file.clone())
            .collect();
        let shared = self.add(storage_name, component);

        for child_file in child_files {
            let child_key = storage_key(&child_file);
            if self.contains(&child_key) {
                continue;
            }
            if let Err(e) = self.load_from_file(directory.join(&child_file), &child_key) {
                let missing = ComponentError::MissingReference {
                    component: name.clone(),
                    file: child_file,
                };
                log::error!("{missing}\n{e}");
            }
        }

        log::debug!("Component \"{name}\" has been loaded");
        Ok(shared)
    }
}

/// Reads and decodes the binary file of every mesh that names one.
fn load_meshes(component: &mut Component) -> Result<()> {
    let directory = component.directory.clone();
    for (index, mesh) in component.meshes.iter_mut().enumerate() {
        if mesh.bin_file.is_empty() {
            continue;
        }
        let file = mesh.full_bin_file_path(&directory);
        let bytes = load_binary(&file).map_err(|source| ComponentError::MeshRead {
            index,
            file: file.clone(),
            source,
        })?;
        let decoded = load_mesh_bytes(&file, &bytes).map_err(|source| ComponentError::MeshDecode {
            index,
            file: file.clone(),
            source,
        })?;
        let label = format!("{}/{}", component.name, mesh.name);
        mesh.geometry = Some(Arc::new(Geometry::new(label, decoded)));
    }
    Ok(())
}
