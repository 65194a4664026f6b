/**
 * This module contains all logic for loading meshes and textures from external files.
 *
 * All I/O here is blocking; component loading happens on the caller's thread.
 */
use std::path::Path;

pub mod mesh;
pub mod texture;

pub fn load_binary(path: &Path) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}

/// The key a component file is stored under: its base filename with the
/// directory stripped, e.g. `props/leg.json` -> `leg.json`.
pub fn storage_key(file: impl AsRef<Path>) -> String {
    file.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
