use std::{rc::Rc, sync::Arc};

use component_forge::{
    ComponentError, ComponentManager, MeshDecodeError,
    context::ShaderLibrary,
    resources::texture::{TextureCache, TextureManager},
};
use serde_json::json;

use crate::common::test_utils::{AssetDir, RecordingTextures};
mod common;

fn table(assets: &AssetDir) -> std::path::PathBuf {
    assets.write_quad("top.bin");
    assets.write_quad("leg.bin");
    assets.write_component(
        "leg.json",
        json!({ "name": "Leg", "meshes": [{ "name": "leg", "binfile": "leg.bin" }] }),
    );
    assets.write_component(
        "table.json",
        json!({
            "name": "Table",
            "meshes": [{ "name": "top", "binfile": "top.bin" }],
            "child_references": [{ "file": "leg.json", "location": [1, 0, 0] }]
        }),
    )
}

#[test]
fn loads_component_with_child() {
    let assets = AssetDir::new();
    let path = table(&assets);
    let mut manager = ComponentManager::default();

    let table = manager.load_from_file(&path, "table.json").unwrap();
    let table = table.borrow();

    assert_eq!(table.name, "Table");
    assert_eq!(table.meshes.len(), 1);
    assert_eq!(table.child_references.len(), 1);
    assert_eq!(table.child_references[0].location, Some([1.0, 0.0, 0.0]));
    assert_eq!(table.directory, assets.path());
    let geometry = table.meshes[0].geometry.as_ref().unwrap();
    assert_eq!(geometry.mesh.triangle_count(), 2);

    assert_eq!(manager.len(), 2);
    let leg = manager.get("leg.json").unwrap();
    assert_eq!(leg.borrow().name, "Leg");
}

#[test]
fn second_load_returns_stored_component() {
    let assets = AssetDir::new();
    let path = table(&assets);
    let mut manager = ComponentManager::default();

    let first = manager.load_from_file(&path, "table.json").unwrap();
    first.borrow_mut().name = "sentinel".to_string();
    std::fs::remove_file(&path).unwrap();

    let second = manager.load_from_file(&path, "table.json").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(second.borrow().name, "sentinel");

    let from_bytes = manager
        .load_from_bytes(b"not json", "table.json", assets.path())
        .unwrap();
    assert!(Rc::ptr_eq(&first, &from_bytes));
}

#[test]
fn cyclic_references_terminate() {
    let assets = AssetDir::new();
    assets.write_component(
        "a.json",
        json!({ "name": "A", "child_references": [{ "file": "b.json" }] }),
    );
    assets.write_component(
        "b.json",
        json!({ "name": "B", "child_references": [{ "file": "a.json" }] }),
    );
    let mut manager = ComponentManager::default();

    manager.load_from_file(assets.join("a.json"), "a.json").unwrap();

    assert_eq!(manager.len(), 2);
    assert_eq!(manager.get("a.json").unwrap().borrow().name, "A");
    assert_eq!(manager.get("b.json").unwrap().borrow().name, "B");
}

#[test]
fn self_reference_terminates() {
    let assets = AssetDir::new();
    let path = assets.write_component(
        "fractal.json",
        json!({ "name": "Fractal", "child_references": [{ "file": "fractal.json" }] }),
    );
    let mut manager = ComponentManager::default();

    manager.load_from_file(&path, "fractal.json").unwrap();
    assert_eq!(manager.len(), 1);
}

#[test]
fn missing_mesh_file_fails_and_registers_nothing() {
    let assets = AssetDir::new();
    assets.write_quad("ok.bin");
    let path = assets.write_component(
        "broken.json",
        json!({
            "name": "Broken",
            "meshes": [
                { "name": "fine", "binfile": "ok.bin" },
                { "name": "gone", "binfile": "missing.bin" }
            ]
        }),
    );
    let mut manager = ComponentManager::default();

    let err = manager.load_from_file(&path, "broken.json").unwrap_err();
    match &err {
        ComponentError::MeshRead { index, file, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(file, &assets.join("missing.bin"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("missing.bin"));
    assert!(manager.get("broken.json").is_none());
    assert!(manager.is_empty());
}

#[test]
fn malformed_mesh_blob_is_a_decode_error() {
    let assets = AssetDir::new();
    assets.write("junk.bin", b"definitely not a mesh");
    let path = assets.write_component(
        "junk.json",
        json!({ "name": "Junk", "meshes": [{ "binfile": "junk.bin" }] }),
    );
    let mut manager = ComponentManager::default();

    let err = manager.load_from_file(&path, "junk.json").unwrap_err();
    assert!(matches!(
        err,
        ComponentError::MeshDecode {
            index: 0,
            source: MeshDecodeError::BadMagic,
            ..
        }
    ));
    assert!(manager.is_empty());
}

#[test]
fn unreadable_and_malformed_component_files() {
    let assets = AssetDir::new();
    let mut manager = ComponentManager::default();

    let err = manager
        .load_from_file(assets.join("nowhere.json"), "nowhere.json")
        .unwrap_err();
    assert!(matches!(err, ComponentError::Io { .. }));

    let bad = assets.write("bad.json", "{ \"name\": ");
    let err = manager.load_from_file(&bad, "bad.json").unwrap_err();
    assert!(matches!(err, ComponentError::Decode(_)));

    let wrong_type = assets.write("wrong.json", r#"{ "name": 42 }"#);
    let err = manager.load_from_file(&wrong_type, "wrong.json").unwrap_err();
    assert!(matches!(err, ComponentError::Decode(_)));
    assert!(manager.is_empty());
}

#[test]
fn unknown_fields_and_missing_fields_are_accepted() {
    let assets = AssetDir::new();
    let mut manager = ComponentManager::default();
    let json = json!({
        "name": "Lamp",
        "editor_color": "#ff00ff",
        "meshes": [{ "name": "shade", "material": { "gloss": 0.5 }, "lod": 2 }],
        "collisions": [{ "type": "box", "size": [1, 1, 1] }]
    });

    let lamp = manager
        .load_from_bytes(json.to_string().as_bytes(), "lamp", assets.path())
        .unwrap();
    let lamp = lamp.borrow();

    assert_eq!(lamp.offset, [0.0; 3]);
    assert_eq!(lamp.meshes[0].scale, [1.0, 1.0, 1.0]);
    assert!(lamp.meshes[0].geometry.is_none());
    assert_eq!(lamp.collisions.len(), 1);
    assert!(lamp.child_references.is_empty());
}

#[test]
fn texture_failures_do_not_fail_the_load() {
    let assets = AssetDir::new();
    assets.write_quad("crate.bin");
    assets.write_png("tex/wood.png");
    assets.write_png("detail.png");
    let path = assets.write_component(
        "crate.json",
        json!({
            "name": "Crate",
            "meshes": [{
                "name": "box",
                "binfile": "crate.bin",
                "material": {
                    "textures": ["detail.png"],
                    "diffuse": "tex/wood.png",
                    "normals": "tex/missing_normals.png"
                }
            }]
        }),
    );
    let textures = RecordingTextures::default();
    let mut manager = textures.manager();

    manager.load_from_file(&path, "crate.json").unwrap();

    let requests = textures.requests.borrow();
    assert_eq!(
        *requests,
        vec![
            ("detail.png".to_string(), assets.join("detail.png")),
            ("tex/wood.png".to_string(), assets.join("tex/wood.png")),
            (
                "tex/missing_normals.png".to_string(),
                assets.join("tex/missing_normals.png")
            ),
        ]
    );
    assert!(manager.textures().get_texture("tex/wood.png").is_some());
    assert!(manager.textures().get_texture("tex/missing_normals.png").is_none());
}

#[test]
fn shared_textures_are_loaded_once() {
    let assets = AssetDir::new();
    assets.write_png("wood.png");
    let material = json!({ "diffuse": "wood.png" });
    assets.write_component(
        "chair.json",
        json!({ "name": "Chair", "meshes": [{ "material": material.clone() }] }),
    );
    let path = assets.write_component(
        "desk.json",
        json!({
            "name": "Desk",
            "meshes": [{ "material": material }],
            "child_references": [{ "file": "chair.json" }]
        }),
    );
    let mut manager = ComponentManager::default();

    manager.load_from_file(&path, "desk.json").unwrap();

    let wood = manager.textures().get_texture("wood.png").unwrap();
    assert_eq!(wood.key, "wood.png");
    assert_eq!(wood.dimensions(), (2, 2));
    assert_eq!(manager.len(), 2);
}

#[test]
fn missing_diffuse_texture_does_not_fail_the_load() {
    let assets = AssetDir::new();
    assets.write_quad("crate.bin");
    let path = assets.write_component(
        "crate.json",
        json!({
            "name": "Crate",
            "meshes": [{
                "name": "box",
                "binfile": "crate.bin",
                "material": { "diffuse": "tex/no_such_wood.png" }
            }]
        }),
    );
    let mut manager = ComponentManager::default();

    let loaded = manager.load_from_file(&path, "crate.json").unwrap();

    assert!(manager.textures().get_texture("tex/no_such_wood.png").is_none());
    assert!(loaded.borrow().meshes[0].geometry.is_some());
    let instance = manager.clone_instance(&loaded.borrow());
    assert_eq!(instance.parts.len(), 1);
    assert!(instance.parts[0].material.diffuse.is_none());
}

#[test]
fn cached_textures_are_not_read_again() {
    let assets = AssetDir::new();
    let wood_path = assets.write_png("wood.png");
    let material = json!({ "diffuse": "wood.png" });
    let chair = assets.write_component(
        "chair.json",
        json!({ "name": "Chair", "meshes": [{ "material": material.clone() }] }),
    );
    let desk = assets.write_component(
        "desk.json",
        json!({ "name": "Desk", "meshes": [{ "material": material }] }),
    );
    let mut manager = ComponentManager::new(Box::new(TextureManager::new()), ShaderLibrary::new());

    manager.load_from_file(&chair, "chair.json").unwrap();
    let first = manager.textures().get_texture("wood.png").unwrap();
    std::fs::remove_file(&wood_path).unwrap();
    manager.load_from_file(&desk, "desk.json").unwrap();
    let second = manager.textures().get_texture("wood.png").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let mut textures = TextureManager::new();
    assets.write_png("stone.png");
    let stone = textures.load_texture("stone.png", &assets.join("stone.png")).unwrap();
    std::fs::remove_file(assets.join("stone.png")).unwrap();
    let again = textures.load_texture("stone.png", &assets.join("stone.png")).unwrap();
    assert!(Arc::ptr_eq(&stone, &again));
    assert_eq!(textures.len(), 1);
}

#[test]
fn children_are_stored_under_their_file_name() {
    let assets = AssetDir::new();
    assets.write_component("props/lamp.json", json!({ "name": "Lamp" }));
    assets.write_component("props/rug.json", json!({ "name": "Rug" }));
    let path = assets.write_component(
        "room.json",
        json!({
            "name": "Room",
            "child_references": [
                { "file": "props/lamp.json" },
                { "file": "props/rug.json" }
            ]
        }),
    );
    let mut manager = ComponentManager::default();

    manager.load_from_file(&path, "living room").unwrap();

    assert_eq!(manager.len(), 3);
    assert_eq!(manager.get("living room").unwrap().borrow().name, "Room");
    assert_eq!(manager.get("lamp.json").unwrap().borrow().name, "Lamp");
    assert_eq!(manager.get("rug.json").unwrap().borrow().name, "Rug");
    assert_eq!(
        manager.get("lamp.json").unwrap().borrow().directory,
        assets.join("props")
    );
}

#[test]
fn broken_children_are_skipped() {
    let assets = AssetDir::new();
    assets.write_component(
        "wobbly.json",
        json!({ "name": "Wobbly", "meshes": [{ "binfile": "nope.bin" }] }),
    );
    assets.write_component("stool.json", json!({ "name": "Stool" }));
    let path = assets.write_component(
        "bar.json",
        json!({
            "name": "Bar",
            "child_references": [
                { "file": "absent.json" },
                { "file": "wobbly.json" },
                { "file": "stool.json" }
            ]
        }),
    );
    let mut manager = ComponentManager::default();

    let bar = manager.load_from_file(&path, "bar.json").unwrap();

    assert_eq!(bar.borrow().child_references.len(), 3);
    assert!(manager.get("absent.json").is_none());
    assert!(manager.get("wobbly.json").is_none());
    assert!(manager.get("stool.json").is_some());
}

#[test]
fn loads_obj_meshes() {
    let assets = AssetDir::new();
    assets.write(
        "tri.obj",
        "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n",
    );
    let path = assets.write_component(
        "tri.json",
        json!({ "name": "Tri", "meshes": [{ "binfile": "tri.obj" }] }),
    );
    let mut manager = ComponentManager::default();

    let tri = manager.load_from_file(&path, "tri.json").unwrap();
    let tri = tri.borrow();
    let geometry = tri.meshes[0].geometry.as_ref().unwrap();
    assert_eq!(geometry.mesh.vertices.len(), 3);
    assert_eq!(geometry.mesh.indices, vec![0, 1, 2]);
}
