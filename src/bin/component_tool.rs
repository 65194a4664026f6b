//! Command line tool for component files.
//!
//! Usage:
//!   component-tool inspect table.json         # load a component graph and print it
//!   component-tool convert chair.obj chair.bin  # re-encode an OBJ as a mesh blob

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use component_forge::{
    ComponentManager, Renderable,
    resources::{load_binary, mesh, storage_key},
};

#[derive(Parser)]
#[command(name = "component-tool")]
#[command(about = "Inspect component graphs and convert meshes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a component and its children, then print the store and an instance tree
    Inspect {
        /// Component JSON file
        file: PathBuf,
        /// Storage key to load under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Re-encode a Wavefront OBJ file as a binary mesh blob
    Convert { input: PathBuf, output: PathBuf },
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file, name } => inspect(&file, name),
        Commands::Convert { input, output } => convert(&input, &output),
    }
}

fn inspect(file: &Path, name: Option<String>) -> Result<()> {
    let name = name.unwrap_or_else(|| storage_key(file));
    let mut manager = ComponentManager::default();
    let component = manager
        .load_from_file(file, &name)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    println!("{} components loaded:", manager.len());
    for stored in manager.find_by_name("") {
        let stored = stored.borrow();
        println!(
            "  {} ({} meshes, {} children) in {}",
            stored.name,
            stored.meshes.len(),
            stored.child_references.len(),
            stored.directory.display()
        );
    }

    let mut instance = manager.clone_instance(&component.borrow());
    instance.update_world_transform_all();
    println!("Instance tree:");
    print_tree(&instance, 1);
    manager.destroy();
    Ok(())
}

fn print_tree(node: &Renderable, depth: usize) {
    let indent = "  ".repeat(depth);
    let p = node.world_transform().position;
    println!("{indent}{} at ({:.3}, {:.3}, {:.3})", node.name, p.x, p.y, p.z);
    for part in &node.parts {
        println!(
            "{indent}  - {} [{} vertices, {} triangles]",
            part.name,
            part.geometry.mesh.vertices.len(),
            part.geometry.mesh.triangle_count()
        );
    }
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    let bytes = load_binary(input).with_context(|| format!("Could not read {}", input.display()))?;
    let decoded = mesh::decode_obj(&bytes)?;
    std::fs::write(output, mesh::encode_mesh(&decoded))
        .with_context(|| format!("Could not write {}", output.display()))?;
    println!(
        "Wrote {} ({} vertices, {} triangles)",
        output.display(),
        decoded.vertices.len(),
        decoded.triangle_count()
    );
    Ok(())
}
