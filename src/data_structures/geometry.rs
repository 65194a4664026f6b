//! Mesh geometry shared between a component and all of its instances.
//!
//! A [`Geometry`] is created once per component mesh when the component is
//! loaded. Renderables only ever hold an `Arc<Geometry>`, so cloning an
//! instance never duplicates vertex data or GPU buffers.

use std::sync::OnceLock;

use wgpu::util::DeviceExt;

/// Describes how a vertex type is laid out in a GPU buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// CPU-side triangle mesh produced by the mesh loader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedMesh {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl DecodedMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Vertex and index buffers living on the GPU.
#[derive(Debug)]
pub struct GpuBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

/// Decoded mesh data plus its GPU buffers, uploaded on first use.
#[derive(Debug)]
pub struct Geometry {
    pub label: String,
    pub mesh: DecodedMesh,
    buffers: OnceLock<GpuBuffers>,
}

impl Geometry {
    pub fn new(label: impl Into<String>, mesh: DecodedMesh) -> Self {
        Self {
            label: label.into(),
            mesh,
            buffers: OnceLock::new(),
        }
    }

    /// Returns the GPU buffers, creating them on the first call.
    pub fn upload(&self, device: &wgpu::Device) -> &GpuBuffers {
        self.buffers.get_or_init(|| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", self.label)),
                contents: bytemuck::cast_slice(&self.mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", self.label)),
                contents: bytemuck::cast_slice(&self.mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            GpuBuffers {
                vertex_buffer,
                index_buffer,
                num_elements: self.mesh.indices.len() as u32,
            }
        })
    }

    pub fn buffers(&self) -> Option<&GpuBuffers> {
        self.buffers.get()
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffers.get().is_some()
    }

    /// Frees the GPU buffers if they were ever created.
    ///
    /// Only the owning component calls this; instances holding the same
    /// `Arc` see destroyed buffers afterwards and must not be drawn.
    pub fn release(&self) {
        if let Some(buffers) = self.buffers.get() {
            log::debug!("Releasing GPU buffers of {}", self.label);
            buffers.vertex_buffer.destroy();
            buffers.index_buffer.destroy();
        }
    }
}
