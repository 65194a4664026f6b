//! Mesh decoding.
//!
//! Component meshes point at a binary geometry file. The native format is a
//! small little-endian blob:
//!
//! ```text
//! offset  size  field
//! 0       4     magic "CMSH"
//! 4       2     version (1)
//! 6       2     flags: bit0 normals, bit1 uvs, bit2 tangents
//! 8       4     vertex count V
//! 12      4     index count I (multiple of 3)
//! 16      ..    positions  V * [f32; 3]
//!         ..    normals    V * [f32; 3]   if bit0
//!         ..    uvs        V * [f32; 2]   if bit1
//!         ..    tangents   V * [f32; 3]   if bit2
//!         ..    indices    I * u32
//! ```
//!
//! Files ending in `.obj` are read through `tobj` instead.

use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::geometry::{DecodedMesh, ModelVertex},
    errors::MeshDecodeError,
};

pub const MESH_MAGIC: [u8; 4] = *b"CMSH";
pub const MESH_VERSION: u16 = 1;

const FLAG_NORMALS: u16 = 1;
const FLAG_UVS: u16 = 1 << 1;
const FLAG_TANGENTS: u16 = 1 << 2;

const HEADER_LEN: usize = 16;

/// Decodes the geometry in `bytes`, picking the decoder from `file`'s extension.
pub fn load_mesh_bytes(file: &Path, bytes: &[u8]) -> Result<DecodedMesh, MeshDecodeError> {
    let is_obj = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
    if is_obj {
        decode_obj(bytes)
    } else {
        decode_mesh(bytes)
    }
}

struct BlobReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], MeshDecodeError> {
        let end = self.pos.checked_add(len).ok_or(MeshDecodeError::Truncated {
            needed: usize::MAX,
            available: self.bytes.len(),
        })?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(MeshDecodeError::Truncated {
                needed: end,
                available: self.bytes.len(),
            })?;
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, MeshDecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, MeshDecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32s<const N: usize>(&mut self, count: usize) -> Result<Vec<[f32; N]>, MeshDecodeError> {
        let raw = self.take(count.saturating_mul(N * 4))?;
        Ok(raw
            .chunks_exact(N * 4)
            .map(|chunk| {
                let mut out = [0.0; N];
                for (value, bytes) in out.iter_mut().zip(chunk.chunks_exact(4)) {
                    *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                }
                out
            })
            .collect())
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// Decodes a native mesh blob.
pub fn decode_mesh(bytes: &[u8]) -> Result<DecodedMesh, MeshDecodeError> {
    let mut reader = BlobReader { bytes, pos: 0 };
    if bytes.len() < HEADER_LEN {
        return Err(MeshDecodeError::Truncated {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    if reader.take(4)? != MESH_MAGIC.as_slice() {
        return Err(MeshDecodeError::BadMagic);
    }
    let version = reader.u16()?;
    if version != MESH_VERSION {
        return Err(MeshDecodeError::UnsupportedVersion(version));
    }
    let flags = reader.u16()?;
    let vertex_count = reader.u32()? as usize;
    let index_count = reader.u32()? as usize;
    if index_count % 3 != 0 {
        return Err(MeshDecodeError::NotTriangles(index_count));
    }

    let positions = reader.f32s::<3>(vertex_count)?;
    let normals = if flags & FLAG_NORMALS != 0 {
        Some(reader.f32s::<3>(vertex_count)?)
    } else {
        None
    };
    let uvs = if flags & FLAG_UVS != 0 {
        Some(reader.f32s::<2>(vertex_count)?)
    } else {
        None
    };
    let tangents = if flags & FLAG_TANGENTS != 0 {
        Some(reader.f32s::<3>(vertex_count)?)
    } else {
        None
    };
    let raw_indices = reader.take(index_count.saturating_mul(4))?;
    let indices: Vec<u32> = raw_indices
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    if reader.remaining() > 0 {
        return Err(MeshDecodeError::TrailingBytes(reader.remaining()));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(MeshDecodeError::IndexOutOfRange {
            index,
            vertex_count,
        });
    }

    let mut vertices: Vec<ModelVertex> = positions
        .into_iter()
        .enumerate()
        .map(|(i, position)| ModelVertex {
            position,
            tex_coords: uvs.as_ref().map_or([0.0; 2], |uvs| uvs[i]),
            normal: normals.as_ref().map_or([0.0; 3], |normals| normals[i]),
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        })
        .collect();

    match tangents {
        Some(tangents) => {
            for (vertex, tangent) in vertices.iter_mut().zip(tangents) {
                vertex.tangent = tangent;
                let normal = cgmath::Vector3::from(vertex.normal);
                vertex.bitangent = normal.cross(tangent.into()).into();
            }
        }
        None if uvs.is_some() => compute_tangents(&mut vertices, &indices),
        None => {}
    }

    Ok(DecodedMesh { vertices, indices })
}

/// Encodes `mesh` as a native blob. Normals, uvs and tangents are always written.
pub fn encode_mesh(mesh: &DecodedMesh) -> Vec<u8> {
    let vertex_count = mesh.vertices.len();
    let mut out = Vec::with_capacity(HEADER_LEN + vertex_count * 44 + mesh.indices.len() * 4);
    out.extend_from_slice(&MESH_MAGIC);
    out.extend_from_slice(&MESH_VERSION.to_le_bytes());
    out.extend_from_slice(&(FLAG_NORMALS | FLAG_UVS | FLAG_TANGENTS).to_le_bytes());
    out.extend_from_slice(&(vertex_count as u32).to_le_bytes());
    out.extend_from_slice(&(mesh.indices.len() as u32).to_le_bytes());

    let mut put = |values: &[f32]| {
        for value in values {
            out.extend_from_slice(&value.to_le_bytes());
        }
    };
    mesh.vertices.iter().for_each(|v| put(&v.position[..]));
    mesh.vertices.iter().for_each(|v| put(&v.normal[..]));
    mesh.vertices.iter().for_each(|v| put(&v.tex_coords[..]));
    mesh.vertices.iter().for_each(|v| put(&v.tangent[..]));
    for index in &mesh.indices {
        out.extend_from_slice(&index.to_le_bytes());
    }
    out
}

/// Reads every model of an OBJ file into a single mesh.
pub fn decode_obj(bytes: &[u8]) -> Result<DecodedMesh, MeshDecodeError> {
    let mut reader = BufReader::new(Cursor::new(bytes));
    // Materials come from the component JSON, so .mtl files are never read.
    let (models, _) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )?;

    let mut mesh = DecodedMesh::default();
    for m in models {
        let base = mesh.vertices.len() as u32;
        mesh.vertices
            .extend((0..m.mesh.positions.len() / 3).map(|i| ModelVertex {
                position: [
                    m.mesh.positions[i * 3],
                    m.mesh.positions[i * 3 + 1],
                    m.mesh.positions[i * 3 + 2],
                ],
                tex_coords: [
                    m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                    1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                ],
                normal: [
                    m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                ],
                tangent: [0.0; 3],
                bitangent: [0.0; 3],
            }));
        mesh.indices
            .extend(m.mesh.indices.iter().map(|index| index + base));
    }
    compute_tangents(&mut mesh.vertices, &mesh.indices);
    Ok(mesh)
}

/**
 * Blobs without tangents and OBJ files need tangents and bitangents calculated
 * for normal maps to work.
 */
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
        let v0 = vertices[i0];
        let v1 = vertices[i1];
        let v2 = vertices[i2];

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            log::warn!("Skipping triangle {i0}/{i1}/{i2} with degenerate uvs while generating tangents");
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // Flip the bitangent for right-handed normal maps in wgpu's texture space
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            vertices[i].tangent = (tangent + cgmath::Vector3::from(vertices[i].tangent)).into();
            vertices[i].bitangent =
                (bitangent + cgmath::Vector3::from(vertices[i].bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    // Average the tangents/bitangents
    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
    }
}
