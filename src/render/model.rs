//! OBJ mesh loading into GPU vertex/index buffers.

use std::{path::Path, sync::Arc};

use vulkano::{
  buffer::{Buffer, BufferCreateInfo, BufferUsage, Subbuffer},
  memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator},
};

use crate::render::vertex::{Normal, Position, TexCoord};

/// GPU buffers for one triangulated mesh, one buffer per vertex attribute
/// plus the triangle indices.
pub struct MeshBuffers {
  pub positions: Subbuffer<[Position]>,
  pub normals: Subbuffer<[Normal]>,
  pub tex_coords: Subbuffer<[TexCoord]>,
  pub indices: Subbuffer<[u32]>,
}

/// Loads an OBJ file (triangulated) and uploads its first mesh.
///
/// Meshes without normals or texture coordinates get filled-in defaults so
/// every object can go through the same pipeline.
///
/// # Panics
/// Panics if the file is missing or malformed, or if buffer allocation
/// fails; asset problems are fatal at startup.
pub fn load_mesh(
  memory_allocator: Arc<StandardMemoryAllocator>,
  path: impl AsRef<Path>,
) -> MeshBuffers {
  let (positions, normals, tex_coords, indices) = {
    let model = tobj::load_obj(
      path.as_ref(),
      &tobj::LoadOptions {
        triangulate: true,
        ..Default::default()
      },
    )
    .unwrap();

    let mesh = &model.0[0].mesh;
    let vertex_count = mesh.positions.len() / 3;

    let positions = mesh
      .positions
      .chunks(3)
      .map(|xyz| Position {
        position: [xyz[0], xyz[1], xyz[2]],
      })
      .collect::<Vec<_>>();

    let normals = if mesh.normals.is_empty() {
      vec![Normal { normal: [0.0, 1.0, 0.0] }; vertex_count]
    } else {
      mesh
        .normals
        .chunks(3)
        .map(|xyz| Normal {
          normal: [xyz[0], xyz[1], xyz[2]],
        })
        .collect()
    };

    let tex_coords = if mesh.texcoords.is_empty() {
      vec![TexCoord { tex_coord: [0.0, 0.0] }; vertex_count]
    } else {
      mesh
        .texcoords
        .chunks(2)
        .map(|uv| TexCoord {
          tex_coord: [uv[0], 1.0 - uv[1]],
        })
        .collect()
    };

    let indices = mesh.indices.clone();

    (positions, normals, tex_coords, indices)
  };

  let buffer_info = |usage: BufferUsage| BufferCreateInfo {
    usage,
    ..Default::default()
  };
  let allocation = || AllocationCreateInfo {
    memory_type_filter: MemoryTypeFilter::PREFER_DEVICE | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
    ..Default::default()
  };

  let positions = Buffer::from_iter(
    memory_allocator.clone(),
    buffer_info(BufferUsage::VERTEX_BUFFER),
    allocation(),
    positions,
  )
  .unwrap();

  let normals = Buffer::from_iter(
    memory_allocator.clone(),
    buffer_info(BufferUsage::VERTEX_BUFFER),
    allocation(),
    normals,
  )
  .unwrap();

  let tex_coords = Buffer::from_iter(
    memory_allocator.clone(),
    buffer_info(BufferUsage::VERTEX_BUFFER),
    allocation(),
    tex_coords,
  )
  .unwrap();

  let indices = Buffer::from_iter(
    memory_allocator,
    buffer_info(BufferUsage::INDEX_BUFFER),
    allocation(),
    indices,
  )
  .unwrap();

  MeshBuffers {
    positions,
    normals,
    tex_coords,
    indices,
  }
}
