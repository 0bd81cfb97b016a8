//! Mesh flattener
//!
//! Copies the single exported mesh into flat vertex/normal/UV/index arrays
//! and resolves its texture paths.

use glam::Vec3;

use crate::error::ConvertError;
use crate::scene::{Scene, SceneMesh};

/// Flattened mesh, immutable once built
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMesh {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    /// Unit normals, empty when the source has none
    pub normals: Vec<[f32; 3]>,
    /// First UV channel, empty when the source has none
    pub uvs: Vec<[f32; 2]>,
    /// Triangle vertex indices, 3 per face
    pub indices: Vec<u32>,
    pub face_count: usize,
    pub material_name: Option<String>,
    pub diffuse_map: Option<String>,
    /// Extracted but never emitted
    pub normal_map: Option<String>,
}

/// Flatten `mesh` (which must belong to `scene`)
pub fn flatten_mesh(scene: &Scene, mesh: &SceneMesh) -> Result<FlatMesh, ConvertError> {
    let vertex_count = mesh.positions.len();
    tracing::info!("Mesh '{}': {} vertices", mesh.name, vertex_count);

    let normals = match &mesh.normals {
        Some(normals) => {
            tracing::info!("Vertex normals found");
            normals
                .iter()
                .map(|&n| Vec3::from(n).normalize_or_zero().to_array())
                .collect()
        }
        None => {
            tracing::info!("Precalculated normals from source not found");
            Vec::new()
        }
    };

    if mesh.tex_coords.len() > 1 {
        tracing::debug!(
            "Mesh has {} UV channels, only the first is exported",
            mesh.tex_coords.len()
        );
    }
    let uvs = mesh.tex_coords.first().cloned().unwrap_or_default();

    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    for (face, corners) in mesh.faces.iter().enumerate() {
        if corners.len() != 3 {
            return Err(ConvertError::NonTriangularFace {
                face,
                count: corners.len(),
            });
        }
        if let Some(&index) = corners.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ConvertError::IndexOutOfRange {
                face,
                index,
                vertex_count,
            });
        }
        indices.extend_from_slice(corners);
    }
    tracing::info!("Mesh '{}': {} faces", mesh.name, mesh.faces.len());

    let material = mesh.material.and_then(|index| scene.materials.get(index));
    let (material_name, diffuse_map, normal_map) = match material {
        Some(material) => {
            let diffuse = material.diffuse_textures.first().cloned();
            match &diffuse {
                Some(path) => tracing::info!("Diffuse map found: {}", path),
                None => tracing::info!("No diffuse map found"),
            }
            (
                material.name.clone(),
                diffuse,
                material.normal_textures.first().cloned(),
            )
        }
        None => {
            tracing::info!("No materials found");
            (None, None, None)
        }
    };

    Ok(FlatMesh {
        name: mesh.name.clone(),
        vertices: mesh.positions.clone(),
        normals,
        uvs,
        indices,
        face_count: mesh.faces.len(),
        material_name,
        diffuse_map,
        normal_map,
    })
}
