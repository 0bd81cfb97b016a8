//! three.js legacy JSON model format (formatVersion 3.1)
//!
//! Field order of every struct matches the order the format lists them in.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::animation::{AnimationClip, Keyframe};
use crate::config::OutputConfig;
use crate::error::ConvertError;
use crate::mesh::FlatMesh;
use crate::skeleton::{Skeleton, SkinBinding};

pub const FORMAT_VERSION: f64 = 3.1;

/// Face type bitmask: triangle with material index and vertex UVs
pub const FACE_TYPE_TAG: u32 = 10;

/// Material index written after every face
pub const FACE_MATERIAL_INDEX: u32 = 0;

/// `DbgColor` of the single material (0xeeeeee)
pub const DEBUG_COLOR: u32 = 15658734;

/// Complete output document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDocument {
    /// x, y, z per vertex
    pub vertices: Vec<f32>,
    /// One channel of u, v per vertex
    pub uvs: Vec<Vec<f32>>,
    /// 8 entries per triangle
    pub faces: Vec<u32>,
    pub normals: Vec<f32>,
    pub metadata: LegacyMetadata,
    pub materials: Vec<LegacyMaterial>,
    pub bones: Vec<LegacyBone>,
    pub skin_indices: Vec<u32>,
    pub skin_weights: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<LegacyAnimation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMetadata {
    pub format_version: f64,
    pub generated_by: String,
    pub vertices: usize,
    pub faces: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyMaterial {
    #[serde(rename = "DbgColor")]
    pub dbg_color: u32,
    #[serde(rename = "DbgIndex")]
    pub dbg_index: u32,
    #[serde(rename = "DbgName")]
    pub dbg_name: String,
    /// Empty when the material has no diffuse texture
    #[serde(rename = "mapDiffuse")]
    pub map_diffuse: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBone {
    pub name: String,
    /// Bone index, or -1 for roots
    pub parent: i64,
    pub pos: [f32; 3],
    pub scl: [f32; 3],
    /// Quaternion [x, y, z, w]
    pub rotq: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyAnimation {
    pub name: String,
    /// Duration in ticks
    pub length: f64,
    /// Ticks per second
    pub fps: f64,
    #[serde(rename = "JIT")]
    pub jit: u32,
    /// One entry per bone, in bone-index order
    pub hierarchy: Vec<LegacyHierarchy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyHierarchy {
    pub parent: i64,
    pub keys: Vec<LegacyKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyKey {
    pub time: f64,
    pub rot: [f32; 4],
    pub pos: [f32; 3],
    pub scl: [f32; 3],
}

/// The selected clip with the aligned keyframes of every bone
#[derive(Debug, Clone)]
pub struct ClipKeys<'a> {
    pub clip: &'a AnimationClip,
    /// Indexed by bone
    pub bones: Vec<Vec<Keyframe>>,
}

fn parent_index(parent: Option<usize>) -> i64 {
    parent.map_or(-1, |p| p as i64)
}

/// Assemble the output document
pub fn build_document(
    mesh: &FlatMesh,
    skeleton: &Skeleton,
    skin: &SkinBinding,
    clip: Option<ClipKeys<'_>>,
    config: &OutputConfig,
) -> LegacyDocument {
    tracing::info!("Building JSON");

    let vertices = mesh.vertices.iter().flatten().copied().collect();
    let normals = mesh.normals.iter().flatten().copied().collect();
    let uvs = vec![mesh.uvs.iter().flatten().copied().collect()];

    let mut faces = Vec::with_capacity(mesh.face_count * 8);
    for tri in mesh.indices.chunks_exact(3) {
        faces.push(FACE_TYPE_TAG);
        faces.extend_from_slice(tri);
        faces.push(FACE_MATERIAL_INDEX);
        faces.extend_from_slice(tri);
    }

    let materials = vec![LegacyMaterial {
        dbg_color: DEBUG_COLOR,
        dbg_index: 0,
        dbg_name: mesh
            .material_name
            .clone()
            .unwrap_or_else(|| config.material_name.clone()),
        map_diffuse: mesh.diffuse_map.clone().unwrap_or_default(),
    }];

    let bones = skeleton
        .bones
        .iter()
        .map(|bone| LegacyBone {
            name: bone.name.clone(),
            parent: parent_index(bone.parent),
            pos: bone.local.position,
            scl: bone.local.scale,
            rotq: bone.local.rotation,
        })
        .collect();

    let animation = clip.map(|clip| LegacyAnimation {
        name: clip.clip.name.clone(),
        length: clip.clip.duration,
        fps: clip.clip.ticks_per_second,
        jit: 0,
        hierarchy: skeleton
            .bones
            .iter()
            .zip(clip.bones)
            .map(|(bone, keys)| LegacyHierarchy {
                parent: parent_index(bone.parent),
                keys: keys
                    .into_iter()
                    .map(|key| LegacyKey {
                        time: key.time,
                        rot: key.transform.rotation,
                        pos: key.transform.position,
                        scl: key.transform.scale,
                    })
                    .collect(),
            })
            .collect(),
    });

    LegacyDocument {
        vertices,
        uvs,
        faces,
        normals,
        metadata: LegacyMetadata {
            format_version: FORMAT_VERSION,
            generated_by: config.generated_by.clone(),
            vertices: mesh.vertices.len(),
            faces: mesh.face_count,
            description: config.description.clone(),
        },
        materials,
        bones,
        skin_indices: skin.skin_indices(),
        skin_weights: skin.skin_weights(),
        animation,
    }
}

/// Serialize `doc` and write it to `path`
///
/// The document is rendered fully in memory first, so a serialization
/// failure never leaves a partial file behind.
pub fn write_document(path: &Path, doc: &LegacyDocument, pretty: bool) -> Result<(), ConvertError> {
    let json = if pretty {
        serde_json::to_string_pretty(doc)?
    } else {
        serde_json::to_string(doc)?
    };

    fs::write(path, json).map_err(|source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Wrote {:?}", path);
    Ok(())
}
