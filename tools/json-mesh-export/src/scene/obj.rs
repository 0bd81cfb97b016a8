//! Wavefront OBJ importer
//!
//! Faces are fan-triangulated and every face corner becomes its own vertex,
//! so positions, UVs and normals stay index-aligned. OBJ carries no skeleton
//! or animation data.

use glam::Mat4;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{Scene, SceneMaterial, SceneMesh, SceneNode};
use crate::error::ConvertError;

/// Mesh being accumulated between `o` statements
#[derive(Default)]
struct ObjMeshBuilder {
    name: String,
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    faces: Vec<Vec<u32>>,
    material: Option<String>,
}

impl ObjMeshBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A mesh only keeps UVs/normals when every corner supplied them
    fn finish(self, materials: &mut Vec<SceneMaterial>) -> SceneMesh {
        let vertex_count = self.positions.len();
        let tex_coords = if !self.uvs.is_empty() && self.uvs.len() == vertex_count {
            vec![self.uvs]
        } else {
            Vec::new()
        };
        let normals = (!self.normals.is_empty() && self.normals.len() == vertex_count)
            .then_some(self.normals);

        let material = self.material.map(|name| {
            materials
                .iter()
                .position(|m| m.name.as_deref() == Some(name.as_str()))
                .unwrap_or_else(|| {
                    tracing::warn!("Material '{}' not defined in any material library", name);
                    materials.push(SceneMaterial {
                        name: Some(name),
                        ..Default::default()
                    });
                    materials.len() - 1
                })
        });

        SceneMesh {
            name: self.name,
            positions: self.positions,
            normals,
            tex_coords,
            faces: self.faces,
            material,
            bones: Vec::new(),
        }
    }
}

/// Load an `.obj` file (and any `.mtl` libraries it references)
pub fn load_obj(path: &Path) -> Result<Scene, ConvertError> {
    let file = File::open(path).map_err(|e| ConvertError::import(path, e))?;
    let reader = BufReader::new(file);
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("obj")
        .to_string();

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals_raw: Vec<[f32; 3]> = Vec::new();

    let mut materials: Vec<SceneMaterial> = Vec::new();
    let mut meshes: Vec<SceneMesh> = Vec::new();
    let mut current = ObjMeshBuilder::new(stem.as_str());

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ConvertError::import(path, e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let malformed = |what: &str| {
            ConvertError::import(path, format!("line {}: malformed {}", line_number + 1, what))
        };

        match parts[0] {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&parts[1..]).ok_or_else(|| malformed("vertex"))?;
                positions.push([x, y, z]);
            }
            "vt" => {
                let [u, v] =
                    parse_floats::<2>(&parts[1..]).ok_or_else(|| malformed("texture coordinate"))?;
                tex_coords.push([u, v]);
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&parts[1..]).ok_or_else(|| malformed("normal"))?;
                normals_raw.push([x, y, z]);
            }
            "f" => {
                let counts = (positions.len(), tex_coords.len(), normals_raw.len());
                let face_verts = parts[1..]
                    .iter()
                    .map(|v| parse_obj_vertex(v, counts))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| malformed("face"))?;

                if face_verts.len() < 3 {
                    return Err(malformed("face"));
                }

                // Fan triangulation for convex polygons
                for i in 1..face_verts.len() - 1 {
                    let mut face = Vec::with_capacity(3);
                    for &idx in &[0, i, i + 1] {
                        let (vi, vti, vni) = face_verts[idx];
                        face.push(current.positions.len() as u32);

                        current
                            .positions
                            .push(positions.get(vi).copied().unwrap_or([0.0; 3]));
                        if let Some(ti) = vti {
                            current
                                .uvs
                                .push(tex_coords.get(ti).copied().unwrap_or([0.0; 2]));
                        }
                        if let Some(ni) = vni {
                            current
                                .normals
                                .push(normals_raw.get(ni).copied().unwrap_or([0.0, 1.0, 0.0]));
                        }
                    }
                    current.faces.push(face);
                }
            }
            "o" => {
                let name = parts[1..].join(" ");
                if current.faces.is_empty() {
                    current.name = name;
                } else {
                    let finished = std::mem::replace(&mut current, ObjMeshBuilder::new(name));
                    meshes.push(finished.finish(&mut materials));
                }
            }
            "usemtl" => {
                let name = parts[1..].join(" ");
                if !current.faces.is_empty() && current.material.as_ref() != Some(&name) {
                    tracing::warn!(
                        "Mesh '{}' switches material to '{}'; only one material per mesh is exported",
                        current.name,
                        name
                    );
                }
                current.material = Some(name);
            }
            "mtllib" => {
                for library in &parts[1..] {
                    let mtl_path = base_dir.join(library);
                    match load_mtl(&mtl_path) {
                        Ok(loaded) => materials.extend(loaded),
                        Err(e) => tracing::warn!("Failed to read material library {:?}: {}", mtl_path, e),
                    }
                }
            }
            _ => {}
        }
    }

    if !current.faces.is_empty() {
        meshes.push(current.finish(&mut materials));
    }

    let mut root = SceneNode::new(stem, Mat4::IDENTITY);
    root.meshes = (0..meshes.len()).collect();

    Ok(Scene {
        meshes,
        materials,
        nodes: vec![root],
        root: 0,
        animations: Vec::new(),
    })
}

fn parse_floats<const N: usize>(parts: &[&str]) -> Option<[f32; N]> {
    let mut values = [0.0f32; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part.parse().ok()?;
    }
    (parts.len() >= N).then_some(values)
}

/// Resolve a 1-based (or negative, relative) OBJ index to 0-based
///
/// Indices past the `count` elements defined so far are rejected.
fn resolve_index(s: &str, count: usize) -> Option<usize> {
    let index: i64 = s.parse().ok()?;
    match index {
        i if i > 0 => (i as usize <= count).then(|| i as usize - 1),
        i if i < 0 => count.checked_sub(i.unsigned_abs() as usize),
        _ => None,
    }
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
fn parse_obj_vertex(
    s: &str,
    (positions, tex_coords, normals): (usize, usize, usize),
) -> Option<(usize, Option<usize>, Option<usize>)> {
    let parts: Vec<&str> = s.split('/').collect();

    let vi = resolve_index(parts.first()?, positions)?;

    let optional = |slot: usize, count: usize| -> Option<Option<usize>> {
        match parts.get(slot).filter(|s| !s.is_empty()) {
            Some(s) => resolve_index(s, count).map(Some),
            None => Some(None),
        }
    };

    Some((vi, optional(1, tex_coords)?, optional(2, normals)?))
}

/// Parse the texture slots of an `.mtl` material library
fn load_mtl(path: &Path) -> std::io::Result<Vec<SceneMaterial>> {
    let reader = BufReader::new(File::open(path)?);
    let mut materials: Vec<SceneMaterial> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&keyword, args)) = parts.split_first() else {
            continue;
        };

        if keyword == "newmtl" {
            materials.push(SceneMaterial {
                name: Some(args.join(" ")),
                ..Default::default()
            });
            continue;
        }
        let Some(material) = materials.last_mut() else {
            continue;
        };

        // Map statements may carry options (-bm 1.0 ...); the path comes last
        let map_path = args.last().map(|s| s.to_string());
        match keyword {
            "map_Kd" => material.diffuse_textures.extend(map_path),
            "map_Bump" | "map_bump" | "bump" | "norm" => material.normal_textures.extend(map_path),
            _ => {}
        }
    }

    Ok(materials)
}
