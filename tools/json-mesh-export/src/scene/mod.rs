//! Importer-neutral scene graph
//!
//! Importers (glTF, OBJ) translate their documents into a [`Scene`], which is
//! all the rest of the pipeline ever sees. The scene is owned by the load
//! stage and read-only afterwards.

mod gltf;
mod obj;
#[cfg(test)]
pub(crate) mod test_scenes;

use glam::Mat4;
use std::path::Path;

use crate::error::ConvertError;

pub use self::gltf::load_gltf;
pub use self::obj::load_obj;

/// A fully imported scene
#[derive(Debug, Clone)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<SceneMaterial>,
    /// Node arena. `root` indexes into it.
    pub nodes: Vec<SceneNode>,
    pub root: usize,
    pub animations: Vec<SceneAnimation>,
}

/// A node of the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Mat4,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Indices into [`Scene::meshes`]
    pub meshes: Vec<usize>,
}

/// A single mesh as exposed by the importer
#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// UV channels in source order
    pub tex_coords: Vec<Vec<[f32; 2]>>,
    /// Faces as lists of vertex indices (not necessarily triangles)
    pub faces: Vec<Vec<u32>>,
    pub material: Option<usize>,
    pub bones: Vec<SceneBone>,
}

/// A bone as listed by a mesh's skin
#[derive(Debug, Clone)]
pub struct SceneBone {
    pub name: String,
    /// Mesh space to bone space at bind pose
    pub offset_matrix: Mat4,
    pub weights: Vec<VertexWeight>,
}

/// Influence of one bone on one vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

/// Material texture slots the converter cares about
#[derive(Debug, Clone, Default)]
pub struct SceneMaterial {
    pub name: Option<String>,
    pub diffuse_textures: Vec<String>,
    pub normal_textures: Vec<String>,
}

/// An animation clip
#[derive(Debug, Clone)]
pub struct SceneAnimation {
    pub name: String,
    /// Duration in ticks
    pub duration: f64,
    pub ticks_per_second: f64,
    pub channels: Vec<NodeChannel>,
}

/// Keyframes driving one node. Each sequence carries its own timestamps.
#[derive(Debug, Clone, Default)]
pub struct NodeChannel {
    pub node_name: String,
    pub rotation_keys: Vec<QuatKey>,
    pub position_keys: Vec<VectorKey>,
    pub scale_keys: Vec<VectorKey>,
}

/// Time-stamped vector (ticks)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorKey {
    pub time: f64,
    pub value: [f32; 3],
}

/// Time-stamped quaternion `[x, y, z, w]` (ticks)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuatKey {
    pub time: f64,
    pub value: [f32; 4],
}

impl SceneNode {
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            parent: None,
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }
}

impl Scene {
    /// The one mesh this converter exports
    pub fn single_mesh(&self) -> Result<&SceneMesh, ConvertError> {
        match self.meshes.len() {
            0 => Err(ConvertError::NoMesh),
            1 => Ok(&self.meshes[0]),
            n => Err(ConvertError::MultipleMesh(n)),
        }
    }

    /// Depth-first search for a node by name, starting at (and including) `start`
    pub fn find_node(&self, start: usize, name: &str) -> Option<usize> {
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.name == name {
                return Some(index);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// A node whose parent chain never reaches a root
    pub fn find_cycle(&self) -> Option<usize> {
        (0..self.nodes.len()).find(|&start| {
            let mut current = self.nodes[start].parent;
            for _ in 0..self.nodes.len() {
                match current {
                    Some(parent) if parent == start => return true,
                    Some(parent) => current = self.nodes[parent].parent,
                    None => return false,
                }
            }
            current.is_some()
        })
    }

    /// Attach `child` under `parent`
    pub fn link(&mut self, parent: usize, child: usize) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }
}

/// Load a scene, choosing the importer by file extension
pub fn load_scene(path: &Path) -> Result<Scene, ConvertError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let scene = match ext.as_str() {
        "gltf" | "glb" => load_gltf(path)?,
        "obj" => load_obj(path)?,
        _ => {
            return Err(ConvertError::import(
                path,
                "unsupported scene format (use .gltf, .glb, or .obj)",
            ))
        }
    };

    tracing::info!(
        "Loaded {:?}: {} meshes, {} materials, {} nodes, {} animations",
        path,
        scene.meshes.len(),
        scene.materials.len(),
        scene.nodes.len(),
        scene.animations.len()
    );

    Ok(scene)
}
