//! Conversion error taxonomy.
//!
//! Every variant is terminal for a run: nothing is written once one of these
//! is returned.

use std::path::PathBuf;

/// Error raised by any stage of the conversion pipeline
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The import collaborator could not read or parse the input
    #[error("failed to import {path:?}: {message}")]
    Import { path: PathBuf, message: String },

    /// The scene contains no meshes
    #[error("no meshes found in scene")]
    NoMesh,

    /// The scene contains more than one mesh
    #[error("scene contains {0} meshes, please export only 1 mesh")]
    MultipleMesh(usize),

    /// A face is not a triangle
    #[error("face {face} has {count} indices, only triangulated meshes are supported")]
    NonTriangularFace { face: usize, count: usize },

    /// A face references a vertex that does not exist
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// The configured armature node is not in the scene
    #[error("armature node '{0}' not found in scene hierarchy")]
    MissingArmature(String),

    /// A bone has no node in the searched hierarchy
    #[error("bone '{0}' has no matching node in the scene hierarchy")]
    MissingBoneNode(String),

    /// A bone's local transform is singular or non-finite
    #[error("local transform of bone '{bone}' cannot be decomposed (determinant {determinant})")]
    Decomposition { bone: String, determinant: f32 },

    /// Rotation/position/scale keys of one bone do not share a timeline
    #[error("keyframes of bone '{bone}' in clip '{clip}' are misaligned: {detail}")]
    MisalignedKeyframes {
        bone: String,
        clip: String,
        detail: String,
    },

    /// The requested animation clip does not exist
    #[error("animation clip '{name}' not found, available clips: {available:?}")]
    UnknownClip { name: String, available: Vec<String> },

    /// The document could not be serialized
    #[error("failed to serialize JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The output file could not be written
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn import(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Import {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
