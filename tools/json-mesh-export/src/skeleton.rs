//! Skeleton extraction and skin binning
//!
//! Bones are discovered in the order the mesh lists them. Parent links are
//! resolved in a second pass once every bone is known, so a child listed
//! before its parent still resolves.

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::animation::{collect_tracks, AnimationClip, BoneTracks, Trs};
use crate::config::{ArmatureRoot, DecompositionPolicy, InfluencePolicy, SkeletonConfig};
use crate::error::ConvertError;
use crate::scene::{Scene, SceneMesh};

/// Bone influences kept per vertex
pub const MAX_INFLUENCES: usize = 2;

/// Matrices with a smaller determinant magnitude are not decomposed
pub const SINGULAR_DETERMINANT: f32 = 1e-8;

/// A bone of the exported skeleton
#[derive(Debug, Clone)]
pub struct Bone {
    /// Discovery order, dense `0..B`
    pub index: usize,
    pub name: String,
    /// `None` for root bones
    pub parent: Option<usize>,
    /// Name of the parent node in the scene hierarchy
    pub parent_name: Option<String>,
    /// Inverse bind matrix
    pub offset_matrix: Mat4,
    /// Node-local transform
    pub node_transform: Mat4,
    /// `node_transform` decomposed
    pub local: Trs,
    /// Sparse vertex weights
    pub weights: BTreeMap<u32, f32>,
    pub tracks: BoneTracks,
}

/// Bones of the exported mesh plus the clips that animate them
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
    pub clips: Vec<AnimationClip>,
    /// Node the root bones hang off, when there is one
    pub armature: Option<String>,
}

impl Skeleton {
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Index of the clip called `name`
    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.name == name)
    }
}

/// Build the skeleton of `mesh`, with its animation tracks
///
/// A mesh without bones yields an empty skeleton and no clips.
pub fn extract_skeleton(
    scene: &Scene,
    mesh: &SceneMesh,
    config: &SkeletonConfig,
) -> Result<Skeleton, ConvertError> {
    if mesh.bones.is_empty() {
        tracing::info!("Mesh '{}' has no bones", mesh.name);
        return Ok(Skeleton::default());
    }

    let armature_root = config.armature_root();
    let (search_root, mut armature) = match &armature_root {
        ArmatureRoot::Named(name) => {
            let node = scene
                .find_node(scene.root, name)
                .ok_or_else(|| ConvertError::MissingArmature(name.clone()))?;
            (node, Some(name.clone()))
        }
        ArmatureRoot::Auto => (scene.root, None),
    };

    tracing::info!("Bones found; loading {} bones", mesh.bones.len());

    // Pass 1: every bone with its node data
    let mut bones = Vec::with_capacity(mesh.bones.len());
    for (index, scene_bone) in mesh.bones.iter().enumerate() {
        let node_index = scene
            .find_node(search_root, &scene_bone.name)
            .ok_or_else(|| ConvertError::MissingBoneNode(scene_bone.name.clone()))?;
        let node = &scene.nodes[node_index];

        let local = decompose(&scene_bone.name, &node.transform, config.decomposition)?;
        let weights: BTreeMap<u32, f32> = scene_bone
            .weights
            .iter()
            .map(|w| (w.vertex, w.weight))
            .collect();

        tracing::debug!(
            "Bone {} '{}': {} weights, pos {:?}",
            index,
            scene_bone.name,
            weights.len(),
            local.position
        );

        bones.push(Bone {
            index,
            name: scene_bone.name.clone(),
            parent: None,
            parent_name: node.parent.map(|p| scene.nodes[p].name.clone()),
            offset_matrix: scene_bone.offset_matrix,
            node_transform: node.transform,
            local,
            weights,
            tracks: BoneTracks::new(),
        });
    }

    // Pass 2: parent names to bone indices
    let lookup: HashMap<&str, usize> = bones
        .iter()
        .map(|bone| (bone.name.as_str(), bone.index))
        .collect();

    let mut parents = Vec::with_capacity(bones.len());
    for bone in &bones {
        let Some(parent_name) = bone.parent_name.as_deref() else {
            parents.push(None);
            continue;
        };
        if let Some(&parent) = lookup.get(parent_name) {
            parents.push(Some(parent));
            continue;
        }
        let expected = armature.get_or_insert_with(|| parent_name.to_string());
        if expected.as_str() != parent_name {
            tracing::warn!(
                "Bone '{}' hangs off '{}', not the armature '{}'; treating it as a root",
                bone.name,
                parent_name,
                expected
            );
        }
        parents.push(None);
    }

    let (clips, tracks) = collect_tracks(scene, &lookup, bones.len());
    drop(lookup);

    for ((bone, parent), tracks) in bones.iter_mut().zip(parents).zip(tracks) {
        bone.parent = parent;
        bone.tracks = tracks;
    }

    match &armature {
        Some(name) => tracing::info!("Armature: '{}'", name),
        None => tracing::info!("Root bones sit at the scene root"),
    }

    Ok(Skeleton {
        bones,
        clips,
        armature,
    })
}

fn decompose(bone: &str, matrix: &Mat4, policy: DecompositionPolicy) -> Result<Trs, ConvertError> {
    let determinant = matrix.determinant();
    if !matrix.is_finite() || !determinant.is_finite() || determinant.abs() < SINGULAR_DETERMINANT {
        return match policy {
            DecompositionPolicy::Fail => Err(ConvertError::Decomposition {
                bone: bone.to_string(),
                determinant,
            }),
            DecompositionPolicy::Identity => {
                tracing::warn!(
                    "Bone '{}' has a singular transform (det {}); using identity",
                    bone,
                    determinant
                );
                Ok(Trs::default())
            }
        };
    }

    let (scale, rotation, translation): (Vec3, Quat, Vec3) = matrix.to_scale_rotation_translation();
    Ok(Trs {
        position: translation.to_array(),
        rotation: rotation.to_array(),
        scale: scale.to_array(),
    })
}

/// One bone's pull on one vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    pub bone: usize,
    pub weight: f32,
}

/// Per-vertex bone influences, capped at [`MAX_INFLUENCES`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinBinding {
    /// One entry per vertex; empty when the skeleton has no bones
    pub influences: Vec<SmallVec<[Influence; MAX_INFLUENCES]>>,
}

impl SkinBinding {
    pub fn is_empty(&self) -> bool {
        self.influences.is_empty()
    }

    /// `skinIndices`: the first slot's bone, then a fixed 0
    pub fn skin_indices(&self) -> Vec<u32> {
        self.influences
            .iter()
            .flat_map(|slots| {
                let bone = slots.first().map_or(0, |i| i.bone as u32);
                [bone, 0]
            })
            .collect()
    }

    /// `skinWeights`: the first slot's weight, then a fixed 0
    pub fn skin_weights(&self) -> Vec<f32> {
        self.influences
            .iter()
            .flat_map(|slots| {
                let weight = slots.first().map_or(0.0, |i| i.weight);
                [weight, 0.0]
            })
            .collect()
    }
}

/// Bin bone weights into per-vertex slots
pub fn bin_skin_weights(bones: &[Bone], vertex_count: usize, policy: InfluencePolicy) -> SkinBinding {
    if bones.is_empty() {
        return SkinBinding::default();
    }

    let mut influences: Vec<SmallVec<[Influence; MAX_INFLUENCES]>> =
        vec![SmallVec::new(); vertex_count];
    let mut dropped = 0usize;

    for bone in bones {
        for (&vertex, &weight) in &bone.weights {
            let Some(slots) = influences.get_mut(vertex as usize) else {
                tracing::warn!(
                    "Bone '{}' weights vertex {}, but the mesh has {} vertices; ignoring",
                    bone.name,
                    vertex,
                    vertex_count
                );
                continue;
            };
            let influence = Influence {
                bone: bone.index,
                weight,
            };

            match policy {
                InfluencePolicy::FirstEncountered => {
                    if slots.len() < MAX_INFLUENCES {
                        slots.push(influence);
                    } else {
                        dropped += 1;
                    }
                }
                InfluencePolicy::Heaviest => {
                    // Strictly greater, so ties keep the earlier bone
                    let at = slots
                        .iter()
                        .position(|slot| weight > slot.weight)
                        .unwrap_or(slots.len());
                    if at >= MAX_INFLUENCES {
                        dropped += 1;
                        continue;
                    }
                    if slots.len() == MAX_INFLUENCES {
                        slots.pop();
                        dropped += 1;
                    }
                    slots.insert(at, influence);
                }
            }
        }
    }

    if dropped > 0 {
        tracing::debug!(
            "Dropped {} bone influences beyond {} per vertex",
            dropped,
            MAX_INFLUENCES
        );
    }

    SkinBinding { influences }
}
