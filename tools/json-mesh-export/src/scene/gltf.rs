//! glTF/GLB importer
//!
//! Only buffers are loaded; images are referenced by URI and never decoded.
//! Every primitive becomes its own [`SceneMesh`].

use glam::Mat4;
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;
use gltf::mesh::Mode;
use hashbrown::HashMap;
use std::path::Path;

use super::{
    NodeChannel, QuatKey, Scene, SceneAnimation, SceneBone, SceneMaterial, SceneMesh, SceneNode,
    VectorKey, VertexWeight,
};
use crate::error::ConvertError;

/// glTF key times are already in seconds
const GLTF_TICKS_PER_SECOND: f64 = 1.0;

/// Raw JOINTS_0 / WEIGHTS_0 of a primitive, resolved once a skin is known
#[derive(Default)]
struct PrimitiveSkin {
    joints: Option<Vec<[u16; 4]>>,
    weights: Option<Vec<[f32; 4]>>,
}

/// Load a `.gltf` or `.glb` file
pub fn load_gltf(path: &Path) -> Result<Scene, ConvertError> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::open(path).map_err(|e| ConvertError::import(path, e))?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)
        .map_err(|e| ConvertError::import(path, e))?;

    let mut scene = Scene {
        meshes: Vec::new(),
        materials: document.materials().map(read_material).collect(),
        nodes: document
            .nodes()
            .map(|node| {
                SceneNode::new(
                    node_name(&node),
                    Mat4::from_cols_array_2d(&node.transform().matrix()),
                )
            })
            .collect(),
        root: 0,
        animations: Vec::new(),
    };

    for node in document.nodes() {
        for child in node.children() {
            if scene.nodes[child.index()].parent.is_some() {
                return Err(ConvertError::import(
                    path,
                    format!("node '{}' has more than one parent", scene.nodes[child.index()].name),
                ));
            }
            scene.link(node.index(), child.index());
        }
    }
    if let Some(node) = scene.find_cycle() {
        return Err(ConvertError::import(
            path,
            format!("node hierarchy contains a cycle through '{}'", scene.nodes[node].name),
        ));
    }
    scene.root = attach_root(&mut scene, &document);

    // glTF mesh index -> scene mesh indices (one per primitive)
    let mut primitive_meshes: Vec<Vec<usize>> = Vec::new();
    let mut primitive_skins: Vec<PrimitiveSkin> = Vec::new();
    for mesh in document.meshes() {
        let primitive_count = mesh.primitives().count();
        let base_name = mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

        let mut indices = Vec::with_capacity(primitive_count);
        for primitive in mesh.primitives() {
            let name = if primitive_count > 1 {
                format!("{}_{}", base_name, primitive.index())
            } else {
                base_name.clone()
            };
            let (scene_mesh, skin) = read_primitive(path, name, &primitive, &buffers)?;
            indices.push(scene.meshes.len());
            scene.meshes.push(scene_mesh);
            primitive_skins.push(skin);
        }
        primitive_meshes.push(indices);
    }

    // Bones come from the skin of the first node instancing each mesh
    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let mesh_indices = &primitive_meshes[mesh.index()];
        scene.nodes[node.index()]
            .meshes
            .extend(mesh_indices.iter().copied());

        let Some(skin) = node.skin() else {
            continue;
        };
        for &mesh_index in mesh_indices {
            if scene.meshes[mesh_index].bones.is_empty() {
                scene.meshes[mesh_index].bones =
                    read_skin_bones(&skin, &buffers, &primitive_skins[mesh_index]);
            }
        }
    }

    scene.animations = document
        .animations()
        .map(|animation| read_animation(&animation, &buffers))
        .collect();

    Ok(scene)
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

/// Pick the scene roots, adding a synthetic root when there are several
fn attach_root(scene: &mut Scene, document: &gltf::Document) -> usize {
    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next());

    let roots: Vec<usize> = match &gltf_scene {
        Some(s) => s.nodes().map(|n| n.index()).collect(),
        None => (0..scene.nodes.len())
            .filter(|&i| scene.nodes[i].parent.is_none())
            .collect(),
    };

    if let [root] = roots.as_slice() {
        return *root;
    }

    let name = gltf_scene
        .as_ref()
        .and_then(|s| s.name())
        .unwrap_or("Scene");
    let root = scene.nodes.len();
    scene.nodes.push(SceneNode::new(name, Mat4::IDENTITY));
    for child in roots {
        scene.link(root, child);
    }
    root
}

fn read_primitive(
    path: &Path,
    name: String,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Result<(SceneMesh, PrimitiveSkin), ConvertError> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| {
            ConvertError::import(path, format!("primitive '{}' has no POSITION attribute", name))
        })?
        .collect();

    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());

    // Flip V into the bottom-left texture origin
    let mut tex_coords = Vec::new();
    while let Some(iter) = reader.read_tex_coords(tex_coords.len() as u32) {
        tex_coords.push(iter.into_f32().map(|[u, v]| [u, 1.0 - v]).collect());
    }

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let skin = PrimitiveSkin {
        joints: reader.read_joints(0).map(|iter| iter.into_u16().collect()),
        weights: reader.read_weights(0).map(|iter| iter.into_f32().collect()),
    };

    let mesh = SceneMesh {
        name,
        positions,
        normals,
        tex_coords,
        faces: build_faces(primitive.mode(), &indices),
        material: primitive.material().index(),
        bones: Vec::new(),
    };

    Ok((mesh, skin))
}

/// Split an index stream into faces according to the primitive topology
fn build_faces(mode: Mode, indices: &[u32]) -> Vec<Vec<u32>> {
    match mode {
        Mode::Triangles => indices.chunks(3).map(<[u32]>::to_vec).collect(),
        Mode::TriangleStrip => (2..indices.len())
            .map(|i| {
                if i % 2 == 0 {
                    vec![indices[i - 2], indices[i - 1], indices[i]]
                } else {
                    vec![indices[i - 1], indices[i - 2], indices[i]]
                }
            })
            .collect(),
        Mode::TriangleFan => (2..indices.len())
            .map(|i| vec![indices[0], indices[i - 1], indices[i]])
            .collect(),
        Mode::Points => indices.iter().map(|&i| vec![i]).collect(),
        Mode::Lines => indices.chunks(2).map(<[u32]>::to_vec).collect(),
        Mode::LineStrip => indices.windows(2).map(<[u32]>::to_vec).collect(),
        Mode::LineLoop => {
            let mut faces: Vec<Vec<u32>> = indices.windows(2).map(<[u32]>::to_vec).collect();
            if let (Some(&first), Some(&last)) = (indices.first(), indices.last()) {
                if indices.len() > 2 {
                    faces.push(vec![last, first]);
                }
            }
            faces
        }
    }
}

fn read_skin_bones(
    skin: &gltf::Skin,
    buffers: &[gltf::buffer::Data],
    raw: &PrimitiveSkin,
) -> Vec<SceneBone> {
    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let offsets: Vec<Mat4> = reader
        .read_inverse_bind_matrices()
        .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_default();

    let mut bones: Vec<SceneBone> = skin
        .joints()
        .enumerate()
        .map(|(i, joint)| SceneBone {
            name: node_name(&joint),
            offset_matrix: offsets.get(i).copied().unwrap_or(Mat4::IDENTITY),
            weights: Vec::new(),
        })
        .collect();

    let (Some(joints), Some(weights)) = (&raw.joints, &raw.weights) else {
        if raw.joints.is_some() || raw.weights.is_some() {
            tracing::warn!(
                "Mesh has partial skinning data (joints or weights missing), ignoring skinning"
            );
        }
        return bones;
    };

    for (vertex, (joint_set, weight_set)) in joints.iter().zip(weights).enumerate() {
        for (&joint, &weight) in joint_set.iter().zip(weight_set) {
            if weight <= 0.0 {
                continue;
            }
            match bones.get_mut(joint as usize) {
                Some(bone) => bone.weights.push(VertexWeight {
                    vertex: vertex as u32,
                    weight,
                }),
                None => tracing::warn!(
                    "Vertex {} references joint {}, but skin '{}' has {} joints",
                    vertex,
                    joint,
                    skin.name().unwrap_or("unnamed"),
                    skin.joints().count()
                ),
            }
        }
    }

    bones
}

fn read_material(material: gltf::Material) -> SceneMaterial {
    SceneMaterial {
        name: material.name().map(str::to_owned),
        diffuse_textures: material
            .pbr_metallic_roughness()
            .base_color_texture()
            .map(|info| texture_path(&info.texture()))
            .into_iter()
            .collect(),
        normal_textures: material
            .normal_texture()
            .map(|normal| texture_path(&normal.texture()))
            .into_iter()
            .collect(),
    }
}

/// Image URI, or `*<index>` for images embedded in a buffer view
fn texture_path(texture: &gltf::Texture) -> String {
    let image = texture.source();
    match image.source() {
        gltf::image::Source::Uri { uri, .. } => uri.to_string(),
        gltf::image::Source::View { .. } => format!("*{}", image.index()),
    }
}

fn read_animation(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> SceneAnimation {
    let name = animation
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("animation_{}", animation.index()));

    let mut channels: Vec<NodeChannel> = Vec::new();
    let mut channel_by_node: HashMap<usize, usize> = HashMap::new();
    let mut duration = 0.0f64;

    for channel in animation.channels() {
        let node = channel.target().node();
        let interpolation = channel.sampler().interpolation();
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));

        let Some(inputs) = reader.read_inputs() else {
            tracing::warn!("Animation '{}': channel has no input times, skipping", name);
            continue;
        };
        let times: Vec<f64> = inputs
            .map(|t| f64::from(t) * GLTF_TICKS_PER_SECOND)
            .collect();
        if let Some(&last) = times.last() {
            duration = duration.max(last);
        }

        let slot = *channel_by_node.entry(node.index()).or_insert_with(|| {
            channels.push(NodeChannel {
                node_name: node_name(&node),
                ..Default::default()
            });
            channels.len() - 1
        });
        let entry = &mut channels[slot];

        match reader.read_outputs() {
            Some(ReadOutputs::Translations(values)) => {
                entry.position_keys = vector_keys(&times, spline_values(values, interpolation));
            }
            Some(ReadOutputs::Rotations(values)) => {
                entry.rotation_keys = times
                    .iter()
                    .zip(spline_values(values.into_f32(), interpolation))
                    .map(|(&time, value)| QuatKey { time, value })
                    .collect();
            }
            Some(ReadOutputs::Scales(values)) => {
                entry.scale_keys = vector_keys(&times, spline_values(values, interpolation));
            }
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                tracing::debug!("Animation '{}': ignoring morph target weights", name);
            }
            None => {
                tracing::warn!("Animation '{}': channel has no output values, skipping", name);
            }
        }
    }

    SceneAnimation {
        name,
        duration,
        ticks_per_second: GLTF_TICKS_PER_SECOND,
        channels,
    }
}

/// Cubic spline samplers store (in-tangent, value, out-tangent) per key
fn spline_values<T>(values: impl Iterator<Item = T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => values.skip(1).step_by(3).collect(),
        _ => values.collect(),
    }
}

fn vector_keys(times: &[f64], values: Vec<[f32; 3]>) -> Vec<VectorKey> {
    times
        .iter()
        .zip(values)
        .map(|(&time, value)| VectorKey { time, value })
        .collect()
}
