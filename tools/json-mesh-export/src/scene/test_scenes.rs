//! Hand-built scenes shared by unit tests.
//!
//! Hierarchy of [`rigged_quad_scene`]:
//!
//! ```text
//! Scene
//! ├── Armature
//! │   └── Hips ── Spine ── Head
//! └── Body (mesh 0)
//! ```
//!
//! The mesh lists its bones child-first (`Spine`, `Head`, `Hips`), so parent
//! resolution cannot rely on discovery order.

use glam::{Mat4, Quat, Vec3};

use super::*;

pub(crate) const BONE_SPINE: usize = 0;
pub(crate) const BONE_HEAD: usize = 1;
pub(crate) const BONE_HIPS: usize = 2;

pub(crate) fn quad_mesh() -> SceneMesh {
    SceneMesh {
        name: "Body".to_string(),
        positions: vec![
            [-1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 2.0, 0.0],
            [-1.0, 2.0, 0.0],
        ],
        normals: Some(vec![[0.0, 0.0, 2.0]; 4]),
        tex_coords: vec![
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            vec![[0.5, 0.5]; 4],
        ],
        faces: vec![vec![0, 1, 2], vec![0, 2, 3]],
        material: Some(0),
        bones: Vec::new(),
    }
}

fn weights(pairs: &[(u32, f32)]) -> Vec<VertexWeight> {
    pairs
        .iter()
        .map(|&(vertex, weight)| VertexWeight { vertex, weight })
        .collect()
}

/// Quad skinned to a three-bone chain with two animation clips
pub(crate) fn rigged_quad_scene() -> Scene {
    let mut mesh = quad_mesh();
    // Vertex 0 sees weights [0.7, 0.3, 0.0], vertex 1 sees [0.2, 0.5, 0.3]
    mesh.bones = vec![
        SceneBone {
            name: "Spine".to_string(),
            offset_matrix: Mat4::from_translation(Vec3::new(0.0, -1.5, 0.0)),
            weights: weights(&[(0, 0.7), (1, 0.2)]),
        },
        SceneBone {
            name: "Head".to_string(),
            offset_matrix: Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)),
            weights: weights(&[(0, 0.3), (1, 0.5)]),
        },
        SceneBone {
            name: "Hips".to_string(),
            offset_matrix: Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
            weights: weights(&[(0, 0.0), (1, 0.3), (2, 1.0)]),
        },
    ];

    let mut scene = Scene {
        meshes: vec![mesh],
        materials: vec![SceneMaterial {
            name: Some("skin".to_string()),
            diffuse_textures: vec!["textures/skin.png".to_string()],
            normal_textures: Vec::new(),
        }],
        nodes: vec![
            SceneNode::new("Scene", Mat4::IDENTITY),
            SceneNode::new("Armature", Mat4::IDENTITY),
            SceneNode::new("Hips", Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))),
            SceneNode::new(
                "Spine",
                Mat4::from_rotation_translation(
                    Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                    Vec3::new(0.0, 0.5, 0.0),
                ),
            ),
            SceneNode::new(
                "Head",
                Mat4::from_scale_rotation_translation(
                    Vec3::splat(2.0),
                    Quat::IDENTITY,
                    Vec3::new(0.0, 0.5, 0.0),
                ),
            ),
            SceneNode::new("Body", Mat4::IDENTITY),
        ],
        root: 0,
        animations: vec![
            SceneAnimation {
                name: "Wave".to_string(),
                duration: 24.0,
                ticks_per_second: 24.0,
                channels: vec![
                    NodeChannel {
                        node_name: "Hips".to_string(),
                        rotation_keys: vec![
                            QuatKey { time: 0.0, value: [0.0, 0.0, 0.0, 1.0] },
                            QuatKey { time: 24.0, value: [0.0, 1.0, 0.0, 0.0] },
                        ],
                        position_keys: vec![
                            VectorKey { time: 0.0, value: [0.0, 1.0, 0.0] },
                            VectorKey { time: 24.0, value: [0.0, 2.0, 0.0] },
                        ],
                        scale_keys: vec![
                            VectorKey { time: 0.0, value: [1.0, 1.0, 1.0] },
                            VectorKey { time: 24.0, value: [1.0, 1.0, 1.0] },
                        ],
                    },
                    NodeChannel {
                        node_name: "Spine".to_string(),
                        rotation_keys: vec![
                            QuatKey { time: 0.0, value: [0.0, 0.0, 0.0, 1.0] },
                            QuatKey { time: 12.0, value: [0.0, 0.0, 0.0, 1.0] },
                            QuatKey { time: 24.0, value: [0.0, 0.0, 0.0, 1.0] },
                        ],
                        position_keys: Vec::new(),
                        scale_keys: Vec::new(),
                    },
                    NodeChannel {
                        node_name: "Armature".to_string(),
                        rotation_keys: vec![QuatKey { time: 0.0, value: [0.0, 0.0, 0.0, 1.0] }],
                        ..Default::default()
                    },
                ],
            },
            SceneAnimation {
                name: "Idle".to_string(),
                duration: 10.0,
                ticks_per_second: 30.0,
                channels: vec![NodeChannel {
                    node_name: "Head".to_string(),
                    rotation_keys: vec![QuatKey { time: 5.0, value: [0.0, 0.0, 0.0, 1.0] }],
                    position_keys: vec![VectorKey { time: 5.0, value: [0.0, 0.5, 0.0] }],
                    scale_keys: vec![VectorKey { time: 5.0, value: [2.0, 2.0, 2.0] }],
                }],
            },
        ],
    };

    scene.link(0, 1);
    scene.link(1, 2);
    scene.link(2, 3);
    scene.link(3, 4);
    scene.link(0, 5);
    scene.nodes[5].meshes.push(0);
    scene
}

/// Quad with no skin, no material and no animation
pub(crate) fn static_quad_scene() -> Scene {
    let mut mesh = quad_mesh();
    mesh.material = None;
    mesh.tex_coords.clear();
    mesh.normals = None;

    let mut scene = Scene {
        meshes: vec![mesh],
        materials: Vec::new(),
        nodes: vec![
            SceneNode::new("Scene", Mat4::IDENTITY),
            SceneNode::new("Body", Mat4::IDENTITY),
        ],
        root: 0,
        animations: Vec::new(),
    };
    scene.link(0, 1);
    scene.nodes[1].meshes.push(0);
    scene
}
