//! Programmatic GLB generation for integration tests.
//!
//! The skinned scene:
//!
//! ```text
//! Root (synthetic, two scene roots)
//! ├── Armature
//! │   └── Hips ── Spine ── Head
//! └── Body (skinned quad, textured material)
//! ```
//!
//! The skin lists its joints child-first (Spine, Head, Hips), and carries two
//! clips: "Wave" (Hips rotation + translation, Spine rotation) and "Idle"
//! (Head scale).

#![allow(dead_code, unused_imports)]

mod binary_packing;

pub use mesh_data::{BONE_HEAD, BONE_HIPS, BONE_SPINE, QUAD_POSITIONS, QUAD_UVS};

use serde_json::json;

use binary_packing::BufferBuilder;
use glb_assembly::assemble_glb;
use gltf_json::{channel, finish_document, mesh_json, sampler};
use mesh_data::{inverse_bind_matrices, skinned_quad, static_quad};

/// Key times of the "Wave" clip (seconds)
pub const WAVE_TIMES: [f32; 2] = [0.0, 1.0];
pub const WAVE_SPINE_TIMES: [f32; 3] = [0.0, 0.5, 1.0];
pub const IDLE_TIMES: [f32; 2] = [0.0, 2.0];

/// Skinned, textured, animated quad
pub fn generate_skinned_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::default();
    let mesh = buffer.pack_mesh(&skinned_quad());
    let ibm = buffer.matrices(&inverse_bind_matrices());

    let wave_times = buffer.times(&WAVE_TIMES);
    let hips_rotation = buffer.floats(
        &[[0.0, 0.0, 0.0, 1.0], [0.0, 0.70710677, 0.0, 0.70710677]],
        "VEC4",
        None,
        false,
    );
    let hips_translation = buffer.floats(&[[0.0, 1.0, 0.0], [0.0, 2.0, 0.0]], "VEC3", None, false);
    let spine_times = buffer.times(&WAVE_SPINE_TIMES);
    let spine_rotation = buffer.floats(
        &[
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.38268343, 0.9238795],
            [0.0, 0.0, 0.0, 1.0],
        ],
        "VEC4",
        None,
        false,
    );
    let idle_times = buffer.times(&IDLE_TIMES);
    let head_scale = buffer.floats(&[[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]], "VEC3", None, false);

    let root = json!({
        "scene": 0,
        "scenes": [{ "name": "Root", "nodes": [0, 4] }],
        "nodes": [
            { "name": "Armature", "children": [1] },
            { "name": "Hips", "translation": [0.0, 1.0, 0.0], "children": [2] },
            { "name": "Spine", "translation": [0.0, 0.5, 0.0], "children": [3] },
            { "name": "Head", "translation": [0.0, 0.5, 0.0] },
            { "name": "Body", "mesh": 0, "skin": 0 },
        ],
        "meshes": [mesh_json("Body", &mesh, Some(0))],
        "skins": [{ "name": "Rig", "joints": [2, 3, 1], "inverseBindMatrices": ibm }],
        "materials": [{
            "name": "skin",
            "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } },
            "normalTexture": { "index": 1 },
        }],
        "textures": [{ "source": 0 }, { "source": 1 }],
        "images": [{ "uri": "textures/skin.png" }, { "uri": "textures/skin_n.png" }],
        "animations": [
            {
                "name": "Wave",
                "samplers": [
                    sampler(wave_times, hips_rotation),
                    sampler(wave_times, hips_translation),
                    sampler(spine_times, spine_rotation),
                ],
                "channels": [
                    channel(0, 1, "rotation"),
                    channel(1, 1, "translation"),
                    channel(2, 2, "rotation"),
                ],
            },
            {
                "name": "Idle",
                "samplers": [sampler(idle_times, head_scale)],
                "channels": [channel(0, 3, "scale")],
            },
        ],
    });

    let (root, data) = finish_document(root, buffer);
    assemble_glb(&root, &data)
}

/// Single unskinned quad without material, UVs or animation
pub fn generate_static_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::default();
    let mesh = buffer.pack_mesh(&static_quad());

    let root = json!({
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Body", "mesh": 0 }],
        "meshes": [mesh_json("Body", &mesh, None)],
    });

    let (root, data) = finish_document(root, buffer);
    assemble_glb(&root, &data)
}

/// Two separate quad meshes
pub fn generate_two_mesh_glb() -> Vec<u8> {
    let mut buffer = BufferBuilder::default();
    let mesh = buffer.pack_mesh(&static_quad());

    let root = json!({
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "Left", "mesh": 0 },
            { "name": "Right", "mesh": 1, "translation": [3.0, 0.0, 0.0] },
        ],
        "meshes": [mesh_json("Left", &mesh, None), mesh_json("Right", &mesh, None)],
    });

    let (root, data) = finish_document(root, buffer);
    assemble_glb(&root, &data)
}

/// A scene with a single empty node and no meshes
pub fn generate_empty_glb() -> Vec<u8> {
    let root = json!({
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Empty" }],
    });

    let (root, data) = finish_document(root, BufferBuilder::default());
    assemble_glb(&root, &data)
}

/// Two nodes listing each other as children
pub fn generate_cyclic_glb() -> Vec<u8> {
    let root = json!({
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "A", "children": [1] },
            { "name": "B", "children": [0] },
        ],
    });

    let (root, data) = finish_document(root, BufferBuilder::default());
    assemble_glb(&root, &data)
}
