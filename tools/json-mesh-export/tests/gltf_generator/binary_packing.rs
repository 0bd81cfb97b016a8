//! Binary data packing for GLTF buffers.

use serde_json::{json, Value};

use super::mesh_data::{compute_bounds, MeshData};

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Accessor indices of one packed primitive
pub(crate) struct MeshAccessors {
    pub position: usize,
    pub normal: Option<usize>,
    pub tex_coord: Option<usize>,
    pub joints: Option<usize>,
    pub weights: Option<usize>,
    pub indices: usize,
}

/// Single binary buffer with its views and accessors
#[derive(Default)]
pub(crate) struct BufferBuilder {
    pub data: Vec<u8>,
    pub views: Vec<Value>,
    pub accessors: Vec<Value>,
}

impl BufferBuilder {
    fn push_view(&mut self, bytes: &[u8], target: Option<u32>) -> usize {
        // Accessors need 4-byte aligned views
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);

        let mut view = json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        });
        if let Some(target) = target {
            view["target"] = json!(target);
        }
        self.views.push(view);
        self.views.len() - 1
    }

    fn push_accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    /// Float vectors (`VEC2`/`VEC3`/`VEC4`/`MAT4`, or `SCALAR` when N is 1)
    pub fn floats<const N: usize>(
        &mut self,
        items: &[[f32; N]],
        kind: &str,
        target: Option<u32>,
        with_bounds: bool,
    ) -> usize {
        let bytes: Vec<u8> = items
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let view = self.push_view(&bytes, target);

        let mut accessor = json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": items.len(),
            "type": kind,
        });
        if with_bounds {
            let (min, max) = compute_bounds(items);
            accessor["min"] = json!(min);
            accessor["max"] = json!(max);
        }
        self.push_accessor(accessor)
    }

    /// Keyframe times (with the min/max animation inputs require)
    pub fn times(&mut self, times: &[f32]) -> usize {
        let items: Vec<[f32; 1]> = times.iter().map(|&t| [t]).collect();
        self.floats(&items, "SCALAR", None, true)
    }

    pub fn matrices(&mut self, matrices: &[[f32; 16]]) -> usize {
        self.floats(matrices, "MAT4", None, false)
    }

    fn joints(&mut self, joints: &[[u16; 4]]) -> usize {
        let bytes: Vec<u8> = joints
            .iter()
            .flatten()
            .flat_map(|j| j.to_le_bytes())
            .collect();
        let view = self.push_view(&bytes, Some(ARRAY_BUFFER));
        self.push_accessor(json!({
            "bufferView": view,
            "componentType": UNSIGNED_SHORT,
            "count": joints.len(),
            "type": "VEC4",
        }))
    }

    fn indices(&mut self, indices: &[u16]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.push_view(&bytes, Some(ELEMENT_ARRAY_BUFFER));
        self.push_accessor(json!({
            "bufferView": view,
            "componentType": UNSIGNED_SHORT,
            "count": indices.len(),
            "type": "SCALAR",
        }))
    }

    /// Pack every attribute of `mesh`
    pub fn pack_mesh(&mut self, mesh: &MeshData) -> MeshAccessors {
        let position = self.floats(&mesh.positions, "VEC3", Some(ARRAY_BUFFER), true);
        let normal = (!mesh.normals.is_empty())
            .then(|| self.floats(&mesh.normals, "VEC3", Some(ARRAY_BUFFER), false));
        let tex_coord =
            (!mesh.uvs.is_empty()).then(|| self.floats(&mesh.uvs, "VEC2", Some(ARRAY_BUFFER), false));
        let joints = (!mesh.joints.is_empty()).then(|| self.joints(&mesh.joints));
        let weights = (!mesh.weights.is_empty())
            .then(|| self.floats(&mesh.weights, "VEC4", Some(ARRAY_BUFFER), false));
        let indices = self.indices(&mesh.indices);

        MeshAccessors {
            position,
            normal,
            tex_coord,
            joints,
            weights,
            indices,
        }
    }
}
