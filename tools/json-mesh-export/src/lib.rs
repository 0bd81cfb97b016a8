//! json-mesh-export library
//!
//! Converts a single (optionally skinned and animated) mesh from a glTF/GLB
//! or OBJ scene into the three.js legacy JSON model format.

pub mod animation;
pub mod config;
pub mod convert;
pub mod error;
pub mod formats;
pub mod mesh;
pub mod scene;
pub mod skeleton;

pub use config::{load_config, ConvertConfig};
pub use convert::{convert_file, convert_scene, export, ExportSummary};
pub use error::ConvertError;
pub use formats::LegacyDocument;
pub use scene::{load_scene, Scene};
