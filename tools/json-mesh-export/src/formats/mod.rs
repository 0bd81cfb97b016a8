//! Output format definitions
//!
//! Only the three.js legacy JSON model format (3.1) is produced.

pub mod legacy_json;

pub use legacy_json::{
    build_document, write_document, ClipKeys, LegacyAnimation, LegacyBone, LegacyDocument,
    LegacyMaterial, LegacyMetadata,
};
