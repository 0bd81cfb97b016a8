//! Conversion pipeline: load -> flatten -> skeleton -> emit

use std::path::Path;

use crate::animation::clip_keyframes;
use crate::config::{AnimationConfig, ConvertConfig};
use crate::error::ConvertError;
use crate::formats::{build_document, write_document, ClipKeys, LegacyDocument};
use crate::mesh::flatten_mesh;
use crate::scene::{load_scene, Scene};
use crate::skeleton::{bin_skin_weights, extract_skeleton, Skeleton};

/// What a finished export contained
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub vertices: usize,
    pub faces: usize,
    pub bones: usize,
    /// Clips found in the scene
    pub clips: usize,
    /// The clip written to the document
    pub animation: Option<String>,
}

/// Convert an already loaded scene
pub fn convert_scene(scene: &Scene, config: &ConvertConfig) -> Result<LegacyDocument, ConvertError> {
    convert(scene, config).map(|(doc, _)| doc)
}

/// Load `input` and convert it
pub fn convert_file(input: &Path, config: &ConvertConfig) -> Result<LegacyDocument, ConvertError> {
    let scene = load_scene(input)?;
    convert_scene(&scene, config)
}

/// Load `input`, convert it and write the document to `output`
///
/// Nothing is written unless every stage succeeds.
pub fn export(
    input: &Path,
    output: &Path,
    config: &ConvertConfig,
) -> Result<ExportSummary, ConvertError> {
    let scene = load_scene(input)?;
    let (doc, clips) = convert(&scene, config)?;
    write_document(output, &doc, config.output.pretty)?;

    Ok(ExportSummary {
        vertices: doc.metadata.vertices,
        faces: doc.metadata.faces,
        bones: doc.bones.len(),
        clips,
        animation: doc.animation.map(|a| a.name),
    })
}

fn convert(scene: &Scene, config: &ConvertConfig) -> Result<(LegacyDocument, usize), ConvertError> {
    let mesh = scene.single_mesh()?;
    let flat = flatten_mesh(scene, mesh)?;
    let skeleton = extract_skeleton(scene, mesh, &config.skeleton)?;
    let skin = bin_skin_weights(
        &skeleton.bones,
        flat.vertices.len(),
        config.skeleton.influences,
    );
    let clip = select_clip(&skeleton, &config.animation)?;

    let doc = build_document(&flat, &skeleton, &skin, clip, &config.output);
    Ok((doc, skeleton.clips.len()))
}

/// The configured clip (or the first one) with every bone's keyframes
fn select_clip<'a>(
    skeleton: &'a Skeleton,
    config: &AnimationConfig,
) -> Result<Option<ClipKeys<'a>>, ConvertError> {
    let index = match &config.clip {
        Some(name) => Some(skeleton.clip_index(name).ok_or_else(|| {
            ConvertError::UnknownClip {
                name: name.clone(),
                available: skeleton.clips.iter().map(|c| c.name.clone()).collect(),
            }
        })?),
        None => (!skeleton.clips.is_empty()).then_some(0),
    };

    let Some(index) = index else {
        return Ok(None);
    };

    let clip = &skeleton.clips[index];
    if skeleton.clips.len() > 1 {
        tracing::info!(
            "Exporting clip '{}' ({} of {})",
            clip.name,
            index + 1,
            skeleton.clips.len()
        );
    }
    let bones = clip_keyframes(&skeleton.bones, index, clip, config.keyframes)?;
    Ok(Some(ClipKeys { clip, bones }))
}
