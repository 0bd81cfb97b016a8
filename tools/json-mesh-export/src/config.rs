//! Converter configuration (TOML)
//!
//! Every field has a default, so an empty file (or no file at all) is a valid
//! configuration. CLI flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Default `generatedBy` metadata value
pub const DEFAULT_GENERATED_BY: &str = "json-mesh-export";

/// Default material name when the source material is unnamed
pub const DEFAULT_MATERIAL_NAME: &str = "material";

/// Top-level converter configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    pub output: OutputConfig,
    pub skeleton: SkeletonConfig,
    pub animation: AnimationConfig,
}

/// `[output]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Pretty-print the document (default: true)
    pub pretty: bool,
    /// `metadata.generatedBy`
    pub generated_by: String,
    /// `metadata.description`
    pub description: String,
    /// `DbgName` used when the source material has no name
    pub material_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            generated_by: DEFAULT_GENERATED_BY.to_string(),
            description: String::new(),
            material_name: DEFAULT_MATERIAL_NAME.to_string(),
        }
    }
}

/// `[skeleton]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkeletonConfig {
    /// Name of the armature root node. Auto-detected when unset.
    pub armature: Option<String>,
    pub influences: InfluencePolicy,
    pub decomposition: DecompositionPolicy,
}

impl SkeletonConfig {
    pub fn armature_root(&self) -> ArmatureRoot {
        match &self.armature {
            Some(name) => ArmatureRoot::Named(name.clone()),
            None => ArmatureRoot::Auto,
        }
    }
}

/// `[animation]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    /// Clip to export. The first clip when unset.
    pub clip: Option<String>,
    pub keyframes: KeyframePolicy,
}

/// How the skeleton's root node is located
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmatureRoot {
    /// Bones whose parent node is not a bone are roots
    Auto,
    /// Bones whose parent is the named node are roots
    Named(String),
}

/// Which influences survive the two-bone cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InfluencePolicy {
    /// Keep the first bones encountered in bone-index order
    #[default]
    FirstEncountered,
    /// Keep the highest weights
    Heaviest,
}

/// What to do with a bone transform that cannot be decomposed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DecompositionPolicy {
    /// Abort the conversion
    #[default]
    Fail,
    /// Substitute the identity transform and warn
    Identity,
}

/// How rotation/position/scale key sequences are merged into keyframes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum KeyframePolicy {
    /// Sample every sequence on the union of all key times
    #[default]
    Resample,
    /// Require equal lengths and matching times
    Strict,
}

/// Load a configuration file
pub fn load_config(path: &Path) -> Result<ConvertConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    parse_config(&content).with_context(|| format!("Failed to parse config: {:?}", path))
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> Result<ConvertConfig> {
    Ok(toml::from_str(content)?)
}
