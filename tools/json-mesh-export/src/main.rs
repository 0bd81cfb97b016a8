//! json-mesh-export - mesh to three.js JSON converter
//!
//! Reads one mesh (with its skeleton and animation clips) from a glTF, GLB
//! or OBJ file and writes a legacy three.js JSON model.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use json_mesh_export::config::{
    load_config, ConvertConfig, DecompositionPolicy, InfluencePolicy, KeyframePolicy,
};
use json_mesh_export::export;

#[derive(Parser)]
#[command(name = "json-mesh-export")]
#[command(about = "Convert a mesh scene to three.js legacy JSON")]
#[command(version)]
struct Cli {
    /// Input scene file (glTF/GLB/OBJ)
    input: Option<PathBuf>,

    /// Output .json file (default: input with .json extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Armature root node name (default: auto-detect)
    #[arg(long)]
    armature: Option<String>,

    /// Animation clip to export (default: first clip)
    #[arg(long)]
    clip: Option<String>,

    /// Which bone influences survive the per-vertex cap
    #[arg(long, value_enum)]
    influences: Option<InfluencePolicy>,

    /// How key sequences are merged into keyframes
    #[arg(long, value_enum)]
    keyframes: Option<KeyframePolicy>,

    /// What to do with singular bone transforms
    #[arg(long, value_enum)]
    decomposition: Option<DecompositionPolicy>,

    /// Write single-line JSON
    #[arg(long)]
    compact: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Flags override the config file
    fn apply(&self, config: &mut ConvertConfig) {
        if let Some(armature) = &self.armature {
            config.skeleton.armature = Some(armature.clone());
        }
        if let Some(clip) = &self.clip {
            config.animation.clip = Some(clip.clone());
        }
        if let Some(influences) = self.influences {
            config.skeleton.influences = influences;
        }
        if let Some(keyframes) = self.keyframes {
            config.animation.keyframes = keyframes;
        }
        if let Some(decomposition) = self.decomposition {
            config.skeleton.decomposition = decomposition;
        }
        if self.compact {
            config.output.pretty = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let Some(input) = cli.input.clone() else {
        eprintln!("Please provide a scene file to convert.\n");
        let _ = Cli::command().write_long_help(&mut std::io::stderr());
        std::process::exit(1);
    };

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConvertConfig::default(),
    };
    cli.apply(&mut config);

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension("json"));
    tracing::info!("Converting {:?} -> {:?}", input, output);

    let summary = export(&input, &output, &config)?;
    tracing::info!(
        "Done! {} vertices, {} faces, {} bones, {} clips",
        summary.vertices,
        summary.faces,
        summary.bones,
        summary.clips
    );
    if let Some(animation) = &summary.animation {
        tracing::info!("Animation: '{}'", animation);
    }

    Ok(())
}
