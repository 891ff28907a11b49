//! `facegate`: run liveness checks against image files from the command
//! line.
//!
//! The engine consumes landmarks from an injected provider; here that
//! provider replays JSON sidecar files produced by the upstream mesh
//! service (see [`sidecar`]). Frames without a sidecar score as "no face
//! found" and fail closed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use facegate_core::{quality, Calibration, ExclusiveProvider, FaceImage, LivenessEngine};
use tracing_subscriber::EnvFilter;

mod setup;
mod sidecar;

use sidecar::SidecarQueue;

#[derive(Parser)]
#[command(name = "facegate", version, about = "Facegate liveness checks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single liveness check on an image file
    Check {
        /// Path to the cropped face image
        image: PathBuf,
        /// Session identifier for motion tracking
        #[arg(long, default_value = "cli")]
        session: String,
        /// Landmark sidecar JSON; defaults to `<image>.landmarks.json`
        #[arg(long)]
        landmarks: Option<PathBuf>,
    },
    /// Feed an ordered directory of frames through one session
    Sequence {
        /// Directory of frames, processed in filename order
        dir: PathBuf,
        /// Session identifier shared by every frame
        #[arg(long, default_value = "cli")]
        session: String,
    },
    /// Download and verify the landmark model files
    Setup {
        /// Target directory (default: $XDG_DATA_HOME/facegate/models)
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            image,
            session,
            landmarks,
        } => run_check(&image, &session, landmarks.as_deref()),
        Command::Sequence { dir, session } => run_sequence(&dir, &session),
        Command::Setup { model_dir } => setup::run(model_dir),
    }
}

fn load_face(path: &Path) -> Result<FaceImage> {
    let decoded =
        image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
    FaceImage::from_dynamic(&decoded)
        .with_context(|| format!("unusable image {}", path.display()))
}

/// Load the sidecar for a frame if one exists on disk.
fn optional_sidecar(frame: &Path, explicit: Option<&Path>) -> Result<Option<facegate_core::LandmarkSet>> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => sidecar::sidecar_path(frame),
    };
    if !path.exists() {
        if explicit.is_some() {
            bail!("landmark sidecar not found: {}", path.display());
        }
        tracing::warn!(frame = %frame.display(), "no landmark sidecar, scoring without a mesh");
        return Ok(None);
    }
    sidecar::load_sidecar(&path).map(Some)
}

fn run_check(image_path: &Path, session: &str, landmarks: Option<&Path>) -> Result<()> {
    let face = load_face(image_path)?;
    let mesh = optional_sidecar(image_path, landmarks)?;

    let provider = ExclusiveProvider::new(SidecarQueue::new(vec![mesh]));
    let engine = LivenessEngine::new(Arc::new(provider), Calibration::from_env())?;

    let report = quality::assess(&face);
    let verdict = engine.check_liveness(&face, session)?;

    println!(
        "{}",
        serde_json::json!({
            "verdict": verdict,
            "quality": report,
        })
    );
    Ok(())
}

fn run_sequence(dir: &Path, session: &str) -> Result<()> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("png" | "jpg" | "jpeg" | "bmp")
            )
        })
        .collect();
    frames.sort();

    if frames.is_empty() {
        bail!("no frames found in {}", dir.display());
    }

    let mut meshes = Vec::with_capacity(frames.len());
    for frame in &frames {
        meshes.push(optional_sidecar(frame, None)?);
    }

    let provider = ExclusiveProvider::new(SidecarQueue::new(meshes));
    let engine = LivenessEngine::new(Arc::new(provider), Calibration::from_env())?;

    for frame in &frames {
        let face = load_face(frame)?;
        let verdict = engine.check_liveness(&face, session)?;
        println!(
            "{}",
            serde_json::json!({
                "frame": frame.display().to_string(),
                "verdict": verdict,
            })
        );
    }
    Ok(())
}
