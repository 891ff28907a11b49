//! Liveness-scoring engine for face anti-spoofing.
//!
//! Determines whether a submitted face crop depicts a live person in front
//! of the camera, as opposed to a photograph, printed image, or screen
//! replay. Face detection and cropping happen upstream; embedding
//! generation and identity comparison happen downstream. This crate is the
//! anti-spoofing gate in between.
//!
//! Five independent signal analyzers score the same contrast-normalized
//! capture (texture sharpness, landmark depth geometry, temporal motion,
//! screen reflection, frequency-domain moiré) and a gatekeeper fuses
//! the five scores under fixed weights with hard-fail short-circuits.
//!
//! # Threat coverage
//!
//! - **Blocks:** printed photographs (flat geometry, dead texture), screen
//!   replays (blue tint, specular glare, pixel-grid moiré), and static
//!   re-captures (zero temporal variance).
//! - **Does not block:** high-quality 3D masks or injected camera feeds;
//!   those require hardware depth sensing or capture attestation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use facegate_core::{Calibration, FaceImage, LivenessEngine};
//!
//! # fn provider() -> Arc<dyn facegate_core::LandmarkProvider> { unimplemented!() }
//! let engine = LivenessEngine::new(provider(), Calibration::from_env())?;
//! let image = FaceImage::from_rgb8(vec![0; 128 * 128 * 3], 128, 128)?;
//! let verdict = engine.check_liveness(&image, "session-42")?;
//! println!("live: {} (score {:.2})", verdict.is_live, verdict.score);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aggregate;
pub mod analyzers;
pub mod config;
pub mod engine;
pub mod frame;
pub mod landmarks;
pub mod preprocess;
pub mod quality;
pub mod session;
mod stats;

pub use aggregate::{AggregationWeights, Gatekeeper, ScoreSet, Verdict};
pub use analyzers::{Signal, SignalAnalyzer, SignalContext};
pub use config::{Calibration, ConfigError};
pub use engine::{EngineError, LivenessEngine};
pub use frame::{FaceImage, ImageError};
pub use landmarks::{
    ExclusiveProvider, Landmark, LandmarkBackend, LandmarkError, LandmarkProvider, LandmarkSet,
    ProviderError,
};
pub use quality::QualityReport;
pub use session::{SessionStore, HISTORY_CAP};
