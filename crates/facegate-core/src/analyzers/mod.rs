//! Signal analyzer registry.
//!
//! Five independent scorers inspect the same preprocessed capture and emit
//! evidence in `[0, 1]`. Four are pure functions of the capture (and mesh);
//! motion alone consults the session history. The engine iterates the
//! registry generically and clamps every score at the boundary.

mod depth;
mod frequency;
mod motion;
mod reflection;
mod texture;

pub use depth::DepthAnalyzer;
pub use frequency::FrequencyAnalyzer;
pub use motion::MotionAnalyzer;
pub use reflection::ReflectionAnalyzer;
pub use texture::TextureAnalyzer;

pub(crate) use texture::second_difference_energy;

use std::fmt;

use crate::config::Calibration;
use crate::frame::FaceImage;
use crate::landmarks::LandmarkSet;
use crate::session::SessionHandle;

/// The fixed set of liveness signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Texture,
    Depth,
    Motion,
    Reflection,
    Frequency,
}

impl Signal {
    /// Registry order; also the order scores are reported in.
    pub const ALL: [Signal; 5] = [
        Signal::Texture,
        Signal::Depth,
        Signal::Motion,
        Signal::Reflection,
        Signal::Frequency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Texture => "texture",
            Signal::Depth => "depth",
            Signal::Motion => "motion",
            Signal::Reflection => "reflection",
            Signal::Frequency => "frequency",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an analyzer may consult for one check.
pub struct SignalContext<'a> {
    /// Contrast-normalized capture.
    pub image: &'a FaceImage,
    /// Mesh for the capture, when the provider found a face.
    pub landmarks: Option<&'a LandmarkSet>,
    /// Temporal history of the calling session.
    pub session: &'a SessionHandle,
}

/// One liveness evidence scorer.
pub trait SignalAnalyzer: Send + Sync {
    fn signal(&self) -> Signal;

    /// Score the capture. Implementations return values in `[0, 1]`; the
    /// engine clamps defensively at the boundary.
    fn score(&self, ctx: &SignalContext<'_>) -> f32;
}

/// Build the full registry in fixed signal order.
pub fn build_registry(cal: &Calibration) -> Vec<Box<dyn SignalAnalyzer>> {
    vec![
        Box::new(TextureAnalyzer::new(cal)),
        Box::new(DepthAnalyzer::new(cal)),
        Box::new(MotionAnalyzer::new(cal)),
        Box::new(ReflectionAnalyzer::new(cal)),
        Box::new(FrequencyAnalyzer::new(cal)),
    ]
}
