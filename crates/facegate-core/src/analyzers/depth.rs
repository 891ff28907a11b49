//! Depth geometry analysis.
//!
//! A real face carries 3D structure: the nose tip sits closer to the camera
//! (more negative mesh z) than the eyes, chin, and cheeks. A photograph or
//! screen held up to the camera collapses that protrusion toward zero, and
//! the z spread across the face flattens with it. No mesh at all means no
//! evidence of 3D structure, which fails closed.

use crate::analyzers::{Signal, SignalAnalyzer, SignalContext};
use crate::config::Calibration;
use crate::landmarks::index;
use crate::stats;

/// Reference points compared against the nose tip.
const REFERENCE_POINTS: [usize; 5] = [
    index::LEFT_EYE_OUTER,
    index::RIGHT_EYE_OUTER,
    index::CHIN,
    index::LEFT_CHEEK,
    index::RIGHT_CHEEK,
];

pub struct DepthAnalyzer {
    protrusion_strong: f32,
    variance_strong: f32,
    protrusion_weak: f32,
    variance_weak: f32,
}

impl DepthAnalyzer {
    pub fn new(cal: &Calibration) -> Self {
        Self {
            protrusion_strong: cal.depth_protrusion_strong,
            variance_strong: cal.depth_variance_strong,
            protrusion_weak: cal.depth_protrusion_weak,
            variance_weak: cal.depth_variance_weak,
        }
    }
}

impl SignalAnalyzer for DepthAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Depth
    }

    fn score(&self, ctx: &SignalContext<'_>) -> f32 {
        let Some(mesh) = ctx.landmarks else {
            return 0.0;
        };

        let nose_z = mesh.nose_tip().z;
        let reference_z: Vec<f32> = REFERENCE_POINTS
            .iter()
            .map(|&i| mesh.point(i).z)
            .collect();

        let protrusion = stats::mean(&reference_z) - nose_z;

        let mut all_z = reference_z;
        all_z.push(nose_z);
        let depth_variance = stats::variance(&all_z);

        if protrusion > self.protrusion_strong && depth_variance > self.variance_strong {
            1.0
        } else if protrusion > self.protrusion_weak && depth_variance > self.variance_weak {
            0.5
        } else {
            0.0
        }
    }
}
