//! Screen reflection analysis.
//!
//! Digital displays skew cool relative to skin under natural lighting, and
//! glossy screen surfaces throw sharp specular glare. Either artifact alone
//! marks the capture as a re-display.

use crate::analyzers::{Signal, SignalAnalyzer, SignalContext};
use crate::config::Calibration;
use crate::landmarks::EPSILON;

pub struct ReflectionAnalyzer {
    blue_ratio: f32,
    glare_fraction: f32,
    glare_intensity: f32,
}

impl ReflectionAnalyzer {
    pub fn new(cal: &Calibration) -> Self {
        Self {
            blue_ratio: cal.reflection_blue_ratio,
            glare_fraction: cal.reflection_glare_fraction,
            glare_intensity: cal.reflection_glare_intensity,
        }
    }
}

impl SignalAnalyzer for ReflectionAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Reflection
    }

    fn score(&self, ctx: &SignalContext<'_>) -> f32 {
        let [mean_red, _, mean_blue] = ctx.image.channel_means();
        let blue_ratio = mean_blue / (mean_red + EPSILON);

        let gray = ctx.image.grayscale();
        let glare_pixels = gray.iter().filter(|&&v| v > self.glare_intensity).count();
        let glare_ratio = glare_pixels as f32 / ctx.image.pixel_count() as f32;

        if blue_ratio > self.blue_ratio || glare_ratio > self.glare_fraction {
            0.0
        } else {
            0.9
        }
    }
}
