//! Engine calibration, loaded from `FACEGATE_*` environment variables with
//! tuned defaults.
//!
//! Every threshold consulted by the analyzers and the gatekeeper lives in
//! this one table so deployments can recalibrate without touching scoring
//! logic. The defaults are empirically tuned against captured presentation
//! attacks, not derived from a validation dataset. Treat them as a
//! starting point.

use std::time::Duration;

use thiserror::Error;

use crate::aggregate::AggregationWeights;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("aggregation weights must sum to 1.0, got {0}")]
    WeightSum(f32),
    #[error("texture band is inverted ({low} >= {high})")]
    TextureBand { low: f32, high: f32 },
}

/// Calibration table for the scoring engine.
#[derive(Debug, Clone)]
pub struct Calibration {
    /// Mean grayscale intensity below which a capture is flagged low-light.
    pub low_light_mean: f32,

    /// Sharpness band (summed variance of the two second-difference fields)
    /// considered natural skin micro-texture. Below the band reads as a
    /// flat print or screen surface, above as implausible noise.
    pub texture_band_low: f32,
    pub texture_band_high: f32,

    /// Nose protrusion and z-variance floor for a clear 3D face.
    pub depth_protrusion_strong: f32,
    pub depth_variance_strong: f32,
    /// Weaker protrusion/variance pair scored as ambiguous.
    pub depth_protrusion_weak: f32,
    pub depth_variance_weak: f32,

    /// Session samples required before motion scoring leaves warm-up.
    pub motion_warmup: usize,
    /// Below this variance on both histories the capture is a static replay.
    pub motion_static_variance: f32,
    /// Eye-aspect-ratio variance above this indicates natural blinking.
    pub motion_ear_variance: f32,
    /// Nose-pose variance above this indicates natural head motion.
    pub motion_pose_variance: f32,

    /// Blue/red channel ratio above which a display tint is assumed.
    pub reflection_blue_ratio: f32,
    /// Fraction of near-saturated pixels above which glare is assumed.
    pub reflection_glare_fraction: f32,
    /// Grayscale intensity counted as specular glare.
    pub reflection_glare_intensity: f32,

    /// Side length of the centered square analysed in the frequency domain.
    pub frequency_roi_side: usize,
    /// Spectral max/mean ratio above which a pixel-grid spike is assumed.
    pub frequency_spike_ratio: f32,

    /// Gatekeeper fusion weights; must sum to 1.0.
    pub weights: AggregationWeights,
    /// Weighted score a capture must exceed to pass.
    pub live_score_threshold: f32,
    /// Depth score a capture must exceed to pass.
    pub live_depth_floor: f32,

    /// Idle time after which a session's temporal history is discarded.
    pub session_ttl: Duration,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            low_light_mean: 40.0,
            texture_band_low: 150.0,
            texture_band_high: 1000.0,
            depth_protrusion_strong: 0.04,
            depth_variance_strong: 0.001,
            depth_protrusion_weak: 0.02,
            depth_variance_weak: 0.0006,
            motion_warmup: 5,
            motion_static_variance: 1e-6,
            motion_ear_variance: 1e-4,
            motion_pose_variance: 2e-4,
            reflection_blue_ratio: 1.3,
            reflection_glare_fraction: 0.02,
            reflection_glare_intensity: 240.0,
            frequency_roi_side: 240,
            frequency_spike_ratio: 8.0,
            weights: AggregationWeights::default(),
            live_score_threshold: 0.8,
            live_depth_floor: 0.5,
            session_ttl: Duration::from_secs(300),
        }
    }
}

impl Calibration {
    /// Load calibration from `FACEGATE_*` environment variables, falling
    /// back to the tuned defaults per key.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            low_light_mean: env_f32("FACEGATE_LOW_LIGHT_MEAN", d.low_light_mean),
            texture_band_low: env_f32("FACEGATE_TEXTURE_BAND_LOW", d.texture_band_low),
            texture_band_high: env_f32("FACEGATE_TEXTURE_BAND_HIGH", d.texture_band_high),
            depth_protrusion_strong: env_f32(
                "FACEGATE_DEPTH_PROTRUSION_STRONG",
                d.depth_protrusion_strong,
            ),
            depth_variance_strong: env_f32(
                "FACEGATE_DEPTH_VARIANCE_STRONG",
                d.depth_variance_strong,
            ),
            depth_protrusion_weak: env_f32(
                "FACEGATE_DEPTH_PROTRUSION_WEAK",
                d.depth_protrusion_weak,
            ),
            depth_variance_weak: env_f32("FACEGATE_DEPTH_VARIANCE_WEAK", d.depth_variance_weak),
            motion_warmup: env_usize("FACEGATE_MOTION_WARMUP", d.motion_warmup),
            motion_static_variance: env_f32(
                "FACEGATE_MOTION_STATIC_VARIANCE",
                d.motion_static_variance,
            ),
            motion_ear_variance: env_f32("FACEGATE_MOTION_EAR_VARIANCE", d.motion_ear_variance),
            motion_pose_variance: env_f32("FACEGATE_MOTION_POSE_VARIANCE", d.motion_pose_variance),
            reflection_blue_ratio: env_f32(
                "FACEGATE_REFLECTION_BLUE_RATIO",
                d.reflection_blue_ratio,
            ),
            reflection_glare_fraction: env_f32(
                "FACEGATE_REFLECTION_GLARE_FRACTION",
                d.reflection_glare_fraction,
            ),
            reflection_glare_intensity: env_f32(
                "FACEGATE_REFLECTION_GLARE_INTENSITY",
                d.reflection_glare_intensity,
            ),
            frequency_roi_side: env_usize("FACEGATE_FREQUENCY_ROI_SIDE", d.frequency_roi_side),
            frequency_spike_ratio: env_f32(
                "FACEGATE_FREQUENCY_SPIKE_RATIO",
                d.frequency_spike_ratio,
            ),
            weights: AggregationWeights {
                texture: env_f32("FACEGATE_WEIGHT_TEXTURE", d.weights.texture),
                depth: env_f32("FACEGATE_WEIGHT_DEPTH", d.weights.depth),
                motion: env_f32("FACEGATE_WEIGHT_MOTION", d.weights.motion),
                reflection: env_f32("FACEGATE_WEIGHT_REFLECTION", d.weights.reflection),
                frequency: env_f32("FACEGATE_WEIGHT_FREQUENCY", d.weights.frequency),
            },
            live_score_threshold: env_f32("FACEGATE_SCORE_THRESHOLD", d.live_score_threshold),
            live_depth_floor: env_f32("FACEGATE_DEPTH_FLOOR", d.live_depth_floor),
            session_ttl: Duration::from_secs(env_u64(
                "FACEGATE_SESSION_TTL_SECS",
                d.session_ttl.as_secs(),
            )),
        }
    }

    /// Reject tables the gatekeeper cannot operate on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.texture_band_low >= self.texture_band_high {
            return Err(ConfigError::TextureBand {
                low: self.texture_band_low,
                high: self.texture_band_high,
            });
        }
        Ok(())
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
