//! Gatekeeper aggregation: weighted fusion with critical-failure
//! short-circuits.

use serde::Serialize;

use crate::analyzers::Signal;
use crate::config::ConfigError;

/// Per-signal evidence scores for one check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreSet {
    pub texture: f32,
    pub depth: f32,
    pub motion: f32,
    pub reflection: f32,
    pub frequency: f32,
}

impl ScoreSet {
    pub fn get(&self, signal: Signal) -> f32 {
        match signal {
            Signal::Texture => self.texture,
            Signal::Depth => self.depth,
            Signal::Motion => self.motion,
            Signal::Reflection => self.reflection,
            Signal::Frequency => self.frequency,
        }
    }

    pub fn set(&mut self, signal: Signal, value: f32) {
        match signal {
            Signal::Texture => self.texture = value,
            Signal::Depth => self.depth = value,
            Signal::Motion => self.motion = value,
            Signal::Reflection => self.reflection = value,
            Signal::Frequency => self.frequency = value,
        }
    }

    /// `(signal, score)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (Signal, f32)> + '_ {
        Signal::ALL.into_iter().map(|s| (s, self.get(s)))
    }
}

/// Fusion weights over the five signals; must sum to exactly 1.0.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AggregationWeights {
    pub texture: f32,
    pub depth: f32,
    pub motion: f32,
    pub reflection: f32,
    pub frequency: f32,
}

impl Default for AggregationWeights {
    /// Depth dominates: 3D structure is the strongest single discriminator
    /// available without hardware depth sensing.
    fn default() -> Self {
        Self {
            texture: 0.1,
            depth: 0.5,
            motion: 0.2,
            reflection: 0.1,
            frequency: 0.1,
        }
    }
}

impl AggregationWeights {
    pub fn get(&self, signal: Signal) -> f32 {
        match signal {
            Signal::Texture => self.texture,
            Signal::Depth => self.depth,
            Signal::Motion => self.motion,
            Signal::Reflection => self.reflection,
            Signal::Frequency => self.frequency,
        }
    }

    pub fn sum(&self) -> f32 {
        self.texture + self.depth + self.motion + self.reflection + self.frequency
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Final decision for one liveness check.
///
/// Carries the full per-signal breakdown even though the binary verdict
/// would suffice; callers log it for observability.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_live: bool,
    /// Weighted evidence score in `[0, 1]`.
    pub score: f32,
    /// Capture was taken in low ambient light.
    pub low_light: bool,
    pub metrics: ScoreSet,
}

/// Pure decision rule over one [`ScoreSet`]; holds no state.
pub struct Gatekeeper {
    weights: AggregationWeights,
    score_threshold: f32,
    depth_floor: f32,
}

impl Gatekeeper {
    pub fn new(
        weights: AggregationWeights,
        score_threshold: f32,
        depth_floor: f32,
    ) -> Result<Self, ConfigError> {
        weights.validate()?;
        Ok(Self {
            weights,
            score_threshold,
            depth_floor,
        })
    }

    /// Depth absence, screen periodicity, and screen reflection are each
    /// unambiguous spoof evidence: any one rejects outright, regardless of
    /// the weighted sum.
    fn critical_fail(scores: &ScoreSet) -> bool {
        scores.depth == 0.0 || scores.frequency == 0.0 || scores.reflection == 0.0
    }

    pub fn decide(&self, scores: &ScoreSet, low_light: bool) -> Verdict {
        let score: f32 = scores.iter().map(|(s, v)| self.weights.get(s) * v).sum();
        let is_live = !Self::critical_fail(scores)
            && score > self.score_threshold
            && scores.depth > self.depth_floor;
        Verdict {
            is_live,
            score,
            low_light,
            metrics: *scores,
        }
    }
}
