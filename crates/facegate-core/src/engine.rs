//! The liveness-scoring engine.

use std::sync::Arc;

use thiserror::Error;

use crate::aggregate::{Gatekeeper, ScoreSet, Verdict};
use crate::analyzers::{build_registry, SignalAnalyzer, SignalContext};
use crate::config::{Calibration, ConfigError};
use crate::frame::FaceImage;
use crate::landmarks::{LandmarkProvider, ProviderError};
use crate::preprocess;
use crate::session::SessionStore;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid calibration: {0}")]
    Config(#[from] ConfigError),
    #[error("landmark provider failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Anti-spoofing gate over a single injected landmark provider.
///
/// The engine is `Send + Sync` and checks run on the caller's thread: four
/// of the five analyzers are pure, and the session store serializes only
/// same-session appends, so concurrent checks for different sessions never
/// contend. Construct the provider once at startup and inject it here;
/// the engine never creates backends lazily from the hot path.
pub struct LivenessEngine {
    provider: Arc<dyn LandmarkProvider>,
    analyzers: Vec<Box<dyn SignalAnalyzer>>,
    gatekeeper: Gatekeeper,
    sessions: SessionStore,
    low_light_mean: f32,
}

impl std::fmt::Debug for LivenessEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessEngine")
            .field("analyzers", &self.analyzers.len())
            .field("low_light_mean", &self.low_light_mean)
            .finish_non_exhaustive()
    }
}

impl LivenessEngine {
    /// Build an engine around a landmark provider and a calibration table.
    /// Fails fast on a table the gatekeeper cannot operate on.
    pub fn new(
        provider: Arc<dyn LandmarkProvider>,
        calibration: Calibration,
    ) -> Result<Self, EngineError> {
        calibration.validate()?;
        let gatekeeper = Gatekeeper::new(
            calibration.weights,
            calibration.live_score_threshold,
            calibration.live_depth_floor,
        )?;
        Ok(Self {
            analyzers: build_registry(&calibration),
            gatekeeper,
            sessions: SessionStore::new(calibration.session_ttl),
            low_light_mean: calibration.low_light_mean,
            provider,
        })
    }

    /// Run one liveness check. This is the sole scoring entry point.
    ///
    /// Deterministic per image except for the motion signal, which depends
    /// on the session's accumulated history. Missing landmarks and
    /// undersized regions degrade to conservative scores inside the
    /// analyzers; only a provider failure surfaces as an error, so callers
    /// can distinguish "rejected as spoof" from "could not process".
    pub fn check_liveness(
        &self,
        image: &FaceImage,
        session_id: &str,
    ) -> Result<Verdict, EngineError> {
        let low_light = preprocess::is_low_light(image, self.low_light_mean);
        let processed = preprocess::stretch_contrast(image);

        let landmarks = self.provider.detect(&processed)?;
        if landmarks.is_none() {
            tracing::debug!(session = session_id, "no face mesh in capture");
        }

        let session = self.sessions.session(session_id);
        let ctx = SignalContext {
            image: &processed,
            landmarks: landmarks.as_ref(),
            session: &session,
        };

        let mut metrics = ScoreSet::default();
        for analyzer in &self.analyzers {
            let signal = analyzer.signal();
            let value = analyzer.score(&ctx).clamp(0.0, 1.0);
            tracing::debug!(session = session_id, signal = %signal, value, "signal scored");
            metrics.set(signal, value);
        }

        let verdict = self.gatekeeper.decide(&metrics, low_light);
        tracing::info!(
            session = session_id,
            is_live = verdict.is_live,
            score = verdict.score,
            low_light,
            "liveness check complete"
        );
        Ok(verdict)
    }

    /// Evict sessions idle longer than the calibration TTL. Returns the
    /// number evicted. Expiry also happens lazily on access; this sweep
    /// exists so long-running deployments can bound the session map.
    pub fn sweep_sessions(&self) -> usize {
        self.sessions.sweep()
    }

    /// Sessions currently tracked.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
