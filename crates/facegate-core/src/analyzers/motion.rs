//! Temporal motion analysis.
//!
//! A live face exhibits involuntary blink dynamics and head drift across
//! consecutive captures. A replayed still is perfectly static; a photo held
//! in hand shows only low-amplitude jitter. This is the sole stateful
//! analyzer: it appends the current eye-aspect-ratio and nose position to
//! the session history and scores the accumulated variance.

use crate::analyzers::{Signal, SignalAnalyzer, SignalContext};
use crate::config::Calibration;

pub struct MotionAnalyzer {
    warmup: usize,
    static_variance: f32,
    ear_variance: f32,
    pose_variance: f32,
}

impl MotionAnalyzer {
    pub fn new(cal: &Calibration) -> Self {
        Self {
            warmup: cal.motion_warmup,
            static_variance: cal.motion_static_variance,
            ear_variance: cal.motion_ear_variance,
            pose_variance: cal.motion_pose_variance,
        }
    }
}

impl SignalAnalyzer for MotionAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Motion
    }

    fn score(&self, ctx: &SignalContext<'_>) -> f32 {
        let Some(mesh) = ctx.landmarks else {
            return 0.0;
        };

        let ear = mesh.mean_eye_aspect_ratio();
        let nose = mesh.nose_tip();

        let mut state = ctx.session.lock().unwrap_or_else(|e| e.into_inner());
        state.record(ear, (nose.x, nose.y));

        if state.samples() < self.warmup {
            // Warm-up: not enough history to tell motion from stillness
            return 0.5;
        }

        let ear_var = state.ear_variance();
        let pose_var = state.pose_variance();
        drop(state);

        if ear_var < self.static_variance && pose_var < self.static_variance {
            return 0.0;
        }
        if ear_var > self.ear_variance || pose_var > self.pose_variance {
            return 1.0;
        }
        0.3
    }
}
