//! Facial landmark geometry and the landmark-provider capability contract.
//!
//! The engine never runs mesh inference itself. An external provider,
//! typically an ONNX face-mesh backend constructed once at startup, is
//! injected at engine construction and consulted once per check.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::FaceImage;

/// Number of points in the face-mesh topology the engine consumes
/// (MediaPipe face-mesh numbering).
pub const MESH_POINTS: usize = 468;

/// Additive guard against near-zero denominators.
pub(crate) const EPSILON: f32 = 1e-6;

/// Named indices into the fixed mesh topology.
pub mod index {
    pub const NOSE_TIP: usize = 1;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_TOP: usize = 159;
    pub const LEFT_EYE_BOTTOM: usize = 145;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_TOP: usize = 386;
    pub const RIGHT_EYE_BOTTOM: usize = 374;
    pub const CHIN: usize = 152;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
}

/// One mesh point. `x` and `y` are normalized image-relative coordinates in
/// `[0, 1]`; `z` is relative depth where more negative means closer to the
/// camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Error, Debug)]
pub enum LandmarkError {
    #[error("landmark set has {0} points, expected at least {MESH_POINTS}")]
    TooFewPoints(usize),
}

/// An ordered, fixed-topology set of 3D facial landmarks.
#[derive(Debug, Clone, Serialize)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// Wrap an ordered point list. Fails when the list is shorter than the
    /// mesh topology, which would make the named indices unreachable.
    pub fn new(points: Vec<Landmark>) -> Result<Self, LandmarkError> {
        if points.len() < MESH_POINTS {
            return Err(LandmarkError::TooFewPoints(points.len()));
        }
        Ok(Self { points })
    }

    #[inline]
    pub fn point(&self, idx: usize) -> Landmark {
        self.points[idx]
    }

    pub fn nose_tip(&self) -> Landmark {
        self.points[index::NOSE_TIP]
    }

    /// Eye aspect ratio: vertical eyelid separation over horizontal
    /// eye-corner separation, with an epsilon guard on the denominator.
    fn eye_aspect_ratio(&self, top: usize, bottom: usize, inner: usize, outer: usize) -> f32 {
        let vertical = (self.points[top].y - self.points[bottom].y).abs();
        let horizontal = (self.points[inner].x - self.points[outer].x).abs();
        vertical / (horizontal + EPSILON)
    }

    /// Mean aspect ratio of both eyes: the blink/micro-expression signal
    /// tracked by the motion analyzer.
    pub fn mean_eye_aspect_ratio(&self) -> f32 {
        let left = self.eye_aspect_ratio(
            index::LEFT_EYE_TOP,
            index::LEFT_EYE_BOTTOM,
            index::LEFT_EYE_INNER,
            index::LEFT_EYE_OUTER,
        );
        let right = self.eye_aspect_ratio(
            index::RIGHT_EYE_TOP,
            index::RIGHT_EYE_BOTTOM,
            index::RIGHT_EYE_INNER,
            index::RIGHT_EYE_OUTER,
        );
        (left + right) / 2.0
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("landmark backend failure: {0}")]
    Backend(String),
}

/// Capability consumed from the external landmark provider.
///
/// `detect` must be deterministic per call and safe for concurrent
/// invocation. A backend that cannot guarantee concurrent safety should
/// implement [`LandmarkBackend`] instead and be wrapped in
/// [`ExclusiveProvider`].
pub trait LandmarkProvider: Send + Sync {
    /// Returns the mesh for the most prominent face, or `None` when no face
    /// is found.
    fn detect(&self, image: &FaceImage) -> Result<Option<LandmarkSet>, ProviderError>;
}

/// Contract for detection backends that require exclusive access per call.
pub trait LandmarkBackend: Send {
    fn detect(&mut self, image: &FaceImage) -> Result<Option<LandmarkSet>, ProviderError>;
}

/// Serializes calls into a backend that is not safe for concurrent use.
pub struct ExclusiveProvider<B> {
    inner: Mutex<B>,
}

impl<B> ExclusiveProvider<B> {
    pub fn new(backend: B) -> Self {
        Self {
            inner: Mutex::new(backend),
        }
    }
}

impl<B: LandmarkBackend> LandmarkProvider for ExclusiveProvider<B> {
    fn detect(&self, image: &FaceImage) -> Result<Option<LandmarkSet>, ProviderError> {
        let mut backend = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        backend.detect(image)
    }
}

/// Full mesh with every point at the same position; tests override the
/// named indices they care about.
#[cfg(test)]
pub(crate) fn uniform_mesh(x: f32, y: f32, z: f32) -> Vec<Landmark> {
    vec![Landmark { x, y, z }; MESH_POINTS]
}
