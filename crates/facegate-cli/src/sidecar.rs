//! Landmark sidecar files.
//!
//! The mesh provider is an upstream service in production; on the command
//! line its output arrives as a JSON sidecar next to each frame: an array
//! of `[x, y, z]` triples in mesh-topology order.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use facegate_core::{
    FaceImage, Landmark, LandmarkBackend, LandmarkSet, ProviderError,
};

/// Sidecar path for a frame: `frame_001.png` -> `frame_001.landmarks.json`.
pub fn sidecar_path(frame: &Path) -> PathBuf {
    frame.with_extension("landmarks.json")
}

/// Parse a sidecar file into a validated landmark set.
pub fn load_sidecar(path: &Path) -> Result<LandmarkSet> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sidecar {}", path.display()))?;
    let triples: Vec<[f32; 3]> = serde_json::from_str(&raw)
        .with_context(|| format!("malformed sidecar {}", path.display()))?;
    let points = triples
        .into_iter()
        .map(|[x, y, z]| Landmark { x, y, z })
        .collect();
    LandmarkSet::new(points)
        .with_context(|| format!("sidecar {} has too few points", path.display()))
}

/// Replays pre-computed landmark sets in frame order.
///
/// Implements the single-threaded backend contract; callers wrap it in
/// [`facegate_core::ExclusiveProvider`] before handing it to the engine.
/// Frames past the end of the queue read as "no face found".
pub struct SidecarQueue {
    queue: VecDeque<Option<LandmarkSet>>,
}

impl SidecarQueue {
    pub fn new(items: Vec<Option<LandmarkSet>>) -> Self {
        Self {
            queue: items.into(),
        }
    }
}

impl LandmarkBackend for SidecarQueue {
    fn detect(&mut self, _image: &FaceImage) -> Result<Option<LandmarkSet>, ProviderError> {
        Ok(self.queue.pop_front().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facegate_core::{ExclusiveProvider, LandmarkProvider};

    fn mesh_json(n: usize) -> String {
        let triple = "[0.5,0.5,0.0]";
        format!("[{}]", vec![triple; n].join(","))
    }

    #[test]
    fn test_sidecar_path_replaces_extension() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/frame_001.png")),
            PathBuf::from("/tmp/frame_001.landmarks.json")
        );
    }

    #[test]
    fn test_parses_full_mesh() {
        let dir = std::env::temp_dir().join(format!(
            "facegate-sidecar-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.landmarks.json");
        std::fs::write(&path, mesh_json(468)).unwrap();

        let mesh = load_sidecar(&path).unwrap();
        assert_eq!(mesh.nose_tip().x, 0.5);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rejects_truncated_mesh() {
        let dir = std::env::temp_dir().join(format!(
            "facegate-sidecar-short-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.landmarks.json");
        std::fs::write(&path, mesh_json(12)).unwrap();

        assert!(load_sidecar(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_queue_replays_in_order_then_runs_dry() {
        let mesh = load_mesh();
        let provider = ExclusiveProvider::new(SidecarQueue::new(vec![Some(mesh), None]));
        let img = FaceImage::from_rgb8(vec![0; 12], 2, 2).unwrap();

        assert!(provider.detect(&img).unwrap().is_some());
        assert!(provider.detect(&img).unwrap().is_none());
        // Past the end: reads as no face, not an error
        assert!(provider.detect(&img).unwrap().is_none());
    }

    fn load_mesh() -> LandmarkSet {
        let points = (0..468)
            .map(|_| Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0,
            })
            .collect();
        LandmarkSet::new(points).unwrap()
    }
}
