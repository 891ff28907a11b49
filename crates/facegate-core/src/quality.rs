//! Capture quality assessment.
//!
//! Advisory sharpness/exposure score reported alongside liveness so callers
//! can prompt for a retake instead of burning a verification attempt on a
//! blurry or badly exposed capture. The gatekeeper never consults it.

use serde::Serialize;

use crate::analyzers::second_difference_energy;
use crate::frame::FaceImage;

/// Sharpness energy that maps to a full quality score.
const SHARPNESS_FULL_SCALE: f32 = 500.0;
/// Mean-intensity band considered well exposed.
const BRIGHTNESS_LOW: f32 = 50.0;
const BRIGHTNESS_HIGH: f32 = 200.0;
/// Multiplier applied outside the exposure band.
const EXPOSURE_PENALTY: f32 = 0.7;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Raw second-difference sharpness energy.
    pub sharpness: f32,
    /// Mean grayscale intensity (0–255).
    pub brightness: f32,
    /// Normalized quality in `[0, 1]`.
    pub score: f32,
}

pub fn assess(image: &FaceImage) -> QualityReport {
    let gray = image.grayscale();
    let sharpness = second_difference_energy(&gray);
    let brightness = gray.mean().unwrap_or(0.0);

    let mut score = (sharpness / SHARPNESS_FULL_SCALE).min(1.0);
    if !(BRIGHTNESS_LOW..=BRIGHTNESS_HIGH).contains(&brightness) {
        score *= EXPOSURE_PENALTY;
    }

    QualityReport {
        sharpness,
        brightness,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::solid_image;

    #[test]
    fn test_flat_capture_scores_zero() {
        let report = assess(&solid_image(16, 16, [128, 128, 128]));
        assert_eq!(report.sharpness, 0.0);
        assert_eq!(report.score, 0.0);
    }

    fn checkerboard(low: u8, high: u8) -> FaceImage {
        let mut data = Vec::with_capacity(16 * 16 * 3);
        for y in 0..16u32 {
            for x in 0..16u32 {
                let v = if (x + y) % 2 == 0 { low } else { high };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        FaceImage::from_rgb8(data, 16, 16).unwrap()
    }

    #[test]
    fn test_dark_capture_is_penalized() {
        // Sharp enough to max out, but underexposed
        let report = assess(&checkerboard(5, 25));
        assert!(report.brightness < BRIGHTNESS_LOW);
        assert!((report.score - EXPOSURE_PENALTY).abs() < 1e-6);
    }

    #[test]
    fn test_sharp_capture_saturates_at_one() {
        // Well-exposed checkerboard: enormous second-difference energy
        let report = assess(&checkerboard(120, 130));
        assert!(report.sharpness > SHARPNESS_FULL_SCALE);
        assert_eq!(report.score, 1.0);
    }

    #[test]
    fn test_score_stays_in_unit_range() {
        for rgb in [[0, 0, 0], [255, 255, 255], [60, 120, 240]] {
            let report = assess(&solid_image(12, 12, rgb));
            assert!((0.0..=1.0).contains(&report.score));
        }
    }
}
