//! Texture sharpness analysis.
//!
//! Printed and re-captured faces lose skin micro-texture: paper comes out
//! too flat, halftone printing and heavy sensor noise come out implausibly
//! sharp. Natural skin lands in a calibrated middle band.

use ndarray::{s, Array2};

use crate::analyzers::{Signal, SignalAnalyzer, SignalContext};
use crate::config::Calibration;

pub struct TextureAnalyzer {
    band_low: f32,
    band_high: f32,
}

impl TextureAnalyzer {
    pub fn new(cal: &Calibration) -> Self {
        Self {
            band_low: cal.texture_band_low,
            band_high: cal.texture_band_high,
        }
    }
}

impl SignalAnalyzer for TextureAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Texture
    }

    /// 1.0 inside the natural-skin band, 0.5 outside. Texture alone is not
    /// decisive, so this signal never scores an outright 0.0.
    fn score(&self, ctx: &SignalContext<'_>) -> f32 {
        let energy = second_difference_energy(&ctx.image.grayscale());
        if energy > self.band_low && energy < self.band_high {
            1.0
        } else {
            0.5
        }
    }
}

/// Summed variance of the horizontal and vertical second-difference fields,
/// a separable Laplacian sharpness proxy.
pub(crate) fn second_difference_energy(gray: &Array2<f32>) -> f32 {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }
    let dxx =
        &gray.slice(s![.., 2..]) - &(&gray.slice(s![.., 1..w - 1]) * 2.0) + &gray.slice(s![.., ..w - 2]);
    let dyy =
        &gray.slice(s![2.., ..]) - &(&gray.slice(s![1..h - 1, ..]) * 2.0) + &gray.slice(s![..h - 2, ..]);
    dxx.var(0.0) + dyy.var(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testutil::ContextFixture;
    use crate::frame::{solid_image, FaceImage};

    fn analyzer(low: f32, high: f32) -> TextureAnalyzer {
        TextureAnalyzer::new(&Calibration {
            texture_band_low: low,
            texture_band_high: high,
            ..Calibration::default()
        })
    }

    /// Deterministic high-variation pattern with abrupt level jumps.
    fn speckled_image(side: u32) -> FaceImage {
        let mut data = Vec::with_capacity((side * side * 3) as usize);
        for y in 0..side {
            for x in 0..side {
                let v = if (x * 7 + y * 13) % 3 == 0 { 220 } else { 30 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        FaceImage::from_rgb8(data, side, side).unwrap()
    }

    #[test]
    fn test_flat_surface_scores_half() {
        let fixture = ContextFixture::new(solid_image(32, 32, [128, 128, 128]));
        let score = analyzer(150.0, 1000.0).score(&fixture.ctx());
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_natural_band_scores_full() {
        let fixture = ContextFixture::new(speckled_image(32));
        // Wide band: asserts the in-band path, not the default calibration
        let score = analyzer(1.0, 1e9).score(&fixture.ctx());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_implausibly_sharp_scores_half() {
        let fixture = ContextFixture::new(speckled_image(32));
        // Same pattern, but the band excludes it from above
        let score = analyzer(0.1, 1.0).score(&fixture.ctx());
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_degenerate_image_scores_half() {
        let fixture = ContextFixture::new(solid_image(2, 2, [10, 10, 10]));
        let score = analyzer(150.0, 1000.0).score(&fixture.ctx());
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_second_difference_of_linear_ramp_is_zero() {
        // A linear ramp has constant first differences, so the second
        // difference field is identically zero.
        let gray = Array2::from_shape_fn((8, 8), |(y, x)| (3 * x + 2 * y) as f32);
        assert!(second_difference_energy(&gray).abs() < 1e-3);
    }

    #[test]
    fn test_score_is_deterministic() {
        let fixture = ContextFixture::new(speckled_image(24));
        let a = analyzer(1.0, 1e9);
        assert_eq!(a.score(&fixture.ctx()), a.score(&fixture.ctx()));
    }
}
