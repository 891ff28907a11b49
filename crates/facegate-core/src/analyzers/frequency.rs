//! Frequency-domain moiré analysis.
//!
//! Re-capturing a digital display through a camera leaves the display's
//! pixel grid as a periodic interference pattern. In the 2-D spectrum of a
//! natural face the high-frequency content falls off smoothly; a pixel grid
//! shows up as isolated spikes far from the center.

use ndarray::{s, Array2};
use num_complex::Complex32;
use rustfft::FftPlanner;

use crate::analyzers::{Signal, SignalAnalyzer, SignalContext};
use crate::config::Calibration;
use crate::landmarks::EPSILON;

/// Half-side of the zeroed low-frequency window at the spectrum center.
const DC_WINDOW_HALF: usize = 10;
/// Minimum ROI pixel count for a meaningful spectrum.
const MIN_ROI_PIXELS: usize = 100;

pub struct FrequencyAnalyzer {
    roi_side: usize,
    spike_ratio: f32,
}

impl FrequencyAnalyzer {
    pub fn new(cal: &Calibration) -> Self {
        Self {
            roi_side: cal.frequency_roi_side,
            spike_ratio: cal.frequency_spike_ratio,
        }
    }
}

impl SignalAnalyzer for FrequencyAnalyzer {
    fn signal(&self) -> Signal {
        Signal::Frequency
    }

    fn score(&self, ctx: &SignalContext<'_>) -> f32 {
        let gray = ctx.image.grayscale();
        let (h, w) = gray.dim();

        // Centered square ROI, clipped to the image bounds
        let half = self.roi_side / 2;
        let (cy, cx) = (h / 2, w / 2);
        let (y0, y1) = (cy.saturating_sub(half), (cy + half).min(h));
        let (x0, x1) = (cx.saturating_sub(half), (cx + half).min(w));
        let roi = gray.slice(s![y0..y1, x0..x1]);
        let (rh, rw) = roi.dim();
        if rh * rw < MIN_ROI_PIXELS {
            // Too little data to read the spectrum
            return 0.5;
        }

        let spectrum = fft2(&roi.to_owned());

        // Log-magnitude with the zero-frequency bin shifted to the center
        let mut magnitude = Array2::<f32>::zeros((rh, rw));
        for y in 0..rh {
            for x in 0..rw {
                let sy = (y + rh / 2) % rh;
                let sx = (x + rw / 2) % rw;
                magnitude[[sy, sx]] = 20.0 * (spectrum[[y, x]].norm() + 1.0).ln();
            }
        }

        // Suppress the low-frequency block: always large, never
        // discriminative
        let (mid_y, mid_x) = (rh / 2, rw / 2);
        let (wy0, wy1) = (
            mid_y.saturating_sub(DC_WINDOW_HALF),
            (mid_y + DC_WINDOW_HALF).min(rh),
        );
        let (wx0, wx1) = (
            mid_x.saturating_sub(DC_WINDOW_HALF),
            (mid_x + DC_WINDOW_HALF).min(rw),
        );
        magnitude.slice_mut(s![wy0..wy1, wx0..wx1]).fill(0.0);

        let max = magnitude.iter().copied().fold(0.0f32, f32::max);
        let mean = magnitude.mean().unwrap_or(0.0);
        let spike = max / (mean + EPSILON);

        if spike > self.spike_ratio {
            0.0
        } else {
            1.0
        }
    }
}

/// Row-column 2-D forward FFT.
fn fft2(roi: &Array2<f32>) -> Array2<Complex32> {
    let (rh, rw) = roi.dim();
    let mut data = roi.mapv(|v| Complex32::new(v, 0.0));

    let mut planner = FftPlanner::new();
    let row_fft = planner.plan_fft_forward(rw);
    let col_fft = planner.plan_fft_forward(rh);

    let mut buf = vec![Complex32::default(); rw.max(rh)];
    for mut row in data.rows_mut() {
        for (dst, src) in buf.iter_mut().zip(row.iter()) {
            *dst = *src;
        }
        row_fft.process(&mut buf[..rw]);
        for (dst, src) in row.iter_mut().zip(buf.iter()) {
            *dst = *src;
        }
    }
    for mut col in data.columns_mut() {
        for (dst, src) in buf.iter_mut().zip(col.iter()) {
            *dst = *src;
        }
        col_fft.process(&mut buf[..rh]);
        for (dst, src) in col.iter_mut().zip(buf.iter()) {
            *dst = *src;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testutil::ContextFixture;
    use crate::frame::{solid_image, FaceImage};

    fn analyzer() -> FrequencyAnalyzer {
        FrequencyAnalyzer::new(&Calibration::default())
    }

    /// Horizontal sine pattern, the classic pixel-grid interference shape.
    fn moire_image(side: u32, period: f32) -> FaceImage {
        let mut data = Vec::with_capacity((side * side * 3) as usize);
        for _y in 0..side {
            for x in 0..side {
                let phase = 2.0 * std::f32::consts::PI * x as f32 / period;
                let v = (127.0 + 100.0 * phase.sin()).round() as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        FaceImage::from_rgb8(data, side, side).unwrap()
    }

    /// Deterministic white-noise texture: broadband spectrum with no
    /// isolated peaks, like natural skin micro-texture.
    fn noise_image(side: u32) -> FaceImage {
        let mut data = Vec::with_capacity((side * side * 3) as usize);
        for y in 0..side {
            for x in 0..side {
                let mut v = x
                    .wrapping_mul(374_761_393)
                    .wrapping_add(y.wrapping_mul(668_265_263));
                v = (v ^ (v >> 13)).wrapping_mul(1_274_126_177);
                let val = (v ^ (v >> 16)) as u8;
                data.extend_from_slice(&[val, val, val]);
            }
        }
        FaceImage::from_rgb8(data, side, side).unwrap()
    }

    #[test]
    fn test_undersized_roi_is_neutral() {
        // 9x9 = 81 pixels, below the minimum
        let fixture = ContextFixture::new(solid_image(9, 9, [128, 128, 128]));
        assert_eq!(analyzer().score(&fixture.ctx()), 0.5);
    }

    #[test]
    fn test_broadband_texture_has_no_spikes() {
        let fixture = ContextFixture::new(noise_image(64));
        assert_eq!(analyzer().score(&fixture.ctx()), 1.0);
    }

    #[test]
    fn test_periodic_grid_detected() {
        // Period 8 over 128 columns: spike at bin 16, outside the DC window
        let fixture = ContextFixture::new(moire_image(128, 8.0));
        assert_eq!(analyzer().score(&fixture.ctx()), 0.0);
    }

    #[test]
    fn test_roi_clipping_handles_small_images() {
        // 32x32 is far below the 240 ROI side; the clipped ROI must still
        // be analysed without panicking
        let fixture = ContextFixture::new(moire_image(32, 3.2));
        assert_eq!(analyzer().score(&fixture.ctx()), 0.0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let fixture = ContextFixture::new(moire_image(64, 8.0));
        let a = analyzer();
        assert_eq!(a.score(&fixture.ctx()), a.score(&fixture.ctx()));
    }

    #[test]
    fn test_fft_of_impulse_is_flat() {
        // A single impulse spreads uniformly across the spectrum
        let mut roi = Array2::<f32>::zeros((8, 8));
        roi[[0, 0]] = 1.0;
        let spectrum = fft2(&roi);
        for v in spectrum.iter() {
            assert!((v.norm() - 1.0).abs() < 1e-4);
        }
    }
}
