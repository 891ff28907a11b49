//! Face image buffer and intensity derivations.

use ndarray::Array2;
use thiserror::Error;

/// Grayscale luminosity weights (ITU-R BT.601).
const LUMA_R: f32 = 0.2989;
const LUMA_G: f32 = 0.5870;
const LUMA_B: f32 = 0.1140;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image has zero dimension ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("pixel buffer mismatch: {width}x{height} RGB needs {expected} bytes, got {got}")]
    BufferMismatch {
        width: u32,
        height: u32,
        expected: usize,
        got: usize,
    },
}

/// A cropped face capture in RGB8, row-major order.
///
/// Construction validates the buffer shape, so every `FaceImage` reaching
/// the analyzers is well-formed. A malformed buffer is an input error for
/// the caller to surface, never a spoof verdict.
#[derive(Debug, Clone)]
pub struct FaceImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl FaceImage {
    /// Wrap a raw RGB8 buffer. Fails on zero dimensions or a length that
    /// does not match `width * height * 3`.
    pub fn from_rgb8(data: Vec<u8>, width: u32, height: u32) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(ImageError::BufferMismatch {
                width,
                height,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Convert a decoded image into an analyzer-ready buffer.
    pub fn from_dynamic(img: &image::DynamicImage) -> Result<Self, ImageError> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_rgb8(rgb.into_raw(), width, height)
    }

    /// Shape-preserving constructor for buffers derived from an existing
    /// validated image.
    pub(crate) fn from_validated(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 3);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw RGB8 bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Single-channel intensity plane on the 0–255 scale, shape `(height, width)`.
    pub fn grayscale(&self) -> Array2<f32> {
        let (h, w) = (self.height as usize, self.width as usize);
        let mut gray = Array2::zeros((h, w));
        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) * 3;
                gray[[y, x]] = LUMA_R * self.data[idx] as f32
                    + LUMA_G * self.data[idx + 1] as f32
                    + LUMA_B * self.data[idx + 2] as f32;
            }
        }
        gray
    }

    /// Mean intensity of each channel: `[red, green, blue]`.
    pub fn channel_means(&self) -> [f32; 3] {
        let mut sums = [0.0f64; 3];
        for chunk in self.data.chunks_exact(3) {
            sums[0] += chunk[0] as f64;
            sums[1] += chunk[1] as f64;
            sums[2] += chunk[2] as f64;
        }
        let n = self.pixel_count() as f64;
        [
            (sums[0] / n) as f32,
            (sums[1] / n) as f32,
            (sums[2] / n) as f32,
        ]
    }
}

#[cfg(test)]
pub(crate) fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> FaceImage {
    let data = rgb
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 3)
        .collect();
    FaceImage::from_rgb8(data, width, height).unwrap()
}
