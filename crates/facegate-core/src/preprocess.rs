//! Capture preprocessing: low-light classification and contrast
//! normalization.
//!
//! Normalization is always applied before analysis; the low-light flag is
//! reported on the verdict, not gated on.

use crate::frame::FaceImage;

/// True when the mean grayscale intensity falls below `mean_threshold`
/// (0–255 scale).
pub fn is_low_light(image: &FaceImage, mean_threshold: f32) -> bool {
    image.grayscale().mean().unwrap_or(0.0) < mean_threshold
}

/// Linear contrast stretch: rescale the observed `[min, max]` intensity
/// range to the full `[0, 255]` range so the analyzers see comparable
/// dynamic range regardless of ambient lighting.
///
/// Returns a new image; the input is not mutated. Flat images (min == max)
/// pass through unchanged.
pub fn stretch_contrast(image: &FaceImage) -> FaceImage {
    let raw = image.as_raw();
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    for &v in raw {
        min = min.min(v);
        max = max.max(v);
    }
    if max <= min {
        return image.clone();
    }

    let scale = 255.0 / (max - min) as f32;
    let stretched = raw
        .iter()
        .map(|&v| ((v - min) as f32 * scale).round() as u8)
        .collect();
    FaceImage::from_validated(stretched, image.width(), image.height())
}
