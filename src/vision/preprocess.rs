//! Image binarization ahead of OCR
//!
//! Converts a decoded color image to single-channel grayscale and applies
//! Otsu's global threshold so text ends up black on white (or the inverse)
//! with no intermediate levels.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use tracing::debug;

use crate::error::{OcrError, Result};

/// Binarize an image for recognition.
///
/// The threshold is computed per image. Pixels brighter than the threshold
/// become white (255), all others black (0). Output dimensions always match
/// the input.
pub fn preprocess(image: &DynamicImage) -> Result<GrayImage> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(OcrError::InvalidImage(format!(
            "image has no pixels ({width}x{height})"
        )));
    }

    let gray = to_grayscale(image);
    let level = otsu_level(&gray);
    debug!("Binarizing {}x{} image at Otsu level {}", width, height, level);

    Ok(binarize(&gray, level))
}

/// Grayscale conversion with BT.601 luminance weights
fn to_grayscale(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let gray = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([gray.round().clamp(0.0, 255.0) as u8])
    })
}

/// Two-level threshold: strictly above `level` is white
fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > level { 255 } else { 0 };
    }
    out
}
