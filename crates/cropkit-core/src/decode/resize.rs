//! Resampling for on-screen rendering.
//!
//! The renderer scales every frame so its longer edge hits a fixed display
//! maximum. Scaling goes both ways: a small crop is enlarged to fill the
//! preview, just as a large photo is reduced.

use super::{DecodeError, DecodedImage, FilterType};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::EmptyImage` for a zero target size and
/// `DecodeError::CorruptedFile` if the pixel buffer does not match the
/// declared dimensions.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage);
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .to_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("pixel buffer size mismatch".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgb_image(resized))
}

/// Scale `(width, height)` so the longer edge equals `max_edge`, preserving
/// aspect ratio. The shorter edge is rounded and never drops below 1.
///
/// Returns `(0, 0)` for an empty input.
pub fn fit_dimensions(width: f64, height: f64, max_edge: u32) -> (u32, u32) {
    if width <= 0.0 || height <= 0.0 || max_edge == 0 {
        return (0, 0);
    }

    let scale = max_edge as f64 / width.max(height);
    let fit_w = ((width * scale).round() as u32).clamp(1, max_edge);
    let fit_h = ((height * scale).round() as u32).clamp(1, max_edge);
    (fit_w, fit_h)
}
