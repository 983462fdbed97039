//! Full-resolution composition of the final output.
//!
//! The compositor repeats the preview's geometry at source resolution:
//! the same source sub-rectangle, the same quarter turn, no scaling. The
//! encoded result therefore has exactly the aspect ratio and orientation the
//! preview showed.

use log::warn;
use thiserror::Error;

use crate::decode::DecodedImage;
use crate::encode::encode_image;
use crate::loader::SourceBitmap;
use crate::transform::{apply_crop, apply_rotation, TransformState};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// The bitmap may be displayed but its pixels may not be read back.
    #[error("pixel extraction is not allowed for this image")]
    ExtractionForbidden,

    /// Something went wrong building or encoding the output.
    #[error("composition failed: {0}")]
    CompositionFailed(String),
}

/// The composed, encoded photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    /// JPEG bytes.
    pub bytes: Vec<u8>,
}

/// Crop and rotate at full resolution without encoding.
pub fn compose_pixels(bitmap: &DecodedImage, state: &TransformState) -> DecodedImage {
    let region = state.crop.to_source_rect(bitmap.width, bitmap.height);
    apply_rotation(&apply_crop(bitmap, region), state.rotation)
}

/// Compose and encode the final output.
///
/// Refuses up front with `ExtractionForbidden` when the bitmap was loaded
/// without extraction permission; no pixel work is attempted.
pub fn compose(
    bitmap: &SourceBitmap,
    state: &TransformState,
    quality: u8,
) -> Result<EncodedImage, ComposeError> {
    if !bitmap.extraction_allowed {
        return Err(ComposeError::ExtractionForbidden);
    }

    let image = &bitmap.image;
    if image.is_empty() || image.pixels.len() != image.width as usize * image.height as usize * 3 {
        return Err(ComposeError::CompositionFailed(format!(
            "source bitmap is malformed ({}x{}, {} bytes)",
            image.width,
            image.height,
            image.pixels.len()
        )));
    }

    let output = compose_pixels(image, state);
    let bytes = encode_image(&output, quality).map_err(|e| {
        warn!("encoding {}x{} output failed: {}", output.width, output.height, e);
        ComposeError::CompositionFailed(e.to_string())
    })?;

    Ok(EncodedImage {
        width: output.width,
        height: output.height,
        bytes,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::render::{render, RenderMode, RenderSnapshot};
    use crate::transform::{CropRect, Rotation};
    use proptest::prelude::*;

    fn rotation_strategy() -> impl Strategy<Value = Rotation> {
        prop_oneof![
            Just(Rotation::Deg0),
            Just(Rotation::Deg90),
            Just(Rotation::Deg180),
            Just(Rotation::Deg270),
        ]
    }

    proptest! {
        /// Property: the rendered preview and the composed output have the
        /// same aspect ratio and orientation.
        #[test]
        fn prop_preview_output_parity(
            (width, height) in (20u32..=200, 20u32..=200),
            x in 0.0f64..=0.5, y in 0.0f64..=0.5,
            w in 0.1f64..=0.5, h in 0.1f64..=0.5,
            rotation in rotation_strategy(),
        ) {
            let crop = CropRect::clamped(x, y, w, h);
            let source = DecodedImage::filled(width, height, [1, 2, 3]);
            let config = EditorConfig::default();
            let snapshot = RenderSnapshot { rotation, crop, selection: None };

            let preview = render(&source, &snapshot, &config).unwrap();
            let output = compose_pixels(&source, &TransformState { rotation, crop });

            prop_assert_eq!(preview.mode, RenderMode::Preview);
            let (pw, ph) = (preview.width(), preview.height());
            let (ow, oh) = (output.width as f64, output.height as f64);
            let edge = config.max_display_edge;

            // Same orientation and ratio, within one display pixel of rounding.
            if ow >= oh {
                prop_assert_eq!(pw, edge);
                prop_assert!((ph as f64 - oh * edge as f64 / ow).abs() <= 1.0,
                    "preview {}x{} vs output {}x{}", pw, ph, ow, oh);
            } else {
                prop_assert_eq!(ph, edge);
                prop_assert!((pw as f64 - ow * edge as f64 / oh).abs() <= 1.0,
                    "preview {}x{} vs output {}x{}", pw, ph, ow, oh);
            }
        }
    }
}
