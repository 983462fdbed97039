//! Image decoding for the editor.
//!
//! This module provides functionality for:
//! - Decoding fetched JPEG/PNG bytes into an RGB source bitmap
//! - Applying EXIF orientation so source space matches what a browser shows
//! - Resampling frames for on-screen rendering
//!
//! All operations are synchronous. The only suspending step in the editor is
//! fetching the bytes, which lives in [`crate::loader`].

mod resize;
mod source;
mod types;

pub use resize::{fit_dimensions, resize};
pub use source::decode_image;
pub use types::{DecodeError, DecodedImage, FilterType};
use types::Orientation;
