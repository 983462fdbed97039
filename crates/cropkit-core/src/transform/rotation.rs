//! Quarter-turn rotation.
//!
//! The editor only rotates in 90 degree steps, so rotation is an exact pixel
//! remap: no interpolation, no canvas expansion, no loss. Angles are
//! clockwise, matching how a canvas context rotates on screen.
//!
//! The remap uses inverse mapping: for each output pixel we compute the
//! source pixel it comes from. For a source of size `w x h`:
//!
//! ```text
//! Deg90:  src = (dst_y,         h - 1 - dst_x)
//! Deg180: src = (w - 1 - dst_x, h - 1 - dst_y)
//! Deg270: src = (w - 1 - dst_y, dst_x)
//! ```

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;

/// A rotation angle, always one of 0, 90, 180 or 270 degrees clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotate a further 90 degrees counter-clockwise, wrapping at 360.
    pub fn rotated_left(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg270,
            Rotation::Deg90 => Rotation::Deg0,
            Rotation::Deg180 => Rotation::Deg90,
            Rotation::Deg270 => Rotation::Deg180,
        }
    }

    /// Rotate a further 90 degrees clockwise, wrapping at 360.
    pub fn rotated_right(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Rotation::Deg90 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg90,
            other => other,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Normalize any multiple of 90 degrees (negative included).
    /// Returns `None` for angles that are not quarter turns.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            _ => Some(Rotation::Deg270),
        }
    }

    /// Rotation parity: true for odd quarter turns, where width and height swap.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Dimensions of a `width x height` frame after this rotation.
    #[inline]
    pub fn apply_to_dimensions<T>(self, width: T, height: T) -> (T, T) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = String;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
            .ok_or_else(|| format!("rotation must be a multiple of 90 degrees, got {degrees}"))
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Rotate an image by a quarter turn.
///
/// The output has the source dimensions, swapped on odd quarter turns.
/// Every source pixel lands in exactly one output pixel.
pub fn apply_rotation(image: &DecodedImage, rotation: Rotation) -> DecodedImage {
    if rotation == Rotation::Deg0 {
        return image.clone();
    }

    let (src_w, src_h) = (image.width, image.height);
    let (dst_w, dst_h) = rotation.apply_to_dimensions(src_w, src_h);

    let mut output = vec![0u8; dst_w as usize * dst_h as usize * 3];

    for dst_y in 0..dst_h {
        let dst_row = dst_y as usize * dst_w as usize * 3;
        for dst_x in 0..dst_w {
            let (src_x, src_y) = match rotation {
                Rotation::Deg0 => (dst_x, dst_y),
                Rotation::Deg90 => (dst_y, src_h - 1 - dst_x),
                Rotation::Deg180 => (src_w - 1 - dst_x, src_h - 1 - dst_y),
                Rotation::Deg270 => (src_w - 1 - dst_y, dst_x),
            };

            let src_idx = (src_y as usize * src_w as usize + src_x as usize) * 3;
            let dst_idx = dst_row + dst_x as usize * 3;
            output[dst_idx..dst_idx + 3].copy_from_slice(&image.pixels[src_idx..src_idx + 3]);
        }
    }

    DecodedImage {
        width: dst_w,
        height: dst_h,
        pixels: output,
    }
}
