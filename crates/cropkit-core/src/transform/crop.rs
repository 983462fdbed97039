//! Crop rectangles in normalized source space.
//!
//! A crop is stored once, as fractions of the *unrotated* source bitmap.
//! It does not depend on how large the preview is drawn or on the current
//! rotation, so rotation and crop can be edited in any order. Converting to
//! and from display space happens at the edges: [`NormalizedPoint::unrotated`]
//! brings pointer input in, [`CropRect::rotated`] takes the selection out to
//! the overlay.
//!
//! # Coordinate System
//!
//! - (0.0, 0.0) = top-left corner of the source
//! - (1.0, 1.0) = bottom-right corner of the source
//! - width/height are fractions of the source dimensions

use serde::{Deserialize, Serialize};

use super::Rotation;
use crate::decode::DecodedImage;

/// Tolerance when deciding whether a rect is the full frame.
const FULL_FRAME_EPSILON: f64 = 1e-9;

/// A point in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both coordinates into `[0, 1]`. NaN becomes 0.
    pub fn clamped(self) -> Self {
        Self {
            x: clamp_unit(self.x),
            y: clamp_unit(self.y),
        }
    }

    /// Map a source-space point into the display space of `rotation`.
    pub fn rotated(self, rotation: Rotation) -> Self {
        let Self { x, y } = self;
        match rotation {
            Rotation::Deg0 => Self { x, y },
            Rotation::Deg90 => Self { x: 1.0 - y, y: x },
            Rotation::Deg180 => Self {
                x: 1.0 - x,
                y: 1.0 - y,
            },
            Rotation::Deg270 => Self { x: y, y: 1.0 - x },
        }
    }

    /// Map a display-space point of `rotation` back into source space.
    pub fn unrotated(self, rotation: Rotation) -> Self {
        self.rotated(rotation.inverse())
    }
}

/// Crop rectangle, normalized against the unrotated source.
///
/// Invariants maintained by every constructor except the struct literal:
/// `0 <= x`, `0 <= y`, `width >= 0`, `height >= 0`, `x + width <= 1`,
/// `y + height <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for CropRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl CropRect {
    /// The whole frame: "no crop".
    pub const FULL: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Build a rect from raw values, forcing it inside the unit square.
    ///
    /// The origin is clamped into `[0, 1]`; width and height are clamped to be
    /// non-negative and then shrunk so the rect ends at or before 1. The
    /// origin is never moved to make room.
    pub fn clamped(x: f64, y: f64, width: f64, height: f64) -> Self {
        let x = clamp_unit(x);
        let y = clamp_unit(y);
        Self {
            x,
            y,
            width: clamp_unit(width).min(1.0 - x),
            height: clamp_unit(height).min(1.0 - y),
        }
    }

    /// The rect spanned by two corner points, in either order.
    pub fn from_corners(a: NormalizedPoint, b: NormalizedPoint) -> Self {
        Self::clamped(
            a.x.min(b.x),
            a.y.min(b.y),
            (b.x - a.x).abs(),
            (b.y - a.y).abs(),
        )
    }

    /// A zero-size rect at `point`.
    pub fn at_point(point: NormalizedPoint) -> Self {
        Self::clamped(point.x, point.y, 0.0, 0.0)
    }

    pub fn is_full_frame(&self) -> bool {
        self.x.abs() < FULL_FRAME_EPSILON
            && self.y.abs() < FULL_FRAME_EPSILON
            && (self.width - 1.0).abs() < FULL_FRAME_EPSILON
            && (self.height - 1.0).abs() < FULL_FRAME_EPSILON
    }

    /// Whether the invariants hold.
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x + self.width <= 1.0 + FULL_FRAME_EPSILON
            && self.y + self.height <= 1.0 + FULL_FRAME_EPSILON
    }

    /// True if either side is below `min_span`.
    pub fn is_smaller_than(&self, min_span: f64) -> bool {
        self.width < min_span || self.height < min_span
    }

    /// Map this source-space rect into the display space of `rotation`.
    ///
    /// Quarter turns keep rects axis-aligned, so the result is again a rect;
    /// width and height swap on odd turns.
    pub fn rotated(&self, rotation: Rotation) -> CropRect {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        let (rx, ry, rw, rh) = match rotation {
            Rotation::Deg0 => (x, y, w, h),
            Rotation::Deg90 => (1.0 - y - h, x, h, w),
            Rotation::Deg180 => (1.0 - x - w, 1.0 - y - h, w, h),
            Rotation::Deg270 => (y, 1.0 - x - w, h, w),
        };
        CropRect::clamped(rx, ry, rw, rh)
    }

    /// Convert to whole pixels of a `width x height` source.
    ///
    /// Edges are rounded to the nearest pixel, the rect is kept inside the
    /// source, and the result is at least 1x1.
    pub fn to_source_rect(&self, width: u32, height: u32) -> SourceRect {
        let src_w = width as f64;
        let src_h = height as f64;

        let left = (clamp_unit(self.x) * src_w).round() as u32;
        let top = (clamp_unit(self.y) * src_h).round() as u32;
        let px_width = (clamp_unit(self.width) * src_w).round() as u32;
        let px_height = (clamp_unit(self.height) * src_h).round() as u32;

        let left = left.min(width.saturating_sub(1));
        let top = top.min(height.saturating_sub(1));
        let right = left.saturating_add(px_width).min(width);
        let bottom = top.saturating_add(px_height).min(height);

        SourceRect {
            x: left,
            y: top,
            width: right.saturating_sub(left).max(1),
            height: bottom.saturating_sub(top).max(1),
        }
    }
}

/// A crop in whole source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Copy the pixels of `rect` out of `image`.
///
/// `rect` must come from [`CropRect::to_source_rect`] for this image's
/// dimensions. A rect covering the whole image returns a clone.
pub fn apply_crop(image: &DecodedImage, rect: SourceRect) -> DecodedImage {
    if rect.x == 0 && rect.y == 0 && rect.width == image.width && rect.height == image.height {
        return image.clone();
    }

    let row_bytes = rect.width as usize * 3;
    let mut output = Vec::with_capacity(row_bytes * rect.height as usize);

    for y in rect.y..rect.y + rect.height {
        let start = (y as usize * image.width as usize + rect.x as usize) * 3;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    DecodedImage {
        width: rect.width,
        height: rect.height,
        pixels: output,
    }
}

#[inline]
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    fn approx_eq(a: &CropRect, b: &CropRect) -> bool {
        (a.x - b.x).abs() < 1e-9
            && (a.y - b.y).abs() < 1e-9
            && (a.width - b.width).abs() < 1e-9
            && (a.height - b.height).abs() < 1e-9
    }

    #[test]
    fn test_default_is_full_frame() {
        assert!(CropRect::default().is_full_frame());
        assert!(!CropRect::clamped(0.1, 0.0, 0.9, 1.0).is_full_frame());
    }

    #[test]
    fn test_from_corners_any_order() {
        let a = NormalizedPoint::new(0.8, 0.2);
        let b = NormalizedPoint::new(0.3, 0.6);
        let rect = CropRect::from_corners(a, b);
        assert!(approx_eq(&rect, &CropRect::clamped(0.3, 0.2, 0.5, 0.4)));
        assert_eq!(rect, CropRect::from_corners(b, a));
    }

    #[test]
    fn test_clamped_shrinks_instead_of_moving() {
        let rect = CropRect::clamped(0.7, 0.9, 0.5, 0.5);
        assert_eq!(rect.x, 0.7);
        assert_eq!(rect.y, 0.9);
        assert!((rect.width - 0.3).abs() < 1e-12);
        assert!((rect.height - 0.1).abs() < 1e-12);
        assert!(rect.is_valid());
    }

    #[test]
    fn test_clamped_handles_nan_and_negatives() {
        let rect = CropRect::clamped(f64::NAN, -0.5, -1.0, 2.0);
        assert_eq!(rect, CropRect::clamped(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_is_smaller_than() {
        assert!(CropRect::clamped(0.0, 0.0, 0.04, 0.5).is_smaller_than(0.05));
        assert!(CropRect::clamped(0.0, 0.0, 0.5, 0.049).is_smaller_than(0.05));
        assert!(!CropRect::clamped(0.0, 0.0, 0.05, 0.05).is_smaller_than(0.05));
    }

    #[test]
    fn test_rotated_90_moves_left_strip_to_top() {
        // Left quarter of the source shows up as the top quarter after a
        // clockwise quarter turn.
        let left_strip = CropRect::clamped(0.0, 0.0, 0.25, 1.0);
        let shown = left_strip.rotated(Rotation::Deg90);
        assert!(approx_eq(&shown, &CropRect::clamped(0.0, 0.0, 1.0, 0.25)));
    }

    #[test]
    fn test_rotated_270_moves_left_strip_to_bottom() {
        let left_strip = CropRect::clamped(0.0, 0.0, 0.25, 1.0);
        let shown = left_strip.rotated(Rotation::Deg270);
        assert!(approx_eq(&shown, &CropRect::clamped(0.0, 0.75, 1.0, 0.25)));
    }

    #[test]
    fn test_rotated_matches_point_mapping() {
        let rect = CropRect::clamped(0.1, 0.2, 0.3, 0.4);
        for r in [
            Rotation::Deg0,
            Rotation::Deg90,
            Rotation::Deg180,
            Rotation::Deg270,
        ] {
            let a = NormalizedPoint::new(rect.x, rect.y).rotated(r);
            let b = NormalizedPoint::new(rect.x + rect.width, rect.y + rect.height).rotated(r);
            assert!(approx_eq(&rect.rotated(r), &CropRect::from_corners(a, b)));
        }
    }

    #[test]
    fn test_unrotated_inverts_rotated() {
        let p = NormalizedPoint::new(0.15, 0.7);
        for r in [Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            let back = p.rotated(r).unrotated(r);
            assert!((back.x - p.x).abs() < 1e-12 && (back.y - p.y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_source_rect_geometry() {
        let rect = CropRect::clamped(0.25, 0.0, 0.5, 1.0);
        assert_eq!(
            rect.to_source_rect(800, 600),
            SourceRect {
                x: 200,
                y: 0,
                width: 400,
                height: 600
            }
        );
    }

    #[test]
    fn test_source_rect_minimum_one_pixel() {
        let rect = CropRect::clamped(0.999, 0.999, 0.0, 0.0);
        let px = rect.to_source_rect(100, 100);
        assert_eq!((px.width, px.height), (1, 1));
        assert!(px.x < 100 && px.y < 100);
    }

    #[test]
    fn test_apply_crop_copies_region() {
        let img = test_image(10, 10);
        let rect = CropRect::clamped(0.3, 0.3, 0.4, 0.4).to_source_rect(10, 10);
        let out = apply_crop(&img, rect);
        assert_eq!((out.width, out.height), (4, 4));
        // (3, 3) in a 10-wide image has value 33
        assert_eq!(out.pixel(0, 0), [33, 33, 33]);
        assert_eq!(out.pixel(3, 3), [66, 66, 66]);
    }

    #[test]
    fn test_apply_crop_full_is_identity() {
        let img = test_image(12, 7);
        let out = apply_crop(&img, CropRect::FULL.to_source_rect(12, 7));
        assert_eq!(out, img);
    }
}
