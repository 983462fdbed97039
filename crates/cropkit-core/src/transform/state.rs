//! The editable transform: a rotation plus a committed crop.

use serde::{Deserialize, Serialize};

use super::{CropRect, Rotation};

/// Rotation and committed crop for one editing session.
///
/// Plain data. Rotation never touches the crop and the crop never touches
/// rotation; both are stored in source space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformState {
    pub rotation: Rotation,
    pub crop: CropRect,
}

impl TransformState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotate_left(&mut self) {
        self.rotation = self.rotation.rotated_left();
    }

    pub fn rotate_right(&mut self) {
        self.rotation = self.rotation.rotated_right();
    }

    /// Drop the crop back to the full frame.
    pub fn reset_crop(&mut self) {
        self.crop = CropRect::FULL;
    }

    /// Replace the crop wholesale. Out-of-range input is clamped so the
    /// stored crop always satisfies the rect invariants.
    pub fn commit_crop(&mut self, rect: CropRect) {
        self.crop = CropRect::clamped(rect.x, rect.y, rect.width, rect.height);
    }

    /// Back to no rotation and no crop, as when a session opens.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the state would change the image at all.
    pub fn is_identity(&self) -> bool {
        self.rotation == Rotation::Deg0 && self.crop.is_full_frame()
    }
}
