//! Transform model: quarter-turn rotation and normalized crop.
//!
//! # Transform Order
//!
//! Both the preview and the final output apply transforms in this order:
//! 1. Crop (in source space)
//! 2. Rotation (about the center of the cropped region)
//!
//! # Coordinate System
//!
//! - Rotation angles are clockwise quarter turns
//! - Crop coordinates are normalized (0.0 to 1.0) against the *unrotated*
//!   source dimensions
//! - Origin is top-left corner

mod crop;
mod rotation;
mod state;

pub use crop::{apply_crop, CropRect, NormalizedPoint, SourceRect};
pub use rotation::{apply_rotation, Rotation};
pub use state::TransformState;
