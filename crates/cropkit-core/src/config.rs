//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::decode::FilterType;

/// Longer edge of the rendered preview, in display pixels.
pub const DEFAULT_MAX_DISPLAY_EDGE: u32 = 600;

/// Gestures narrower or shorter than this fraction of the frame are treated
/// as accidental clicks and revert to the full frame.
pub const DEFAULT_MIN_CROP_SPAN: f64 = 0.05;

/// JPEG quality of the composed output.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Tunables for the editor. Every field has a default, so a host may pass a
/// partial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Longer edge of overlay and preview renders.
    pub max_display_edge: u32,
    /// Minimum normalized width and height of a committed crop.
    pub min_crop_span: f64,
    /// Output JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Resampling used to fit renders to `max_display_edge`.
    pub resample_filter: FilterType,
    pub overlay: OverlayStyle,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_display_edge: DEFAULT_MAX_DISPLAY_EDGE,
            min_crop_span: DEFAULT_MIN_CROP_SPAN,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            resample_filter: FilterType::default(),
            overlay: OverlayStyle::default(),
        }
    }
}

impl EditorConfig {
    /// Return a copy with every field forced into its usable range.
    pub fn validated(mut self) -> Self {
        self.max_display_edge = self.max_display_edge.clamp(16, 8192);
        self.min_crop_span = if self.min_crop_span.is_finite() {
            self.min_crop_span.clamp(0.0, 1.0)
        } else {
            DEFAULT_MIN_CROP_SPAN
        };
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self.overlay = self.overlay.validated();
        self
    }
}

/// How the selection is drawn over the full image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// 0.0 leaves the outside untouched, 1.0 paints it black.
    pub dim_alpha: f32,
    pub stroke_color: [u8; 3],
    pub stroke_width: u32,
    /// Side of the square corner markers.
    pub marker_size: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            dim_alpha: 0.5,
            stroke_color: [255, 255, 255],
            stroke_width: 2,
            marker_size: 8,
        }
    }
}

impl OverlayStyle {
    fn validated(mut self) -> Self {
        self.dim_alpha = if self.dim_alpha.is_finite() {
            self.dim_alpha.clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.stroke_width = self.stroke_width.min(32);
        self.marker_size = self.marker_size.min(128);
        self
    }
}
