//! Drag-to-select state machine.
//!
//! Raw pointer events become explicit transitions:
//!
//! ```text
//!            press                 move
//!   Idle ─────────────▶ Dragging ◀──────┐
//!    ▲                     │  └─────────┘
//!    └──────── release ────┘
//! ```
//!
//! While dragging, the controller holds a provisional selection that the
//! renderer draws as a live overlay. Nothing reaches [`TransformState`] until
//! release: a gesture smaller than the minimum span resets the crop to the
//! full frame, anything larger is committed.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MIN_CROP_SPAN;
use crate::transform::{CropRect, NormalizedPoint, Rotation, TransformState};

/// A pointer position in on-screen (CSS) pixels, relative to the top-left
/// corner of the render target element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
}

impl PointerInput {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the render target, both in backing pixels and as laid out on
/// screen. The two differ when the host scales the element with CSS.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub css_width: f64,
    pub css_height: f64,
}

impl Viewport {
    /// A viewport drawn at its natural size.
    pub fn unscaled(width: f64, height: f64) -> Self {
        Self {
            pixel_width: width,
            pixel_height: height,
            css_width: width,
            css_height: height,
        }
    }

    /// Convert on-screen input to a normalized point in source space.
    ///
    /// The input is scaled into backing pixels, divided by the backing size,
    /// clamped to the frame, then un-rotated so that it lands in the
    /// unrotated source. Returns `None` for a degenerate viewport.
    pub fn normalize(&self, input: PointerInput, rotation: Rotation) -> Option<NormalizedPoint> {
        if !(self.pixel_width > 0.0 && self.pixel_height > 0.0) {
            return None;
        }
        let scale_x = if self.css_width > 0.0 {
            self.pixel_width / self.css_width
        } else {
            1.0
        };
        let scale_y = if self.css_height > 0.0 {
            self.pixel_height / self.css_height
        } else {
            1.0
        };

        let display = NormalizedPoint::new(
            input.x * scale_x / self.pixel_width,
            input.y * scale_y / self.pixel_height,
        )
        .clamped();

        Some(display.unrotated(rotation))
    }
}

/// An in-progress selection gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub anchor: NormalizedPoint,
    pub current: NormalizedPoint,
}

impl DragSession {
    /// The provisional rect between anchor and current point.
    pub fn selection(&self) -> CropRect {
        CropRect::from_corners(self.anchor, self.current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// What a release did to the committed crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseOutcome {
    /// The selection was large enough and is now the crop.
    Committed(CropRect),
    /// The selection was too small; the crop was reset to the full frame.
    Discarded,
    /// There was no gesture in progress.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    min_span: f64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CROP_SPAN)
    }
}

impl DragController {
    pub fn new(min_span: f64) -> Self {
        Self {
            state: DragState::Idle,
            min_span,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The live selection, if a gesture is in progress.
    pub fn selection(&self) -> Option<CropRect> {
        match self.state {
            DragState::Dragging(session) => Some(session.selection()),
            DragState::Idle => None,
        }
    }

    /// Start a gesture at `point`. Pressing again mid-gesture restarts it.
    pub fn press(&mut self, point: NormalizedPoint) {
        let point = point.clamped();
        self.state = DragState::Dragging(DragSession {
            anchor: point,
            current: point,
        });
    }

    /// Track the pointer. Returns `false` (and does nothing) when idle.
    pub fn move_to(&mut self, point: NormalizedPoint) -> bool {
        match &mut self.state {
            DragState::Dragging(session) => {
                session.current = point.clamped();
                true
            }
            DragState::Idle => false,
        }
    }

    /// Finish the gesture, committing or discarding its selection.
    pub fn release(&mut self, transform: &mut TransformState) -> ReleaseOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return ReleaseOutcome::Ignored;
        };

        let selection = session.selection();
        if selection.is_smaller_than(self.min_span) {
            debug!(
                "discarding {:.3}x{:.3} selection below minimum span {}",
                selection.width, selection.height, self.min_span
            );
            transform.reset_crop();
            ReleaseOutcome::Discarded
        } else {
            debug!("committing crop {:?}", selection);
            transform.commit_crop(selection);
            ReleaseOutcome::Committed(transform.crop)
        }
    }

    /// Abandon a gesture without touching the committed crop.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> NormalizedPoint {
        NormalizedPoint::new(x, y)
    }

    #[test]
    fn test_starts_idle() {
        let drag = DragController::default();
        assert_eq!(drag.state(), DragState::Idle);
        assert!(drag.selection().is_none());
    }

    #[test]
    fn test_press_creates_zero_size_selection() {
        let mut drag = DragController::default();
        drag.press(pt(0.4, 0.6));
        let selection = drag.selection().unwrap();
        assert_eq!((selection.x, selection.y), (0.4, 0.6));
        assert_eq!((selection.width, selection.height), (0.0, 0.0));
    }

    #[test]
    fn test_move_updates_provisional_rect_without_committing() {
        let mut drag = DragController::default();
        let transform = TransformState::new();
        drag.press(pt(0.8, 0.7));
        assert!(drag.move_to(pt(0.2, 0.1)));

        let selection = drag.selection().unwrap();
        assert!((selection.x - 0.2).abs() < 1e-12);
        assert!((selection.y - 0.1).abs() < 1e-12);
        assert!((selection.width - 0.6).abs() < 1e-12);
        assert!((selection.height - 0.6).abs() < 1e-12);
        assert!(transform.crop.is_full_frame());
    }

    #[test]
    fn test_move_while_idle_is_noop() {
        let mut drag = DragController::default();
        assert!(!drag.move_to(pt(0.5, 0.5)));
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn test_release_commits_large_selection() {
        let mut drag = DragController::default();
        let mut transform = TransformState::new();
        drag.press(pt(0.1, 0.1));
        drag.move_to(pt(0.6, 0.5));

        let outcome = drag.release(&mut transform);
        assert!(matches!(outcome, ReleaseOutcome::Committed(_)));
        assert!((transform.crop.width - 0.5).abs() < 1e-12);
        assert!((transform.crop.height - 0.4).abs() < 1e-12);
        assert!(!drag.is_active());
    }

    #[test]
    fn test_release_discards_trivial_selection() {
        let mut drag = DragController::default();
        let mut transform = TransformState::new();
        transform.commit_crop(CropRect::clamped(0.2, 0.2, 0.5, 0.5));

        drag.press(pt(0.1, 0.1));
        drag.move_to(pt(0.6, 0.14));
        assert_eq!(drag.release(&mut transform), ReleaseOutcome::Discarded);
        assert!(transform.crop.is_full_frame());
    }

    #[test]
    fn test_click_without_move_resets_crop() {
        let mut drag = DragController::default();
        let mut transform = TransformState::new();
        transform.commit_crop(CropRect::clamped(0.2, 0.2, 0.5, 0.5));
        drag.press(pt(0.5, 0.5));
        assert_eq!(drag.release(&mut transform), ReleaseOutcome::Discarded);
        assert!(transform.crop.is_full_frame());
    }

    #[test]
    fn test_move_after_release_is_ignored() {
        let mut drag = DragController::default();
        let mut transform = TransformState::new();
        drag.press(pt(0.1, 0.1));
        drag.move_to(pt(0.9, 0.9));
        drag.release(&mut transform);
        let committed = transform.crop;

        assert!(!drag.move_to(pt(0.2, 0.2)));
        assert_eq!(drag.release(&mut transform), ReleaseOutcome::Ignored);
        assert_eq!(transform.crop, committed);
    }

    #[test]
    fn test_custom_threshold() {
        let mut drag = DragController::new(0.5);
        let mut transform = TransformState::new();
        drag.press(pt(0.0, 0.0));
        drag.move_to(pt(0.4, 0.9));
        assert_eq!(drag.release(&mut transform), ReleaseOutcome::Discarded);
    }

    #[test]
    fn test_cancel_keeps_committed_crop() {
        let mut drag = DragController::default();
        let mut transform = TransformState::new();
        let crop = CropRect::clamped(0.1, 0.1, 0.3, 0.3);
        transform.commit_crop(crop);
        drag.press(pt(0.5, 0.5));
        drag.cancel();
        assert!(!drag.is_active());
        assert_eq!(transform.crop, crop);
    }

    #[test]
    fn test_viewport_accounts_for_css_scale() {
        // 600px backing store shown at 300 CSS px.
        let viewport = Viewport {
            pixel_width: 600.0,
            pixel_height: 400.0,
            css_width: 300.0,
            css_height: 200.0,
        };
        let p = viewport
            .normalize(PointerInput::new(150.0, 50.0), Rotation::Deg0)
            .unwrap();
        assert!((p.x - 0.5).abs() < 1e-12);
        assert!((p.y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_viewport_clamps_outside_points() {
        let viewport = Viewport::unscaled(100.0, 100.0);
        let p = viewport
            .normalize(PointerInput::new(-20.0, 150.0), Rotation::Deg0)
            .unwrap();
        assert_eq!((p.x, p.y), (0.0, 1.0));
    }

    #[test]
    fn test_viewport_unrotates_into_source_space() {
        // After a clockwise quarter turn the top-right display corner shows
        // the source top-left corner.
        let viewport = Viewport::unscaled(300.0, 400.0);
        let p = viewport
            .normalize(PointerInput::new(300.0, 0.0), Rotation::Deg90)
            .unwrap();
        assert!(p.x.abs() < 1e-12 && p.y.abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_viewport() {
        let viewport = Viewport::unscaled(0.0, 100.0);
        assert!(viewport
            .normalize(PointerInput::new(1.0, 1.0), Rotation::Deg0)
            .is_none());
    }
}
