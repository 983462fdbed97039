//! On-screen rendering of the editor.
//!
//! [`render`] is a pure function of the source bitmap and a snapshot of the
//! editing state. It picks one of two modes:
//!
//! - **Overlay**: the whole image, rotated and scaled to fit, with the live
//!   selection drawn on top (outside dimmed, border stroked, corner markers).
//!   Used while a drag is in progress or when there is no crop.
//! - **Preview**: only the cropped region, rotated and scaled to fit. This is
//!   exactly the final output at display resolution.
//!
//! Both modes scale so the longer display edge equals the configured
//! maximum. Rotation parity decides which source edge becomes the display
//! width.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::{EditorConfig, OverlayStyle};
use crate::decode::{fit_dimensions, resize, DecodeError, DecodedImage};
use crate::transform::{apply_crop, apply_rotation, CropRect, Rotation, TransformState};

/// Everything the renderer needs besides the bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderSnapshot {
    pub rotation: Rotation,
    pub crop: CropRect,
    /// The live selection while a drag is in progress.
    pub selection: Option<CropRect>,
}

impl RenderSnapshot {
    pub fn new(state: &TransformState, selection: Option<CropRect>) -> Self {
        Self {
            rotation: state.rotation,
            crop: state.crop,
            selection,
        }
    }

    pub fn drag_active(&self) -> bool {
        self.selection.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    Overlay,
    Preview,
}

/// A freshly rendered frame. Never reused between renders.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    pub mode: RenderMode,
    pub image: DecodedImage,
}

impl RenderTarget {
    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }
}

/// Preview when idle with a real crop, overlay otherwise.
pub fn render_mode(snapshot: &RenderSnapshot) -> RenderMode {
    if !snapshot.drag_active() && !snapshot.crop.is_full_frame() {
        RenderMode::Preview
    } else {
        RenderMode::Overlay
    }
}

/// Display size of a `width x height` source region after `rotation`,
/// scaled so its longer edge equals `max_edge`.
pub fn display_dimensions(width: f64, height: f64, rotation: Rotation, max_edge: u32) -> (u32, u32) {
    let (w, h) = rotation.apply_to_dimensions(width, height);
    fit_dimensions(w, h, max_edge)
}

/// Render the editor view.
///
/// # Errors
///
/// Only fails if the bitmap's pixel buffer does not match its dimensions.
pub fn render(
    bitmap: &DecodedImage,
    snapshot: &RenderSnapshot,
    config: &EditorConfig,
) -> Result<RenderTarget, DecodeError> {
    let mode = render_mode(snapshot);
    trace!(
        "rendering {:?} at {} degrees",
        mode,
        snapshot.rotation.degrees()
    );

    let image = match mode {
        RenderMode::Overlay => render_overlay(bitmap, snapshot, config)?,
        RenderMode::Preview => render_preview(bitmap, snapshot, config)?,
    };

    Ok(RenderTarget { mode, image })
}

fn render_overlay(
    bitmap: &DecodedImage,
    snapshot: &RenderSnapshot,
    config: &EditorConfig,
) -> Result<DecodedImage, DecodeError> {
    let mut frame = fit_and_rotate(bitmap, snapshot.rotation, config)?;

    let highlight = snapshot
        .selection
        .or_else(|| (!snapshot.crop.is_full_frame()).then_some(snapshot.crop));

    if let Some(rect) = highlight {
        draw_selection(&mut frame, &rect.rotated(snapshot.rotation), &config.overlay);
    }

    Ok(frame)
}

fn render_preview(
    bitmap: &DecodedImage,
    snapshot: &RenderSnapshot,
    config: &EditorConfig,
) -> Result<DecodedImage, DecodeError> {
    let region = snapshot.crop.to_source_rect(bitmap.width, bitmap.height);
    let cropped = apply_crop(bitmap, region);
    fit_and_rotate(&cropped, snapshot.rotation, config)
}

/// Scale `image` so that, once rotated, its longer edge is
/// `config.max_display_edge`, then rotate it. Scaling first keeps the
/// rotation cheap.
fn fit_and_rotate(
    image: &DecodedImage,
    rotation: Rotation,
    config: &EditorConfig,
) -> Result<DecodedImage, DecodeError> {
    let (display_w, display_h) = display_dimensions(
        image.width as f64,
        image.height as f64,
        rotation,
        config.max_display_edge,
    );
    if display_w == 0 || display_h == 0 {
        return Err(DecodeError::EmptyImage);
    }

    // Undo the parity swap to get the pre-rotation size.
    let (pre_w, pre_h) = rotation.apply_to_dimensions(display_w, display_h);
    let scaled = resize(image, pre_w, pre_h, config.resample_filter)?;
    Ok(apply_rotation(&scaled, rotation))
}

/// Pixel bounds `[left, right) x [top, bottom)` of a normalized rect.
fn pixel_bounds(frame: &DecodedImage, rect: &CropRect) -> (i64, i64, i64, i64) {
    let w = frame.width as f64;
    let h = frame.height as f64;
    let left = (rect.x * w).round() as i64;
    let top = (rect.y * h).round() as i64;
    let right = ((rect.x + rect.width) * w).round() as i64;
    let bottom = ((rect.y + rect.height) * h).round() as i64;
    (
        left.clamp(0, frame.width as i64),
        top.clamp(0, frame.height as i64),
        right.clamp(0, frame.width as i64),
        bottom.clamp(0, frame.height as i64),
    )
}

/// Draw a display-space selection onto `frame`.
fn draw_selection(frame: &mut DecodedImage, rect: &CropRect, style: &OverlayStyle) {
    let (left, top, right, bottom) = pixel_bounds(frame, rect);

    dim_outside(frame, (left, top, right, bottom), style.dim_alpha);

    let stroke = style.stroke_width as i64;
    if stroke > 0 {
        let half = stroke / 2;
        let (x0, x1) = (left - half, right - half + stroke);
        let (y0, y1) = (top - half, bottom - half + stroke);
        fill_rect(frame, x0, y0, x1, y0 + stroke, style.stroke_color);
        fill_rect(frame, x0, y1 - stroke, x1, y1, style.stroke_color);
        fill_rect(frame, x0, y0, x0 + stroke, y1, style.stroke_color);
        fill_rect(frame, x1 - stroke, y0, x1, y1, style.stroke_color);
    }

    let marker = style.marker_size as i64;
    if marker > 0 {
        let half = marker / 2;
        for (cx, cy) in [(left, top), (right, top), (left, bottom), (right, bottom)] {
            fill_rect(
                frame,
                cx - half,
                cy - half,
                cx - half + marker,
                cy - half + marker,
                style.stroke_color,
            );
        }
    }
}

/// Darken every pixel outside `[left, right) x [top, bottom)`.
fn dim_outside(frame: &mut DecodedImage, bounds: (i64, i64, i64, i64), alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let (left, top, right, bottom) = bounds;
    let keep = 1.0 - alpha.clamp(0.0, 1.0);
    let width = frame.width as i64;

    for (i, px) in frame.pixels.chunks_exact_mut(3).enumerate() {
        let x = i as i64 % width;
        let y = i as i64 / width;
        if x >= left && x < right && y >= top && y < bottom {
            continue;
        }
        for c in px.iter_mut() {
            *c = (*c as f32 * keep).round() as u8;
        }
    }
}

/// Fill `[x0, x1) x [y0, y1)`, clipped to the frame.
fn fill_rect(frame: &mut DecodedImage, x0: i64, y0: i64, x1: i64, y1: i64, rgb: [u8; 3]) {
    let x0 = x0.clamp(0, frame.width as i64) as usize;
    let x1 = x1.clamp(0, frame.width as i64) as usize;
    let y0 = y0.clamp(0, frame.height as i64) as usize;
    let y1 = y1.clamp(0, frame.height as i64) as usize;
    let width = frame.width as usize;

    for y in y0..y1 {
        for x in x0..x1 {
            let idx = (y * width + x) * 3;
            frame.pixels[idx..idx + 3].copy_from_slice(&rgb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::FilterType;

    fn gray(width: u32, height: u32) -> DecodedImage {
        DecodedImage::filled(width, height, [200, 200, 200])
    }

    fn snapshot(rotation: Rotation, crop: CropRect, selection: Option<CropRect>) -> RenderSnapshot {
        RenderSnapshot {
            rotation,
            crop,
            selection,
        }
    }

    #[test]
    fn test_mode_selection() {
        let crop = CropRect::clamped(0.1, 0.1, 0.5, 0.5);
        assert_eq!(
            render_mode(&snapshot(Rotation::Deg0, CropRect::FULL, None)),
            RenderMode::Overlay
        );
        assert_eq!(
            render_mode(&snapshot(Rotation::Deg0, crop, None)),
            RenderMode::Preview
        );
        assert_eq!(
            render_mode(&snapshot(Rotation::Deg0, crop, Some(crop))),
            RenderMode::Overlay
        );
    }

    #[test]
    fn test_display_dimensions_follow_parity() {
        assert_eq!(display_dimensions(800.0, 600.0, Rotation::Deg0, 600), (600, 450));
        assert_eq!(display_dimensions(800.0, 600.0, Rotation::Deg180, 600), (600, 450));
        assert_eq!(display_dimensions(800.0, 600.0, Rotation::Deg90, 600), (450, 600));
        assert_eq!(display_dimensions(800.0, 600.0, Rotation::Deg270, 600), (450, 600));
    }

    #[test]
    fn test_overlay_without_selection_is_plain_image() {
        let config = EditorConfig::default();
        let target = render(&gray(800, 600), &RenderSnapshot::default(), &config).unwrap();
        assert_eq!(target.mode, RenderMode::Overlay);
        assert_eq!((target.width(), target.height()), (600, 450));
        assert!(target.image.pixels.iter().all(|&c| c == 200));
    }

    #[test]
    fn test_overlay_rotated_swaps_dimensions() {
        let config = EditorConfig::default();
        let target = render(
            &gray(800, 600),
            &snapshot(Rotation::Deg90, CropRect::FULL, None),
            &config,
        )
        .unwrap();
        assert_eq!((target.width(), target.height()), (450, 600));
    }

    #[test]
    fn test_overlay_dims_outside_and_strokes_border() {
        let config = EditorConfig::default();
        let selection = CropRect::clamped(0.25, 0.25, 0.5, 0.5);
        let target = render(
            &gray(600, 600),
            &snapshot(Rotation::Deg0, CropRect::FULL, Some(selection)),
            &config,
        )
        .unwrap();

        assert_eq!(target.mode, RenderMode::Overlay);
        // Far corner is outside: dimmed by half.
        assert_eq!(target.image.pixel(20, 20), [100, 100, 100]);
        // Center is inside: untouched.
        assert_eq!(target.image.pixel(300, 300), [200, 200, 200]);
        // Border at x = 150 is stroked white.
        assert_eq!(target.image.pixel(150, 300), [255, 255, 255]);
        // Corner marker at (150, 150).
        assert_eq!(target.image.pixel(152, 152), [255, 255, 255]);
    }

    #[test]
    fn test_overlay_selection_follows_rotation() {
        // Selection over the left half of the source. After a clockwise
        // quarter turn that half is at the top of the display.
        let mut style = OverlayStyle::default();
        style.stroke_width = 0;
        style.marker_size = 0;
        let config = EditorConfig {
            overlay: style,
            ..EditorConfig::default()
        };
        let selection = CropRect::clamped(0.0, 0.0, 0.5, 1.0);
        let target = render(
            &gray(400, 400),
            &snapshot(Rotation::Deg90, CropRect::FULL, Some(selection)),
            &config,
        )
        .unwrap();

        assert_eq!(target.image.pixel(300, 100), [200, 200, 200]);
        assert_eq!(target.image.pixel(300, 500), [100, 100, 100]);
    }

    #[test]
    fn test_preview_shows_only_crop() {
        // Left half red, right half blue.
        let mut img = DecodedImage::filled(800, 600, [0, 0, 255]);
        for y in 0..600 {
            for x in 0..400 {
                let idx = ((y * 800 + x) * 3) as usize;
                img.pixels[idx..idx + 3].copy_from_slice(&[255, 0, 0]);
            }
        }
        let config = EditorConfig::default();
        let crop = CropRect::clamped(0.0, 0.0, 0.5, 1.0);
        let target = render(&img, &snapshot(Rotation::Deg0, crop, None), &config).unwrap();

        assert_eq!(target.mode, RenderMode::Preview);
        assert_eq!((target.width(), target.height()), (400, 600));
        assert!(target
            .image
            .pixels
            .chunks_exact(3)
            .all(|px| px == [255, 0, 0]));
    }

    #[test]
    fn test_preview_rotated_crop_dimensions() {
        let config = EditorConfig::default();
        let crop = CropRect::clamped(0.25, 0.0, 0.5, 1.0);
        let target = render(&gray(800, 600), &snapshot(Rotation::Deg90, crop, None), &config)
            .unwrap();
        // 400x600 region rotated to 600x400, scaled to fit 600.
        assert_eq!((target.width(), target.height()), (600, 400));
    }

    #[test]
    fn test_resample_filter_comes_from_config() {
        let mut img = DecodedImage::filled(2, 1, [255, 0, 0]);
        img.pixels[3..6].copy_from_slice(&[0, 0, 255]);
        let nearest = EditorConfig {
            max_display_edge: 16,
            resample_filter: FilterType::Nearest,
            ..EditorConfig::default()
        };
        let bilinear = EditorConfig {
            resample_filter: FilterType::Bilinear,
            ..nearest.clone()
        };

        let sharp = render(&img, &RenderSnapshot::default(), &nearest).unwrap();
        assert_eq!((sharp.width(), sharp.height()), (16, 8));
        assert_eq!(sharp.image.pixel(7, 4), [255, 0, 0]);
        assert_eq!(sharp.image.pixel(8, 4), [0, 0, 255]);
        assert!(sharp
            .image
            .pixels
            .chunks_exact(3)
            .all(|px| px == [255, 0, 0] || px == [0, 0, 255]));

        let smooth = render(&img, &RenderSnapshot::default(), &bilinear).unwrap();
        assert_ne!(smooth.image.pixel(7, 4), [255, 0, 0]);
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = EditorConfig::default();
        let snap = snapshot(
            Rotation::Deg270,
            CropRect::FULL,
            Some(CropRect::clamped(0.1, 0.2, 0.3, 0.4)),
        );
        let img = gray(120, 80);
        assert_eq!(
            render(&img, &snap, &config).unwrap(),
            render(&img, &snap, &config).unwrap()
        );
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = gray(4, 4);
        fill_rect(&mut frame, -5, -5, 2, 1, [1, 2, 3]);
        assert_eq!(frame.pixel(0, 0), [1, 2, 3]);
        assert_eq!(frame.pixel(1, 0), [1, 2, 3]);
        assert_eq!(frame.pixel(2, 0), [200, 200, 200]);
        assert_eq!(frame.pixel(0, 1), [200, 200, 200]);
    }
}
