//! WASM-compatible wrapper types for rendered frames.

use cropkit_core::decode::DecodedImage;
use cropkit_core::render::{RenderMode, RenderTarget};
use wasm_bindgen::prelude::*;

/// A rendered editor frame, ready to be put on a canvas.
///
/// # Memory Management
///
/// The pixels live in WASM memory. `pixels()` copies them out as RGBA bytes
/// in the layout `ImageData` expects.
#[wasm_bindgen]
pub struct JsRenderTarget {
    preview: bool,
    image: DecodedImage,
}

#[wasm_bindgen]
impl JsRenderTarget {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.image.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// `"overlay"` or `"preview"`.
    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        let mode = if self.preview { "preview" } else { "overlay" };
        mode.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Returns RGBA pixel data (4 bytes per pixel, opaque alpha).
    pub fn pixels(&self) -> Vec<u8> {
        self.image.to_rgba()
    }
}

impl From<RenderTarget> for JsRenderTarget {
    fn from(target: RenderTarget) -> Self {
        Self {
            preview: target.mode == RenderMode::Preview,
            image: target.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_render_target() {
        let target = RenderTarget {
            mode: RenderMode::Overlay,
            image: DecodedImage::filled(4, 2, [10, 20, 30]),
        };
        let js = JsRenderTarget::from(target);

        assert_eq!(js.width(), 4);
        assert_eq!(js.height(), 2);
        assert_eq!(js.mode(), "overlay");
        assert!(!js.is_preview());
    }

    #[test]
    fn test_pixels_are_rgba() {
        let target = RenderTarget {
            mode: RenderMode::Preview,
            image: DecodedImage::filled(2, 1, [1, 2, 3]),
        };
        let js = JsRenderTarget::from(target);

        assert_eq!(js.mode(), "preview");
        assert_eq!(js.pixels(), vec![1, 2, 3, 255, 1, 2, 3, 255]);
    }
}
