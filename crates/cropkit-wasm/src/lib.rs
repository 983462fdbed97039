//! Cropkit WASM - WebAssembly bindings for Cropkit
//!
//! This crate exposes the cropkit-core editor session to JavaScript/TypeScript
//! hosts.
//!
//! # Module Structure
//!
//! - `editor` - The editor session and the host-driven load ticket
//! - `types` - WASM-compatible wrapper for rendered frames
//! - `logger` - `log` backend over the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropEditor } from '@cropkit/wasm';
//!
//! await init();
//!
//! const editor = new JsCropEditor();
//! // ... load through a ticket, then:
//! const frame = editor.render();
//! ctx.putImageData(new ImageData(new Uint8ClampedArray(frame.pixels()), frame.width), 0, 0);
//! ```

use wasm_bindgen::prelude::*;

mod editor;
mod logger;
mod types;

pub use editor::{JsCropEditor, JsLoadTicket};
pub use logger::ConsoleLogger;
pub use types::JsRenderTarget;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    ConsoleLogger::install();
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
