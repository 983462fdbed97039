//! Editor WASM bindings.
//!
//! The host owns networking: it asks a [`JsLoadTicket`] for the request init
//! of the next attempt, performs the `fetch`, and reports the bytes or the
//! failure back. Once the ticket is settled the host passes it to
//! [`JsCropEditor::finish_load`].
//!
//! Both attempts are readable CORS requests. The fallback adds credentials,
//! and whatever it returns is display-only. A `no-cors` response has an empty
//! body and is reported as a refusal. Hosts that decode images themselves
//! can hand over RGBA pixels with [`JsLoadTicket::succeed_pixels`] instead.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const editor = new JsCropEditor({ max_display_edge: 600 });
//! const ticket = editor.open(url);
//! while (ticket.next_attempt()) {
//!   try {
//!     const res = await fetch(url, ticket.next_request());
//!     if (!res.ok) throw new Error(`${res.status} ${res.statusText}`);
//!     ticket.succeed(new Uint8Array(await res.arrayBuffer()));
//!   } catch (e) {
//!     ticket.fail(String(e));
//!   }
//! }
//! editor.finish_load(ticket);
//! ```

use cropkit_core::config::EditorConfig;
use cropkit_core::decode::DecodedImage;
use cropkit_core::drag::{PointerInput, Viewport};
use cropkit_core::loader::{CredentialMode, FetchError, LoadSequence};
use cropkit_core::session::{EditorError, EditorSession, LoadTicket};
use js_sys::{Function, Uint8Array};
use log::debug;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::types::JsRenderTarget;

/// The `RequestInit` fields `fetch` needs for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct FetchInit {
    mode: &'static str,
    credentials: &'static str,
}

/// The request init for a credential mode.
pub(crate) fn fetch_init(mode: CredentialMode) -> FetchInit {
    match mode {
        CredentialMode::Anonymous => FetchInit {
            mode: "cors",
            credentials: "same-origin",
        },
        CredentialMode::Opaque => FetchInit {
            mode: "cors",
            credentials: "include",
        },
    }
}

/// Error text tagged with its kind, e.g. `"ExtractionForbidden: ..."`.
pub(crate) fn error_message(e: &EditorError) -> String {
    let kind = match e {
        EditorError::NotReady => "NotReady",
        EditorError::LoadFailure(_) => "LoadFailure",
        EditorError::ExtractionForbidden => "ExtractionForbidden",
        EditorError::CompositionFailure(_) => "CompositionFailure",
    };
    format!("{}: {}", kind, e)
}

fn to_js_error(e: EditorError) -> JsValue {
    JsValue::from_str(&error_message(&e))
}

/// One load in progress, driven by the host.
#[wasm_bindgen]
pub struct JsLoadTicket {
    ticket: LoadTicket,
    sequence: LoadSequence,
}

#[wasm_bindgen]
impl JsLoadTicket {
    #[wasm_bindgen(getter)]
    pub fn url(&self) -> String {
        self.ticket.url().to_string()
    }

    /// `"anonymous"` or `"opaque"` for the next attempt, or `undefined`
    /// once settled.
    pub fn next_attempt(&self) -> Option<String> {
        self.sequence.next_attempt().map(|mode| mode.to_string())
    }

    /// The `fetch` init for the next attempt, or `undefined` once settled.
    pub fn next_request(&self) -> Result<JsValue, JsValue> {
        match self.sequence.next_attempt() {
            Some(mode) => serde_wasm_bindgen::to_value(&fetch_init(mode))
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Report the bytes fetched for the current attempt.
    pub fn succeed(&mut self, bytes: &[u8]) {
        self.sequence.record_success(bytes);
    }

    /// Report pixels the host decoded itself for the current attempt, e.g.
    /// from `ImageData`. `rgba` holds 4 bytes per pixel; alpha is dropped.
    pub fn succeed_pixels(&mut self, width: u32, height: u32, rgba: &[u8]) {
        match DecodedImage::from_rgba(width, height, rgba) {
            Some(image) => self.sequence.record_image(image),
            None => self.sequence.record_failure(FetchError::Decode(format!(
                "expected {} RGBA bytes for {}x{}, got {}",
                width as usize * height as usize * 4,
                width,
                height,
                rgba.len()
            ))),
        }
    }

    /// Report that the current attempt failed.
    pub fn fail(&mut self, reason: String) {
        self.sequence.record_failure(FetchError::Refused(reason));
    }

    #[wasm_bindgen(getter)]
    pub fn is_settled(&self) -> bool {
        self.sequence.is_settled()
    }
}

/// The rotate/crop editor for JavaScript.
#[wasm_bindgen]
pub struct JsCropEditor {
    session: EditorSession,
}

#[wasm_bindgen]
impl JsCropEditor {
    /// Create an editor. `config` may be `undefined` or a partial object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsCropEditor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        Ok(Self::with_config(config))
    }

    /// Start editing `url`. Any earlier load becomes stale.
    pub fn open(&mut self, url: &str) -> JsLoadTicket {
        JsLoadTicket {
            ticket: self.session.open(url),
            sequence: LoadSequence::new(),
        }
    }

    /// Apply a settled ticket. Returns `false` if the ticket is stale or
    /// not yet settled.
    pub fn finish_load(&mut self, ticket: &JsLoadTicket) -> bool {
        match ticket.sequence.outcome() {
            Some(outcome) => self.session.complete_load(&ticket.ticket, outcome.clone()),
            None => {
                debug!("finish_load called before {} settled", ticket.ticket.url());
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.session.close();
    }

    pub fn rotate_left(&mut self) -> bool {
        self.session.rotate_left()
    }

    pub fn rotate_right(&mut self) -> bool {
        self.session.rotate_right()
    }

    pub fn reset_crop(&mut self) -> bool {
        self.session.reset_crop()
    }

    /// Start a selection. Coordinates are relative to the canvas element;
    /// the canvas backing size and laid-out size are passed alongside.
    pub fn pointer_down(
        &mut self,
        x: f64,
        y: f64,
        pixel_width: f64,
        pixel_height: f64,
        css_width: f64,
        css_height: f64,
    ) -> bool {
        let viewport = Viewport {
            pixel_width,
            pixel_height,
            css_width,
            css_height,
        };
        self.session.pointer_press(PointerInput::new(x, y), &viewport)
    }

    pub fn pointer_move(
        &mut self,
        x: f64,
        y: f64,
        pixel_width: f64,
        pixel_height: f64,
        css_width: f64,
        css_height: f64,
    ) -> bool {
        let viewport = Viewport {
            pixel_width,
            pixel_height,
            css_width,
            css_height,
        };
        self.session.pointer_move(PointerInput::new(x, y), &viewport)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.session.pointer_release()
    }

    /// Render the current view, or `undefined` while nothing is loaded.
    pub fn render(&self) -> Option<JsRenderTarget> {
        self.session.render().map(JsRenderTarget::from)
    }

    /// Compose the edit and call `on_save(bytes, width, height)` with JPEG
    /// bytes. Throws a tagged error string if saving is not possible.
    pub fn save(&self, on_save: &Function) -> Result<(), JsValue> {
        let mut delivered = Ok(JsValue::UNDEFINED);
        self.session
            .save(|image| {
                let bytes = Uint8Array::from(image.bytes.as_slice());
                delivered = on_save.call3(
                    &JsValue::NULL,
                    &bytes.into(),
                    &JsValue::from(image.width),
                    &JsValue::from(image.height),
                );
            })
            .map_err(to_js_error)?;
        delivered.map(|_| ())
    }

    /// Close the editor and call `on_close()`.
    pub fn cancel(&mut self, on_close: &Function) -> Result<(), JsValue> {
        let mut delivered = Ok(JsValue::UNDEFINED);
        self.session.cancel(|| delivered = on_close.call0(&JsValue::NULL));
        delivered.map(|_| ())
    }

    /// `{ status: "closed" | "loading" | "ready" | "unavailable", extractionAllowed? }`
    pub fn status(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.status())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Whether the save button should be enabled.
    pub fn can_save(&self) -> bool {
        self.session.can_save()
    }

    #[wasm_bindgen(getter)]
    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging()
    }

    /// Committed rotation and crop, for persisting or display.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.session.transform())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl JsCropEditor {
    pub(crate) fn with_config(config: EditorConfig) -> Self {
        Self {
            session: EditorSession::new(config),
        }
    }
}
