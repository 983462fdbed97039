//! Editor session lifecycle.
//!
//! An [`EditorSession`] owns the transform state, the drag controller and the
//! loaded bitmap for one photo at a time. Loads are asynchronous and may
//! finish after the session was closed or reopened on another photo; each
//! `open` hands out a [`LoadTicket`] and only the ticket of the current,
//! still-open session is honored.

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::compose::{compose, ComposeError, EncodedImage};
use crate::config::EditorConfig;
use crate::drag::{DragController, PointerInput, ReleaseOutcome, Viewport};
use crate::loader::{load_image, FetchError, ImageFetcher, LoadOutcome, SourceBitmap};
use crate::render::{render, RenderSnapshot, RenderTarget};
use crate::transform::TransformState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// No bitmap yet: the session is closed or still loading.
    #[error("no image is loaded")]
    NotReady,

    /// Both load attempts failed; the editor cannot be used for this photo.
    #[error("image could not be loaded: {0}")]
    LoadFailure(String),

    #[error("this image cannot be saved: pixel extraction is not allowed")]
    ExtractionForbidden,

    /// Composing or encoding failed. The session stays open and saving can
    /// be retried.
    #[error("saving failed: {0}")]
    CompositionFailure(String),
}

impl From<ComposeError> for EditorError {
    fn from(e: ComposeError) -> Self {
        match e {
            ComposeError::ExtractionForbidden => EditorError::ExtractionForbidden,
            ComposeError::CompositionFailed(reason) => EditorError::CompositionFailure(reason),
        }
    }
}

/// Identifies the load started by one call to [`EditorSession::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    url: String,
}

impl LoadTicket {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Coarse session state, as a host UI would show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SessionStatus {
    Closed,
    Loading,
    #[serde(rename_all = "camelCase")]
    Ready {
        extraction_allowed: bool,
    },
    /// The load failed on both attempts.
    Unavailable,
}

#[derive(Debug, Clone)]
enum Phase {
    Closed,
    Loading,
    Ready(SourceBitmap),
    Unavailable(FetchError),
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    config: EditorConfig,
    transform: TransformState,
    drag: DragController,
    phase: Phase,
    generation: u64,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let config = config.validated();
        Self {
            drag: DragController::new(config.min_crop_span),
            config,
            transform: TransformState::default(),
            phase: Phase::Closed,
            generation: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Committed rotation and crop.
    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.phase, Phase::Closed)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn bitmap(&self) -> Option<&SourceBitmap> {
        match &self.phase {
            Phase::Ready(bitmap) => Some(bitmap),
            _ => None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match &self.phase {
            Phase::Closed => SessionStatus::Closed,
            Phase::Loading => SessionStatus::Loading,
            Phase::Ready(bitmap) => SessionStatus::Ready {
                extraction_allowed: bitmap.extraction_allowed,
            },
            Phase::Unavailable(_) => SessionStatus::Unavailable,
        }
    }

    /// Start editing `url` from a fresh state.
    ///
    /// Any earlier load still in flight becomes stale.
    pub fn open(&mut self, url: &str) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.transform.reset();
        self.drag.cancel();
        self.phase = Phase::Loading;
        info!("opening {} (load {})", url, self.generation);

        LoadTicket {
            generation: self.generation,
            url: url.to_string(),
        }
    }

    /// Apply the result of the load identified by `ticket`.
    ///
    /// Returns `false` and drops the result if the session was closed or
    /// reopened since the ticket was issued.
    pub fn complete_load(&mut self, ticket: &LoadTicket, outcome: LoadOutcome) -> bool {
        if !matches!(self.phase, Phase::Loading) || ticket.generation != self.generation {
            debug!(
                "dropping stale load {} for {} (current {})",
                ticket.generation, ticket.url, self.generation
            );
            return false;
        }

        match outcome {
            LoadOutcome::Loaded(bitmap) => {
                info!(
                    "{} ready ({}x{}, extraction {})",
                    ticket.url,
                    bitmap.width(),
                    bitmap.height(),
                    if bitmap.extraction_allowed { "allowed" } else { "forbidden" }
                );
                self.phase = Phase::Ready(bitmap);
            }
            LoadOutcome::Failed { last_error } => {
                info!("{} unavailable: {}", ticket.url, last_error);
                self.phase = Phase::Unavailable(last_error);
            }
        }
        true
    }

    /// Open `url` and load it through `fetcher`.
    pub async fn load<F: ImageFetcher + ?Sized>(&mut self, fetcher: &F, url: &str) -> bool {
        let ticket = self.open(url);
        let outcome = load_image(fetcher, url).await;
        self.complete_load(&ticket, outcome)
    }

    /// Tear the session down. Pending loads become stale.
    pub fn close(&mut self) {
        if matches!(self.phase, Phase::Closed) {
            return;
        }
        info!("closing session (load {})", self.generation);
        self.generation = self.generation.wrapping_add(1);
        self.drag.cancel();
        self.transform.reset();
        self.phase = Phase::Closed;
    }

    pub fn rotate_left(&mut self) -> bool {
        if self.bitmap().is_none() {
            return false;
        }
        self.transform.rotate_left();
        true
    }

    pub fn rotate_right(&mut self) -> bool {
        if self.bitmap().is_none() {
            return false;
        }
        self.transform.rotate_right();
        true
    }

    /// Drop the crop back to the full frame. Returns `false` if there was
    /// nothing to reset.
    pub fn reset_crop(&mut self) -> bool {
        if self.bitmap().is_none() || self.transform.crop.is_full_frame() {
            return false;
        }
        self.transform.reset_crop();
        true
    }

    pub fn pointer_press(&mut self, input: PointerInput, viewport: &Viewport) -> bool {
        if self.bitmap().is_none() {
            return false;
        }
        match viewport.normalize(input, self.transform.rotation) {
            Some(point) => {
                self.drag.press(point);
                true
            }
            None => false,
        }
    }

    pub fn pointer_move(&mut self, input: PointerInput, viewport: &Viewport) -> bool {
        if self.bitmap().is_none() {
            return false;
        }
        viewport
            .normalize(input, self.transform.rotation)
            .is_some_and(|point| self.drag.move_to(point))
    }

    /// Finish the gesture. The release position is taken from the last move.
    pub fn pointer_release(&mut self) -> bool {
        match self.drag.release(&mut self.transform) {
            ReleaseOutcome::Committed(_) | ReleaseOutcome::Discarded => true,
            ReleaseOutcome::Ignored => false,
        }
    }

    /// Render the current view, or `None` when no bitmap is loaded.
    pub fn render(&self) -> Option<RenderTarget> {
        let bitmap = self.bitmap()?;
        let snapshot = RenderSnapshot::new(&self.transform, self.drag.selection());
        match render(&bitmap.image, &snapshot, &self.config) {
            Ok(target) => Some(target),
            Err(e) => {
                warn!("render failed: {}", e);
                None
            }
        }
    }

    /// Whether `save` can succeed, barring an encoder failure.
    pub fn can_save(&self) -> bool {
        self.bitmap().is_some_and(|b| b.extraction_allowed)
    }

    /// Compose the committed edit and hand it to `on_save`.
    ///
    /// An in-progress drag is ignored; the last committed crop is used.
    pub fn save<F: FnOnce(EncodedImage)>(&self, on_save: F) -> Result<(), EditorError> {
        let bitmap = match &self.phase {
            Phase::Ready(bitmap) => bitmap,
            Phase::Unavailable(e) => return Err(EditorError::LoadFailure(e.to_string())),
            Phase::Closed | Phase::Loading => return Err(EditorError::NotReady),
        };

        let encoded = compose(bitmap, &self.transform, self.config.jpeg_quality).map_err(|e| {
            warn!("save refused: {}", e);
            EditorError::from(e)
        })?;

        info!(
            "saved {}x{} output ({} bytes)",
            encoded.width,
            encoded.height,
            encoded.bytes.len()
        );
        on_save(encoded);
        Ok(())
    }

    /// Close without producing output.
    pub fn cancel<F: FnOnce()>(&mut self, on_close: F) {
        self.close();
        on_close();
    }
}
