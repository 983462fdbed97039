//! Source image loading with a permission fallback.
//!
//! A photo is first requested in `Anonymous` mode, which lets its pixels be
//! read back for composition. If that attempt fails the photo is requested
//! again in `Opaque` mode: it can still be displayed and edited, but saving
//! is refused. The two attempts run one after the other, never concurrently.

use std::fmt;
use std::path::PathBuf;

use futures::future::{self, FutureExt, LocalBoxFuture};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{decode_image, DecodedImage};

/// How the source is requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialMode {
    /// Cross-origin request that permits pixel extraction.
    Anonymous,
    /// Plain request; the result is display-only.
    Opaque,
}

impl CredentialMode {
    /// Whether bitmaps loaded in this mode may be read back.
    pub fn allows_extraction(self) -> bool {
        matches!(self, CredentialMode::Anonymous)
    }
}

impl fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialMode::Anonymous => write!(f, "anonymous"),
            CredentialMode::Opaque => write!(f, "opaque"),
        }
    }
}

/// Why a single load attempt failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The host refused the request in this mode (e.g. missing CORS headers).
    #[error("request refused: {0}")]
    Refused(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// The bytes arrived but are not a usable image.
    #[error("undecodable image: {0}")]
    Decode(String),
}

/// A decoded source together with what the host allows us to do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBitmap {
    pub image: DecodedImage,
    /// False when the bitmap came from the `Opaque` fallback.
    pub extraction_allowed: bool,
}

impl SourceBitmap {
    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }
}

/// Final result of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(SourceBitmap),
    Failed { last_error: FetchError },
}

/// Something that can retrieve source bytes in a given mode.
pub trait ImageFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        mode: CredentialMode,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

const ATTEMPTS: [CredentialMode; 2] = [CredentialMode::Anonymous, CredentialMode::Opaque];

/// The two-attempt load sequence, driven one step at a time.
///
/// Usage: ask `next_attempt` for a mode, fetch, then report the result with
/// `record_success` (encoded bytes), `record_image` (pixels the host decoded
/// itself) or `record_failure`. Repeat until `outcome` is set.
#[derive(Debug, Clone, Default)]
pub struct LoadSequence {
    attempt: usize,
    outcome: Option<LoadOutcome>,
}

impl LoadSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mode to fetch with next, or `None` once the sequence is settled.
    pub fn next_attempt(&self) -> Option<CredentialMode> {
        if self.outcome.is_some() {
            return None;
        }
        ATTEMPTS.get(self.attempt).copied()
    }

    /// Report fetched bytes for the current attempt.
    ///
    /// Bytes that do not decode count as a failed attempt. An empty body is
    /// what a browser hands back for an unreadable response, so it is
    /// reported as a refusal rather than a decode error.
    pub fn record_success(&mut self, bytes: &[u8]) {
        if self.next_attempt().is_none() {
            debug!("ignoring bytes for a settled load");
            return;
        }
        if bytes.is_empty() {
            return self.record_failure(FetchError::Refused("empty response body".to_string()));
        }

        match decode_image(bytes) {
            Ok(image) => self.record_image(image),
            Err(e) => self.record_failure(FetchError::Decode(e.to_string())),
        }
    }

    /// Report an image the host already decoded for the current attempt.
    ///
    /// An empty image or a pixel buffer that does not match its dimensions
    /// counts as a failed attempt.
    pub fn record_image(&mut self, image: DecodedImage) {
        let Some(mode) = self.next_attempt() else {
            debug!("ignoring image for a settled load");
            return;
        };

        let expected = image.width as usize * image.height as usize * 3;
        if image.is_empty() || image.pixels.len() != expected {
            return self.record_failure(FetchError::Decode(format!(
                "{}x{} image with {} bytes of pixels",
                image.width,
                image.height,
                image.pixels.len()
            )));
        }

        info!(
            "loaded {}x{} source in {} mode",
            image.width, image.height, mode
        );
        self.outcome = Some(LoadOutcome::Loaded(SourceBitmap {
            image,
            extraction_allowed: mode.allows_extraction(),
        }));
    }

    /// Report a failure of the current attempt.
    pub fn record_failure(&mut self, error: FetchError) {
        let Some(mode) = self.next_attempt() else {
            debug!("ignoring failure for a settled load");
            return;
        };

        warn!("{} load attempt failed: {}", mode, error);
        self.attempt += 1;
        if self.attempt >= ATTEMPTS.len() {
            self.outcome = Some(LoadOutcome::Failed { last_error: error });
        }
    }

    pub fn outcome(&self) -> Option<&LoadOutcome> {
        self.outcome.as_ref()
    }

    pub fn into_outcome(self) -> Option<LoadOutcome> {
        self.outcome
    }

    pub fn is_settled(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Load `url` through `fetcher`, falling back to `Opaque` on failure.
pub async fn load_image<F: ImageFetcher + ?Sized>(fetcher: &F, url: &str) -> LoadOutcome {
    let mut sequence = LoadSequence::new();
    while let Some(mode) = sequence.next_attempt() {
        debug!("fetching {} in {} mode", url, mode);
        match fetcher.fetch(url, mode).await {
            Ok(bytes) => sequence.record_success(&bytes),
            Err(e) => sequence.record_failure(e),
        }
    }

    sequence.into_outcome().unwrap_or(LoadOutcome::Failed {
        last_error: FetchError::Io("load sequence ended without an outcome".to_string()),
    })
}

/// Reads sources from the local filesystem.
///
/// Accepts plain paths and `file://` URLs. Local files carry no origin
/// restrictions, so both modes read the file the same way.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl ImageFetcher for FileFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        _mode: CredentialMode,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, FetchError>> {
        let path = self.resolve(url);
        let result = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Io(format!("{}: {}", path.display(), e)),
        });
        future::ready(result).boxed_local()
    }
}
