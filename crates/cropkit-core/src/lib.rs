//! Cropkit Core - rotate and crop engine
//!
//! This crate provides the platform-independent part of the Cropkit photo
//! editor: loading a source with a permission fallback, quarter-turn rotation
//! and normalized cropping, pointer-driven selection, dual-mode rendering and
//! full-resolution JPEG composition.

pub mod compose;
pub mod config;
pub mod decode;
pub mod drag;
pub mod encode;
pub mod loader;
pub mod render;
pub mod session;
pub mod transform;

pub use compose::{compose, ComposeError, EncodedImage};
pub use config::{EditorConfig, OverlayStyle};
pub use decode::{decode_image, DecodeError, DecodedImage};
pub use drag::{DragController, DragState, PointerInput, ReleaseOutcome, Viewport};
pub use loader::{
    load_image, CredentialMode, FetchError, FileFetcher, ImageFetcher, LoadOutcome, LoadSequence,
    SourceBitmap,
};
pub use render::{render, RenderMode, RenderSnapshot, RenderTarget};
pub use session::{EditorError, EditorSession, LoadTicket, SessionStatus};
pub use transform::{CropRect, NormalizedPoint, Rotation, TransformState};
