//! Output encoding.
//!
//! The composed photo is handed to the caller as JPEG bytes. Encoding is
//! synchronous and runs inside the save step.

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, EncodeError};
