//! # Formats
//!
//! Byte-level encodings of a model. File I/O lives in the application.

mod persistence;

pub use persistence::*;
