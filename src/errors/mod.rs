//! # Error Handling
//!
//! Error types for key resolution, defined with `thiserror`.

pub mod types;

pub use types::{Error, ErrorKind, Result};
