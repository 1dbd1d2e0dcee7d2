//! # Observability Infrastructure
//!
//! Structured logging for steward, built on `tracing` and `tracing-subscriber`.

pub mod logging;

pub use logging::{component_span, init_logging};
