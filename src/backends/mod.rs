//! # Secret Backends
//!
//! Pluggable backends that resolve a URL to a secret payload, and the registry
//! that routes keys to them by URL scheme.
//!
//! ## Supported Backends
//!
//! | Scheme | Backend | Feature |
//! |---|---|---|
//! | `file` | [`FileSecretBackend`] | always |
//! | `direct` | [`DirectSecretBackend`] | always |
//! | `env` | [`EnvSecretBackend`] | always |
//! | `http`, `https` | [`HttpSecretBackend`] | always |
//! | `asm` | `AwsSecretBackend` | `aws` |
//! | `gsm` | `GcpSecretBackend` | `gcp` |
//!
//! ## Example
//!
//! ```rust,no_run
//! use steward::backends::SecretBackendRegistry;
//! use steward::config::BackendsConfig;
//!
//! # async fn example() -> steward::Result<()> {
//! let registry = SecretBackendRegistry::from_config(&BackendsConfig::default()).await?;
//! let password = registry.fetch("file:///run/secrets/db-password").await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod direct;
pub mod env;
pub mod file;
pub mod http;
pub mod registry;

#[cfg(feature = "aws")]
pub mod aws;

#[cfg(feature = "gcp")]
pub mod gcp;

pub use backend::{FetchOptions, SecretBackend};
pub use direct::DirectSecretBackend;
pub use env::EnvSecretBackend;
pub use file::FileSecretBackend;
pub use http::HttpSecretBackend;
pub use registry::SecretBackendRegistry;

#[cfg(feature = "aws")]
pub use aws::AwsSecretBackend;

#[cfg(feature = "gcp")]
pub use gcp::GcpSecretBackend;
