//! # Steward
//!
//! Steward resolves configuration keys to secret payloads. A key is either a
//! literal value, returned as-is, or a URL whose scheme selects the backend that
//! knows how to fetch it:
//!
//! ```text
//! "plain-value"                       → b"plain-value"
//! "file:///run/secrets/db-password"   → contents of the file
//! "https://vault.internal/v1/token"   → HTTP response body
//! "asm://us-east-1/prod/db"           → AWS Secrets Manager value
//! "gsm://my-project/api-key"          → GCP Secret Manager latest version
//! ```
//!
//! ## Core Components
//!
//! - **Registry**: binds URL schemes to backends and dispatches keys
//! - **Backends**: file, direct, env, HTTP(S), and feature-gated cloud providers
//! - **Configuration**: layered defaults, file, and environment settings
//! - **Observability**: `tracing` spans handed to each component
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use steward::{AppConfig, Result, SecretBackendRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let registry = SecretBackendRegistry::from_config(&config.backends).await?;
//!     let token = registry.fetch("env://API_TOKEN").await?;
//!     println!("{} bytes", token.len());
//!     Ok(())
//! }
//! ```

pub mod backends;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;

// Re-export commonly used types and traits
pub use backends::{FetchOptions, SecretBackend, SecretBackendRegistry};
pub use config::AppConfig;
pub use errors::{Error, ErrorKind, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "steward");
    }
}
