//! # Error Types
//!
//! Error taxonomy shared by the registry and every backend, built on `thiserror`.
//!
//! Three variants are sentinels: [`Error::NotFound`], [`Error::UrlInvalid`] and
//! [`Error::SchemeUnknown`]. Backends return them unwrapped and the registry passes
//! them through unchanged, so callers can branch on them no matter which backend
//! answered. Everything a backend cannot express as a sentinel becomes
//! [`Error::Backend`].

use std::fmt;

/// Result type for steward operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for key resolution
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The key is empty or the backend reports that the target does not exist
    #[error("key not known")]
    NotFound,

    /// The key looked like a URL but could not be parsed, or had no scheme
    #[error("supplied URL is invalid")]
    UrlInvalid,

    /// No backend is registered for the URL's scheme
    #[error("no backend registered to handle that scheme")]
    SchemeUnknown,

    /// A registration tried to claim a scheme that is already bound
    #[error("scheme {scheme} already registered by another backend")]
    SchemeAlreadyRegistered { scheme: String },

    /// Opaque backend failure (network, permissions, credentials, ...)
    #[error("{backend}: {message}")]
    Backend {
        backend: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// I/O errors outside of backend fetches
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Comparable classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    UrlInvalid,
    SchemeUnknown,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::UrlInvalid => write!(f, "url_invalid"),
            ErrorKind::SchemeUnknown => write!(f, "scheme_unknown"),
            ErrorKind::Other => write!(f, "other"),
        }
    }
}

impl Error {
    /// Create a backend error without an underlying cause
    pub fn backend<S: Into<String>>(backend: &'static str, message: S) -> Self {
        Self::Backend { backend, message: message.into(), source: None }
    }

    /// Create a backend error that keeps its cause
    pub fn backend_with_source<S: Into<String>>(
        backend: &'static str,
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Backend { backend, message: message.into(), source: Some(source) }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a new configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a new validation error for a specific field
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Classify this error for equality comparison against the sentinels
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound => ErrorKind::NotFound,
            Error::UrlInvalid => ErrorKind::UrlInvalid,
            Error::SchemeUnknown => ErrorKind::SchemeUnknown,
            _ => ErrorKind::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_url_invalid(&self) -> bool {
        self.kind() == ErrorKind::UrlInvalid
    }

    pub fn is_scheme_unknown(&self) -> bool {
        self.kind() == ErrorKind::SchemeUnknown
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
