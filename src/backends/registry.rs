//! Secret backend registry
//!
//! Binds URL schemes to backends and routes keys to them. Keys without `://`
//! are literal values and never reach a backend.

use super::backend::{FetchOptions, SecretBackend, DEFAULT_HOST};
use super::direct::DirectSecretBackend;
use super::env::EnvSecretBackend;
use super::file::FileSecretBackend;
use super::http::HttpSecretBackend;
use crate::config::BackendsConfig;
use crate::errors::{Error, Result};
use crate::observability::component_span;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, Instrument};
use url::Url;

/// Separator that marks a key as a URL rather than a literal value
const URL_MARKER: &str = "://";

/// Whether any `%` in the key is not followed by two hex digits
fn has_malformed_escape(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !matches!(
                bytes.get(i + 1..i + 3),
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
    })
}

/// Fill the host of `scheme://user:pass@/path` so the URL parser accepts it
///
/// Credentials cannot be attached to an empty host, so the authority gets
/// [`DEFAULT_HOST`], which backends read as "no host given".
fn with_default_host(key: &str) -> Cow<'_, str> {
    let Some(marker) = key.find(URL_MARKER) else {
        return Cow::Borrowed(key);
    };
    let start = marker + URL_MARKER.len();
    let rest = &key[start..];
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());

    let authority = &rest[..end];
    if authority.len() > 1 && authority.ends_with('@') {
        Cow::Owned(format!("{}{}{}", &key[..start + end], DEFAULT_HOST, &rest[end..]))
    } else {
        Cow::Borrowed(key)
    }
}

/// Parse a key already known to be a URL
fn parse_key(key: &str) -> Result<Url> {
    if has_malformed_escape(key) {
        return Err(Error::UrlInvalid);
    }

    let url = Url::parse(&with_default_host(key)).map_err(|_| Error::UrlInvalid)?;
    if url.scheme().is_empty() {
        return Err(Error::UrlInvalid);
    }
    Ok(url)
}

/// Registry of secret backends keyed by URL scheme
///
/// Each scheme is bound at most once; the first registration wins and later
/// conflicting registrations are rejected whole.
pub struct SecretBackendRegistry {
    backends: RwLock<HashMap<String, Arc<dyn SecretBackend>>>,
    span: tracing::Span,
}

impl std::fmt::Debug for SecretBackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let schemes = self
            .backends
            .try_read()
            .map(|b| b.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        f.debug_struct("SecretBackendRegistry").field("schemes", &schemes).finish()
    }
}

impl Default for SecretBackendRegistry {
    fn default() -> Self {
        Self::new(component_span("registry", "standard"))
    }
}

impl SecretBackendRegistry {
    /// Create a new registry with no backends
    pub fn new(span: tracing::Span) -> Self {
        Self { backends: RwLock::new(HashMap::new()), span }
    }

    /// Build a registry with every backend enabled in configuration
    pub async fn from_config(config: &BackendsConfig) -> Result<Self> {
        let registry = Self::default();

        if config.file.enabled {
            registry
                .register(Arc::new(FileSecretBackend::new(component_span("backend", "file"))))
                .await?;
        }

        if config.direct.enabled {
            registry
                .register(Arc::new(DirectSecretBackend::new(component_span("backend", "direct"))))
                .await?;
        }

        if config.env.enabled {
            registry
                .register(Arc::new(EnvSecretBackend::new(
                    &config.env,
                    component_span("backend", "env"),
                )))
                .await?;
        }

        if config.http.enabled {
            let http =
                HttpSecretBackend::from_config(&config.http, component_span("backend", "http"))?;
            registry.register(Arc::new(http)).await?;
        }

        if config.aws.enabled {
            #[cfg(feature = "aws")]
            {
                use super::aws::AwsSecretBackend;
                let aws = AwsSecretBackend::new(&config.aws, component_span("backend", "asm"));
                registry.register(Arc::new(aws)).await?;
            }
            #[cfg(not(feature = "aws"))]
            return Err(Error::config(
                "AWS Secrets Manager backend is enabled but steward was built without the 'aws' feature",
            ));
        }

        if config.gcp.enabled {
            #[cfg(feature = "gcp")]
            {
                use super::gcp::GcpSecretBackend;
                let gcp = GcpSecretBackend::new(&config.gcp, component_span("backend", "gsm"));
                registry.register(Arc::new(gcp)).await?;
            }
            #[cfg(not(feature = "gcp"))]
            return Err(Error::config(
                "GCP Secret Manager backend is enabled but steward was built without the 'gcp' feature",
            ));
        }

        Ok(registry)
    }

    /// Register a secret backend for every scheme it supports
    ///
    /// Fails with [`Error::SchemeAlreadyRegistered`] if any of its schemes is
    /// already bound, in which case none of them are bound.
    pub async fn register(&self, backend: Arc<dyn SecretBackend>) -> Result<()> {
        let schemes = backend.supported_schemes();
        let mut backends = self.backends.write().await;

        if let Some(taken) = schemes.iter().find(|s| backends.contains_key(s.as_str())) {
            debug!(
                parent: &self.span,
                backend = backend.name(),
                scheme = %taken,
                "Scheme already registered"
            );
            return Err(Error::SchemeAlreadyRegistered { scheme: taken.clone() });
        }

        for scheme in &schemes {
            backends.insert(scheme.clone(), Arc::clone(&backend));
        }

        info!(
            parent: &self.span,
            backend = backend.name(),
            schemes = ?schemes,
            "Registered secret backend"
        );
        Ok(())
    }

    /// Check if a scheme is bound
    pub async fn has_scheme(&self, scheme: &str) -> bool {
        self.backends.read().await.contains_key(scheme)
    }

    /// Get the bound schemes, sorted
    pub async fn registered_schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.backends.read().await.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Resolve a key to its payload
    pub async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.fetch_with(key, &FetchOptions::default()).await
    }

    /// Resolve a key to its payload, passing request options to the backend
    ///
    /// Errors from the backend are returned as-is so callers can match the
    /// sentinel variants directly.
    pub async fn fetch_with(&self, key: &str, options: &FetchOptions) -> Result<Vec<u8>> {
        // Empty keys never resolve.
        if key.is_empty() {
            return Err(Error::NotFound);
        }

        if !key.contains(URL_MARKER) {
            return Ok(key.as_bytes().to_vec());
        }

        let url = parse_key(key)?;

        let backend = self.backends.read().await.get(url.scheme()).cloned();
        let Some(backend) = backend else {
            trace!(parent: &self.span, scheme = url.scheme(), "No backend for scheme");
            return Err(Error::SchemeUnknown);
        };

        trace!(
            parent: &self.span,
            scheme = url.scheme(),
            backend = backend.name(),
            "Dispatching fetch"
        );
        backend.fetch(&url, options).instrument(self.span.clone()).await
    }
}
