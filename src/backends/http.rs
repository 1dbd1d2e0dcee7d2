//! HTTP secret backend implementation
//!
//! Serves `http://` and `https://` URLs by returning the response body, e.g.
//! `https://secrets.example.com/token` returns the body served at that URL.
//!
//! Plain fetches are `GET` requests on a shared client. When the call carries
//! [`FetchOptions`] (method, MIME type, body, TLS material) or the backend was
//! configured with default TLS material, the request goes through a dedicated
//! client that requires TLS 1.3.
//!
//! Every failure to obtain a usable response (connection error, unreadable body,
//! empty body, non-2xx status) is reported as `NotFound`; the reason is logged at
//! debug level.

use super::backend::{FetchOptions, SecretBackend};
use crate::config::HttpBackendConfig;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Certificate, Client, Identity, Method};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace, Instrument};
use url::Url;

/// HTTP(S) secret backend
pub struct HttpSecretBackend {
    client: Client,
    timeout: Duration,
    /// TLS material applied to every request unless the call overrides it
    defaults: FetchOptions,
    span: tracing::Span,
}

impl std::fmt::Debug for HttpSecretBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSecretBackend")
            .field("timeout", &self.timeout)
            .field("default_ca_cert", &self.defaults.ca_cert.is_some())
            .field("default_client_cert", &self.defaults.client_cert.is_some())
            .field("client", &"[reqwest::Client]")
            .finish()
    }
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        Error::config_with_source(
            format!("Failed to read {} from {}", what, path.display()),
            Box::new(e),
        )
    })
}

impl HttpSecretBackend {
    /// Create a backend with no default TLS material
    pub fn new(timeout: Duration, span: tracing::Span) -> Result<Self> {
        Self::with_defaults(timeout, FetchOptions::default(), span)
    }

    /// Create a backend from configuration, loading any PEM files it names
    pub fn from_config(config: &HttpBackendConfig, span: tracing::Span) -> Result<Self> {
        let mut defaults = FetchOptions::default();

        if let Some(path) = &config.ca_cert_path {
            defaults.ca_cert = Some(read_pem(path, "CA certificate")?);
        }
        if let Some(path) = &config.client_cert_path {
            defaults.client_cert = Some(read_pem(path, "client certificate")?);
        }
        if let Some(path) = &config.client_key_path {
            defaults.client_key = Some(read_pem(path, "client key")?);
        }

        Self::with_defaults(config.timeout(), defaults, span)
    }

    fn with_defaults(
        timeout: Duration,
        defaults: FetchOptions,
        span: tracing::Span,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            Error::config_with_source("Failed to build HTTP client", Box::new(e))
        })?;

        Ok(Self { client, timeout, defaults, span })
    }

    /// Per-call options layered over the configured defaults
    fn effective_options(&self, options: &FetchOptions) -> FetchOptions {
        let mut merged = options.clone();
        if merged.ca_cert.is_none() {
            merged.ca_cert = self.defaults.ca_cert.clone();
        }
        if merged.client_cert.is_none() && merged.client_key.is_none() {
            merged.client_cert = self.defaults.client_cert.clone();
            merged.client_key = self.defaults.client_key.clone();
        }
        merged
    }

    /// Build a dedicated client carrying the request's TLS material
    fn tls_client(&self, options: &FetchOptions) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(self.timeout)
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_3);

        if let Some(ca_cert) = &options.ca_cert {
            trace!("Adding CA certificate");
            let certificate = Certificate::from_pem(ca_cert).map_err(|e| {
                Error::backend_with_source("http", "invalid CA certificate", Box::new(e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        match (&options.client_cert, &options.client_key) {
            (Some(cert), Some(key)) => {
                trace!("Adding client certificate");
                let mut pem = cert.clone();
                pem.push(b'\n');
                pem.extend_from_slice(key);
                let identity = Identity::from_pem(&pem).map_err(|e| {
                    Error::backend_with_source(
                        "http",
                        "invalid client certificate or key",
                        Box::new(e),
                    )
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(Error::backend(
                    "http",
                    "both or neither of client certificate and client key must be specified",
                ));
            }
        }

        builder.build().map_err(|e| {
            Error::backend_with_source("http", "invalid TLS material", Box::new(e))
        })
    }

    async fn fetch_inner(&self, url: &Url, options: &FetchOptions) -> Result<Vec<u8>> {
        let options = self.effective_options(options);

        let request = if options.is_empty() {
            self.client.get(url.as_str())
        } else {
            let client = self.tls_client(&options)?;

            let method = match &options.method {
                Some(method) => match Method::from_bytes(method.to_uppercase().as_bytes()) {
                    Ok(method) => method,
                    Err(e) => {
                        debug!(error = %e, "Failed to create request");
                        return Err(Error::NotFound);
                    }
                },
                None => Method::GET,
            };

            let mut request = client.request(method, url.as_str());
            if let Some(body) = &options.body {
                request = request.body(body.clone());
            }
            if let Some(mime_type) = &options.mime_type {
                let mime_type = mime_type.to_lowercase();
                request = request.header(CONTENT_TYPE, &mime_type).header(ACCEPT, &mime_type);
            }
            request
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Failed to call endpoint");
                return Err(Error::NotFound);
            }
        };

        let status = response.status();
        let data = match response.bytes().await {
            Ok(data) => data,
            Err(e) => {
                debug!(error = %e, "Failed to read response");
                return Err(Error::NotFound);
            }
        };

        if data.is_empty() {
            debug!(status_code = status.as_u16(), "No data in response");
            return Err(Error::NotFound);
        }

        if !status.is_success() {
            debug!(status_code = status.as_u16(), len = data.len(), "Request failed");
            return Err(Error::NotFound);
        }

        Ok(data.to_vec())
    }
}

#[async_trait]
impl SecretBackend for HttpSecretBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn supported_schemes(&self) -> Vec<String> {
        vec!["http".to_string(), "https".to_string()]
    }

    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<Vec<u8>> {
        self.fetch_inner(url, options).instrument(self.span.clone()).await
    }
}
