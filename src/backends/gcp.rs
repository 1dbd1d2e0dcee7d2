//! GCP Secret Manager backend implementation
//!
//! Serves `gsm://` URLs of the form `gsm://project/secret`, always reading the
//! `latest` version. The project is the project _ID_, not its display name.
//!
//! ## Configuration
//!
//! - `project`: used when the URL has no host (`gsm:///secret`)
//! - `credentials_path`: service account key file; falls back to
//!   `GOOGLE_APPLICATION_CREDENTIALS`
//!
//! The API client is created on first use and reused afterwards.

use super::backend::{decoded_path, url_host, FetchOptions, SecretBackend};
use crate::config::GcpBackendConfig;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use google_secretmanager1::common::Error as ApiError;
use google_secretmanager1::{hyper_rustls, hyper_util, SecretManager};
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, info, Instrument};
use url::Url;

type Hub =
    SecretManager<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Full resource name of the latest version of a secret
fn resource_name(project: &str, secret: &str) -> String {
    format!("projects/{}/secrets/{}/versions/latest", project, secret)
}

/// Text the API uses when a secret or version is missing
const MISSING_TEXT: &str = "it may not exist";

/// Whether an API error means the secret (or its version) does not exist
fn is_not_found(error: &ApiError) -> bool {
    match error {
        ApiError::BadRequest(body) => {
            let status = &body["error"];
            status["status"] == "NOT_FOUND"
                || status["code"] == 404
                || status["message"].as_str().is_some_and(|m| m.contains(MISSING_TEXT))
        }
        other => other.to_string().contains(MISSING_TEXT),
    }
}

/// GCP Secret Manager secret backend
pub struct GcpSecretBackend {
    project: Option<String>,
    credentials_path: Option<PathBuf>,
    hub: OnceCell<Hub>,
    span: tracing::Span,
}

impl std::fmt::Debug for GcpSecretBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSecretBackend")
            .field("project", &self.project)
            .field("credentials_path", &self.credentials_path)
            .field("hub", &self.hub.get().map(|_| "[SecretManager]"))
            .finish()
    }
}

impl GcpSecretBackend {
    pub fn new(config: &GcpBackendConfig, span: tracing::Span) -> Self {
        Self {
            project: config.project.clone(),
            credentials_path: config.credentials_path.clone(),
            hub: OnceCell::new(),
            span,
        }
    }

    /// Project and secret name for a URL
    fn resolve_target(&self, url: &Url) -> Result<(String, String)> {
        let project = match url_host(url) {
            Some(host) => host.to_string(),
            None => self
                .project
                .clone()
                .ok_or_else(|| Error::backend("gsm", "no project specified"))?,
        };

        let secret = decoded_path(url)?;
        if secret.is_empty() {
            return Err(Error::backend("gsm", "no secret specified"));
        }

        Ok((project, secret))
    }

    fn credentials_path(&self) -> Result<PathBuf> {
        self.credentials_path
            .clone()
            .or_else(|| std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from))
            .ok_or_else(|| {
                Error::backend(
                    "gsm",
                    "no credentials configured; set credentials_path or GOOGLE_APPLICATION_CREDENTIALS",
                )
            })
    }

    async fn build_hub(&self) -> Result<Hub> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| {
                Error::backend_with_source("gsm", "failed to load native TLS roots", Box::new(e))
            })?
            .https_or_http()
            .enable_http2()
            .build();
        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(connector);

        let credentials_path = self.credentials_path()?;
        let key = yup_oauth2::read_service_account_key(&credentials_path).await.map_err(|e| {
            Error::backend_with_source(
                "gsm",
                format!("failed to read credentials from {}", credentials_path.display()),
                Box::new(e),
            )
        })?;
        let auth =
            yup_oauth2::ServiceAccountAuthenticator::builder(key).build().await.map_err(|e| {
                Error::backend_with_source("gsm", "failed to create client connection", Box::new(e))
            })?;

        info!(
            credentials_path = %credentials_path.display(),
            "Initialized GCP Secret Manager client"
        );
        Ok(SecretManager::new(client, auth))
    }

    async fn fetch_secret(&self, project: String, secret: String) -> Result<Vec<u8>> {
        let hub = self.hub.get_or_try_init(|| self.build_hub()).await?;
        let name = resource_name(&project, &secret);
        debug!(resource_name = %name, "Fetching secret from GCP Secret Manager");

        match hub.projects().secrets_versions_access(&name).doit().await {
            Ok((_, response)) => {
                let data = response.payload.and_then(|payload| payload.data).unwrap_or_default();
                Ok(data)
            }
            Err(e) => {
                if is_not_found(&e) {
                    debug!(resource_name = %name, "Secret not found in GCP Secret Manager");
                    return Err(Error::NotFound);
                }
                Err(Error::backend("gsm", format!("failed to fetch secret: {}", e)))
            }
        }
    }
}

#[async_trait]
impl SecretBackend for GcpSecretBackend {
    fn name(&self) -> &'static str {
        "gsm"
    }

    fn supported_schemes(&self) -> Vec<String> {
        vec!["gsm".to_string()]
    }

    async fn fetch(&self, url: &Url, _options: &FetchOptions) -> Result<Vec<u8>> {
        let (project, secret) = self.resolve_target(url)?;
        self.fetch_secret(project, secret).instrument(self.span.clone()).await
    }
}
