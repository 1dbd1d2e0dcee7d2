//! File secret backend implementation
//!
//! Serves `file://` URLs by returning the contents of the file at the URL path,
//! e.g. `file:///home/me/secret.txt` reads `/home/me/secret.txt`.

use super::backend::{decode_component, FetchOptions, SecretBackend};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, Instrument};
use url::Url;

/// Filesystem secret backend
#[derive(Debug)]
pub struct FileSecretBackend {
    span: tracing::Span,
}

impl FileSecretBackend {
    pub fn new(span: tracing::Span) -> Self {
        Self { span }
    }
}

#[async_trait]
impl SecretBackend for FileSecretBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn supported_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    async fn fetch(&self, url: &Url, _options: &FetchOptions) -> Result<Vec<u8>> {
        let path = decode_component(url.path())?;

        async {
            match tokio::fs::read(&path).await {
                Ok(data) => Ok(data),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path, "File does not exist");
                    Err(Error::NotFound)
                }
                Err(e) => Err(Error::backend_with_source(
                    "file",
                    format!("failed to fetch value from {}", path),
                    Box::new(e),
                )),
            }
        }
        .instrument(self.span.clone())
        .await
    }
}
