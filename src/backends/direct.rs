//! Direct secret backend implementation
//!
//! Serves `direct://` URLs by reflecting the value embedded in the URL path:
//! `direct:///secret` returns `secret`.

use super::backend::{decoded_path, FetchOptions, SecretBackend};
use crate::errors::Result;
use async_trait::async_trait;
use tracing::trace;
use url::Url;

/// Backend that returns the URL path itself as the value
#[derive(Debug)]
pub struct DirectSecretBackend {
    span: tracing::Span,
}

impl DirectSecretBackend {
    pub fn new(span: tracing::Span) -> Self {
        Self { span }
    }
}

#[async_trait]
impl SecretBackend for DirectSecretBackend {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn supported_schemes(&self) -> Vec<String> {
        vec!["direct".to_string()]
    }

    async fn fetch(&self, url: &Url, _options: &FetchOptions) -> Result<Vec<u8>> {
        let value = decoded_path(url)?;
        trace!(parent: &self.span, len = value.len(), "Returning direct value");
        Ok(value.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fetch(key: &str) -> Result<Vec<u8>> {
        let backend = DirectSecretBackend::new(tracing::Span::none());
        backend.fetch(&Url::parse(key).unwrap(), &FetchOptions::default()).await
    }

    #[tokio::test]
    async fn test_fetch_value() {
        assert_eq!(fetch("direct:///secret").await.unwrap(), b"secret");
    }

    #[tokio::test]
    async fn test_fetch_nested_path() {
        assert_eq!(fetch("direct:///a/b/c").await.unwrap(), b"a/b/c");
    }

    #[tokio::test]
    async fn test_fetch_percent_encoded() {
        assert_eq!(fetch("direct:///hello%20world").await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_fetch_empty() {
        assert!(fetch("direct://").await.unwrap().is_empty());
        assert!(fetch("direct:///").await.unwrap().is_empty());
    }
}
