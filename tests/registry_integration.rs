//! Integration tests for key resolution through the public registry API

use async_trait::async_trait;
use proptest::prelude::*;
use std::io::Write;
use std::sync::Arc;
use steward::config::BackendsConfig;
use steward::{Error, ErrorKind, FetchOptions, Result, SecretBackend, SecretBackendRegistry};
use url::Url;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Backend that answers every URL with a fixed value
#[derive(Debug)]
struct StaticBackend {
    schemes: Vec<&'static str>,
    value: &'static [u8],
}

#[async_trait]
impl SecretBackend for StaticBackend {
    fn name(&self) -> &'static str {
        "static"
    }

    fn supported_schemes(&self) -> Vec<String> {
        self.schemes.iter().map(|s| s.to_string()).collect()
    }

    async fn fetch(&self, _url: &Url, _options: &FetchOptions) -> Result<Vec<u8>> {
        Ok(self.value.to_vec())
    }
}

fn static_backend(schemes: &[&'static str], value: &'static [u8]) -> Arc<StaticBackend> {
    Arc::new(StaticBackend { schemes: schemes.to_vec(), value })
}

#[tokio::test]
async fn test_end_to_end_mock_scheme() {
    let registry = SecretBackendRegistry::default();
    registry.register(static_backend(&["mock"], b"hello")).await.unwrap();

    assert_eq!(registry.fetch("mock://x").await.unwrap(), b"hello");
    assert_eq!(registry.fetch("nomock://x").await.unwrap_err().kind(), ErrorKind::SchemeUnknown);
    assert_eq!(registry.fetch("plain-text").await.unwrap(), b"plain-text");
    assert_eq!(registry.fetch("").await.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_first_registration_wins() {
    let registry = SecretBackendRegistry::default();
    registry.register(static_backend(&["s"], b"first")).await.unwrap();

    let err = registry.register(static_backend(&["s"], b"second")).await.unwrap_err();
    assert!(matches!(err, Error::SchemeAlreadyRegistered { .. }));
    assert_eq!(registry.fetch("s://key").await.unwrap(), b"first");
}

#[tokio::test]
async fn test_conflicting_registration_binds_nothing() {
    let registry = SecretBackendRegistry::default();
    registry.register(static_backend(&["a"], b"a")).await.unwrap();

    assert!(registry.register(static_backend(&["a", "b"], b"ab")).await.is_err());
    assert!(!registry.has_scheme("b").await);
    assert_eq!(registry.fetch("b://key").await.unwrap_err().kind(), ErrorKind::SchemeUnknown);
}

#[tokio::test]
async fn test_invalid_urls() {
    let registry = SecretBackendRegistry::from_config(&BackendsConfig::default()).await.unwrap();

    for key in ["://missing-scheme", "1bad://x", "http://[::1", "direct:///%zz", "file:///a%2"] {
        let err = registry.fetch(key).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UrlInvalid, "key {:?}", key);
    }
}

#[tokio::test]
async fn test_configured_registry_schemes() {
    let registry = SecretBackendRegistry::from_config(&BackendsConfig::default()).await.unwrap();
    assert_eq!(registry.registered_schemes().await, vec!["direct", "env", "file", "http", "https"]);
}

#[tokio::test]
async fn test_configured_registry_builtin_backends() {
    let registry = SecretBackendRegistry::from_config(&BackendsConfig::default()).await.unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"from-file").unwrap();
    let file_key = Url::from_file_path(file.path()).unwrap().to_string();
    assert_eq!(registry.fetch(&file_key).await.unwrap(), b"from-file");

    let missing = Url::from_file_path(file.path().with_extension("missing")).unwrap();
    assert!(registry.fetch(missing.as_str()).await.unwrap_err().is_not_found());

    assert_eq!(registry.fetch("direct:///inline").await.unwrap(), b"inline");

    std::env::set_var("STEWARD_IT_REGISTRY_TOKEN", "from-env");
    assert_eq!(registry.fetch("env://STEWARD_IT_REGISTRY_TOKEN").await.unwrap(), b"from-env");
    std::env::remove_var("STEWARD_IT_REGISTRY_TOKEN");
}

#[tokio::test]
async fn test_configured_registry_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("from-http"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/exchange"))
        .and(header("content-type", "application/json"))
        .and(body_string("{\"grant\":\"x\"}"))
        .respond_with(ResponseTemplate::new(200).set_body_string("exchanged"))
        .mount(&server)
        .await;

    let registry = SecretBackendRegistry::from_config(&BackendsConfig::default()).await.unwrap();

    let key = format!("{}/v1/token", server.uri());
    assert_eq!(registry.fetch(&key).await.unwrap(), b"from-http");

    let options = FetchOptions::default()
        .with_method("post")
        .with_mime_type("application/json")
        .with_body("{\"grant\":\"x\"}");
    let key = format!("{}/v1/exchange", server.uri());
    assert_eq!(registry.fetch_with(&key, &options).await.unwrap(), b"exchanged");

    let key = format!("{}/v1/unknown", server.uri());
    assert!(registry.fetch(&key).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_concurrent_fetches() {
    let registry = Arc::new(SecretBackendRegistry::default());
    registry.register(static_backend(&["mock"], b"shared")).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    registry.fetch("mock://key").await
                } else {
                    registry.fetch("shared").await
                }
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), b"shared");
    }
}

proptest! {
    #[test]
    fn prop_literal_keys_are_returned_verbatim(key in "[^\\x00]{1,64}") {
        prop_assume!(!key.contains("://"));

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let registry = SecretBackendRegistry::default();

        let first = runtime.block_on(registry.fetch(&key)).unwrap();
        let second = runtime.block_on(registry.fetch(&key)).unwrap();
        prop_assert_eq!(&first, key.as_bytes());
        prop_assert_eq!(first, second);
    }
}
