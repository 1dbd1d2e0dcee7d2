//! Environment variable secret backend implementation
//!
//! Serves `env://` URLs from the process environment. The variable name is the
//! URL host (`env://DB_PASSWORD`) or, when the host is empty, the path
//! (`env:///DB_PASSWORD`). A configured prefix is prepended to the name.
//!
//! Intended for development and for values injected by the platform; the
//! environment is visible to anything that can inspect the process.

use super::backend::{decode_component, decoded_path, url_host, FetchOptions, SecretBackend};
use crate::config::EnvBackendConfig;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Environment variable secret backend
#[derive(Debug)]
pub struct EnvSecretBackend {
    prefix: String,
    span: tracing::Span,
}

impl EnvSecretBackend {
    pub fn new(config: &EnvBackendConfig, span: tracing::Span) -> Self {
        Self { prefix: config.prefix.clone(), span }
    }

    /// Variable name for a URL, including the prefix
    fn variable_name(&self, url: &Url) -> Result<String> {
        let name = match url_host(url) {
            Some(host) => decode_component(host)?,
            None => decoded_path(url)?,
        };

        if name.is_empty() {
            return Err(Error::backend("env", "no variable name specified"));
        }

        Ok(format!("{}{}", self.prefix, name))
    }
}

#[async_trait]
impl SecretBackend for EnvSecretBackend {
    fn name(&self) -> &'static str {
        "env"
    }

    fn supported_schemes(&self) -> Vec<String> {
        vec!["env".to_string()]
    }

    async fn fetch(&self, url: &Url, _options: &FetchOptions) -> Result<Vec<u8>> {
        let variable = self.variable_name(url)?;

        match std::env::var_os(&variable) {
            Some(value) => Ok(value.into_encoded_bytes()),
            None => {
                debug!(parent: &self.span, variable = %variable, "Environment variable not set");
                Err(Error::NotFound)
            }
        }
    }
}
