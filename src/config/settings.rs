//! # Configuration Settings
//!
//! Defines the configuration structure for steward: which backends are built,
//! their defaults, and how logging is set up.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

/// Prefix for environment variable overrides, e.g. `STEWARD_BACKENDS__HTTP__TIMEOUT_SECONDS`
pub const ENV_PREFIX: &str = "STEWARD";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Backend configuration
    #[validate(nested)]
    pub backends: BackendsConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional file, and environment overrides
    ///
    /// Sources are layered in that order; later sources win. The result is
    /// validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()?;
        Ok(())
    }

    /// Cross-field checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        let backends = &self.backends;

        if !backends.any_enabled() {
            return Err(Error::validation("At least one backend must be enabled"));
        }

        if backends.http.client_cert_path.is_some() != backends.http.client_key_path.is_some() {
            return Err(Error::validation_field(
                "Client certificate and client key must be configured together",
                "backends.http.client_key_path",
            ));
        }

        if backends.aws.access_key_id.is_some() != backends.aws.secret_access_key.is_some() {
            return Err(Error::validation_field(
                "AWS access key id and secret access key must be configured together",
                "backends.aws.secret_access_key",
            ));
        }

        Ok(())
    }
}

/// Which backends are registered, and their defaults
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct BackendsConfig {
    pub file: ToggleConfig,
    pub direct: ToggleConfig,
    #[validate(nested)]
    pub env: EnvBackendConfig,
    #[validate(nested)]
    pub http: HttpBackendConfig,
    pub aws: AwsBackendConfig,
    pub gcp: GcpBackendConfig,
}

impl BackendsConfig {
    /// Whether any backend will be registered
    pub fn any_enabled(&self) -> bool {
        self.file.enabled
            || self.direct.enabled
            || self.env.enabled
            || self.http.enabled
            || self.aws.enabled
            || self.gcp.enabled
    }
}

/// On/off switch for backends without further settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    pub enabled: bool,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Environment variable backend (`env://NAME`)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EnvBackendConfig {
    pub enabled: bool,

    /// Prepended to the variable name from the URL
    #[validate(length(max = 128, message = "Env prefix must be at most 128 characters"))]
    pub prefix: String,
}

impl Default for EnvBackendConfig {
    fn default() -> Self {
        Self { enabled: true, prefix: String::new() }
    }
}

/// HTTP(S) backend
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HttpBackendConfig {
    pub enabled: bool,

    /// Request timeout in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "HTTP timeout must be between 1 and 300 seconds"
    ))]
    pub timeout_seconds: u64,

    /// PEM file with a CA certificate to trust for every request
    pub ca_cert_path: Option<PathBuf>,

    /// PEM file with a client certificate presented on every request
    pub client_cert_path: Option<PathBuf>,

    /// PEM file with the key for `client_cert_path`
    pub client_key_path: Option<PathBuf>,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: 30,
            ca_cert_path: None,
            client_cert_path: None,
            client_key_path: None,
        }
    }
}

impl HttpBackendConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// AWS Secrets Manager backend (`asm://`)
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AwsBackendConfig {
    pub enabled: bool,

    /// Region used when the URL has no host
    pub region: Option<String>,

    /// Static credentials used when the URL carries none
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl std::fmt::Debug for AwsBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsBackendConfig")
            .field("enabled", &self.enabled)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// GCP Secret Manager backend (`gsm://`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GcpBackendConfig {
    pub enabled: bool,

    /// Project ID used when the URL has no host
    pub project: Option<String>,

    /// Service account key file; falls back to `GOOGLE_APPLICATION_CREDENTIALS`
    pub credentials_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name attached to every log line
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "steward".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.backends.file.enabled);
        assert!(config.backends.http.enabled);
        assert!(!config.backends.aws.enabled);
        assert!(!config.backends.gcp.enabled);
    }

    #[test]
    fn test_http_timeout() {
        let config = HttpBackendConfig { timeout_seconds: 45, ..Default::default() };
        assert_eq!(config.timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_http_timeout_out_of_range() {
        let mut config = AppConfig::default();
        config.backends.http.timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_client_cert_without_key_rejected() {
        let mut config = AppConfig::default();
        config.backends.http.client_cert_path = Some(PathBuf::from("/tmp/cert.pem"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("configured together"));
    }

    #[test]
    fn test_aws_partial_credentials_rejected() {
        let mut config = AppConfig::default();
        config.backends.aws.access_key_id = Some("AKIDEXAMPLE".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_aws_secret_redacted_in_debug() {
        let config = AwsBackendConfig {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("wJalrXUtnFEMI".to_string()),
            ..Default::default()
        };

        let output = format!("{:?}", config);
        assert!(output.contains("AKIDEXAMPLE"));
        assert!(!output.contains("wJalrXUtnFEMI"));
    }

    #[test]
    fn test_all_backends_disabled_rejected() {
        let mut config = AppConfig::default();
        config.backends.file.enabled = false;
        config.backends.direct.enabled = false;
        config.backends.env.enabled = false;
        config.backends.http.enabled = false;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("At least one backend"));
    }

    #[test]
    fn test_empty_log_level_rejected() {
        let mut config = AppConfig::default();
        config.observability.log_level = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[backends.http]
timeout_seconds = 5

[backends.env]
prefix = "APP_"

[backends.gcp]
enabled = true
project = "my-project"

[observability]
log_level = "debug"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.backends.http.timeout_seconds, 5);
        assert_eq!(config.backends.env.prefix, "APP_");
        assert!(config.backends.gcp.enabled);
        assert_eq!(config.backends.gcp.project.as_deref(), Some("my-project"));
        assert_eq!(config.observability.log_level, "debug");
        // Untouched sections keep their defaults
        assert!(config.backends.file.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/steward.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
