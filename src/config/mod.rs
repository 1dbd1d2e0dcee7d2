//! # Configuration Management
//!
//! Layered configuration (defaults, optional file, `STEWARD_*` environment) loaded
//! with the `config` crate and checked once with `validator`.

pub mod settings;

pub use settings::{
    AppConfig, AwsBackendConfig, BackendsConfig, EnvBackendConfig, GcpBackendConfig,
    HttpBackendConfig, ObservabilityConfig, ToggleConfig, ENV_PREFIX,
};
