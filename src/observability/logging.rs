//! # Structured Logging
//!
//! Subscriber setup and the per-component spans that carry logging context.
//!
//! Library code never installs a subscriber. The binary calls [`init_logging`]
//! once; components receive a [`tracing::Span`] at construction and instrument
//! their work with it, so every event they emit is tagged with `service` and
//! `impl` fields.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Returns an error if the
/// filter is malformed; an already-installed subscriber is left in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config_with_source(
                format!("Invalid log level '{}'", config.log_level),
                Box::new(e),
            )
        })?,
    };

    // A subscriber installed elsewhere (e.g. by tests) stays in place.
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    tracing::debug!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json = config.json_logging,
        "Logging initialized"
    );
    Ok(())
}

/// Span identifying one component, e.g. `component_span("backend", "http")`
///
/// Handed to the registry and to each backend when they are built.
pub fn component_span(service: &'static str, implementation: &'static str) -> tracing::Span {
    tracing::info_span!("component", service = service, r#impl = implementation)
}
