//! # Command Line Interface
//!
//! Resolves keys from the command line with a registry built from configuration.

use crate::backends::{FetchOptions, SecretBackendRegistry};
use crate::config::AppConfig;
use crate::observability::init_logging;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "steward")]
#[command(about = "Resolve configuration keys to secret values")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve each key and write its value to stdout
    Fetch {
        /// Keys to resolve: literal values or backend URLs
        #[arg(required = true)]
        keys: Vec<String>,

        /// HTTP method for http(s) keys
        #[arg(long)]
        method: Option<String>,

        /// Content-Type and Accept header for http(s) keys
        #[arg(long)]
        mime_type: Option<String>,

        /// Request body for http(s) keys
        #[arg(long)]
        body: Option<String>,

        /// Separate values with a newline
        #[arg(short, long)]
        newline: bool,
    },

    /// List the URL schemes the configured registry can resolve
    Schemes,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    init_logging(&config.observability)?;

    let registry = SecretBackendRegistry::from_config(&config.backends).await?;

    match cli.command {
        Commands::Fetch { keys, method, mime_type, body, newline } => {
            let options = fetch_options(method, mime_type, body);
            let mut values = Vec::with_capacity(keys.len());
            for key in &keys {
                let value = registry
                    .fetch_with(key, &options)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to resolve {}: {}", redact(key), e))?;
                values.push(value);
            }

            let stdout = std::io::stdout();
            write_values(&mut stdout.lock(), &values, newline)?;
        }

        Commands::Schemes => {
            for scheme in registry.registered_schemes().await {
                println!("{}", scheme);
            }
        }
    }

    Ok(())
}

fn fetch_options(
    method: Option<String>,
    mime_type: Option<String>,
    body: Option<String>,
) -> FetchOptions {
    let mut options = FetchOptions::default();
    if let Some(method) = method {
        options = options.with_method(method);
    }
    if let Some(mime_type) = mime_type {
        options = options.with_mime_type(mime_type);
    }
    if let Some(body) = body {
        options = options.with_body(body);
    }
    options
}

/// Write resolved values in key order
fn write_values<W: Write>(out: &mut W, values: &[Vec<u8>], newline: bool) -> std::io::Result<()> {
    for value in values {
        out.write_all(value)?;
        if newline {
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

/// Key as shown in error messages: URL passwords are masked, literals hidden
fn redact(key: &str) -> String {
    if !key.contains("://") {
        return "<literal>".to_string();
    }
    match url::Url::parse(key) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("****"));
            url.to_string()
        }
        _ => key.to_string(),
    }
}
