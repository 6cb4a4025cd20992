//! Structured logging for harness runs.
//!
//! Exercisers log through `tracing` with structured fields (`class`, `check`,
//! `run`, `property`, `method`). Nothing is printed until a subscriber is
//! installed; test binaries call [`init_test_logging`] which:
//! - routes output through the test writer so `cargo test` captures it
//! - honours `RUST_LOG` (default `info`)
//! - switches to JSON lines when `LOG_FORMAT=json`

use std::env;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info";

/// Configuration for logging setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset or invalid
    pub default_filter: String,
    /// Emit span enter/close events for every check
    pub span_events: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured lines
    Json,
    /// Human-readable output
    Pretty,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_filter: DEFAULT_FILTER.to_string(),
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => config.format,
            };
        }

        if let Ok(spans) = env::var("LOG_SPAN_EVENTS") {
            config.span_events = matches!(spans.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Install a test-friendly subscriber configured from the environment.
///
/// Safe to call from every test; only the first call installs anything.
/// Returns whether this call installed the subscriber.
pub fn init_test_logging() -> bool {
    init_with(LoggingConfig::from_env())
}

/// Install a test-friendly subscriber with an explicit configuration.
pub fn init_with(config: LoggingConfig) -> bool {
    let registry = tracing_subscriber::registry();

    let installed = match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_test_writer()
                .with_target(true)
                .with_level(true)
                .with_span_events(config.span_events())
                .with_current_span(true)
                .with_filter(config.env_filter());
            registry.with(fmt_layer).try_init().is_ok()
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_test_writer()
                .with_target(true)
                .with_level(true)
                .with_span_events(config.span_events())
                .with_ansi(false)
                .with_filter(config.env_filter());
            registry.with(fmt_layer).try_init().is_ok()
        }
    };

    if installed {
        tracing::debug!(format = ?config.format, "test logging initialized");
    }
    installed
}
