//! # Structured Logging Module
//!
//! Environment-aware structured logging for the probe runners. Console output
//! is human-readable by default; `PROBE_LOG_FORMAT=json` switches to JSON
//! lines for log shippers.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::env_vars;
use crate::error::ProbeError;
use crate::probe::ProbeOutcome;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Output format of the console layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let format = get_log_format();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = match format {
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed(),
        };

        // A global subscriber may already be installed by an embedding process
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            format = ?format,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env_vars::ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn get_log_format() -> LogFormat {
    parse_log_format(std::env::var(env_vars::LOG_FORMAT).ok().as_deref())
}

fn parse_log_format(raw: Option<&str>) -> LogFormat {
    match raw.map(str::trim) {
        Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

/// Audit line for a successful probe cycle
pub fn log_probe_outcome(outcome: &ProbeOutcome) {
    tracing::info!(
        database = %outcome.database,
        base_url = %outcome.base_url,
        payload = %outcome.payload,
        encoded_key = %outcome.encoded_key,
        duration_ms = outcome.timings.total_ms(),
        timestamp = %Utc::now().to_rfc3339(),
        "data: {} {}",
        outcome.database,
        outcome.payload
    );
}

/// Failure line for a probe cycle, tagged with the target it ran against
pub fn log_probe_failure(database: &str, base_url: &str, error: &ProbeError) {
    tracing::error!(
        database = %database,
        base_url = %base_url,
        step = %error.step(),
        kind = error.kind(),
        error = %error,
        timestamp = %Utc::now().to_rfc3339(),
        "error:{} {}",
        database,
        error
    );
}
