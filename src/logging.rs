//! Centralized structured logging configuration.
//!
//! User-facing output stays on stdout via `println!`. Operational telemetry
//! (classification, cache hits, scan timing, diagnostics) goes to stderr via
//! tracing.

pub mod audit;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable colored output
    Pretty,
    /// Structured JSON lines
    Json,
}

/// Errors from logging initialization.
#[derive(Error, Debug)]
pub enum LogInitError {
    #[error("failed to parse log filter: {0}")]
    Filter(String),

    #[error("failed to set global subscriber: {0}")]
    SetGlobal(String),
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` env var overrides the provided level when set. All output is
/// directed to **stderr** so stdout remains clean for gate verdicts.
pub fn init(level: Level, format: LogFormat) -> Result<(), LogInitError> {
    let filter = build_env_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init(),
    };

    result.map_err(|e| LogInitError::SetGlobal(e.to_string()))
}

fn build_env_filter(level: Level) -> Result<EnvFilter, LogInitError> {
    // RUST_LOG overrides the CLI-provided level when set
    let filter_str = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    EnvFilter::try_new(&filter_str).map_err(|e| LogInitError::Filter(e.to_string()))
}
