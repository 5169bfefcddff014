//! Tracing subscriber setup for embedding applications and tools.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogConfig, LogFormat};

/// Errors installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The filter directive did not parse.
    #[error("invalid log filter {filter:?}: {source}")]
    InvalidFilter {
        /// Directive string.
        filter: String,
        /// Parse failure.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Install a global subscriber with JSON or pretty output.
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.filter).map_err(|source| LoggingError::InvalidFilter {
        filter: config.filter.clone(),
        source,
    })?;

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .try_init()?,
    }

    tracing::info!(format = ?config.format, filter = %config.filter, "tracing initialized");
    Ok(())
}
