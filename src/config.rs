//! Kernel configuration.
//!
//! Environment variables:
//! - `TRACE_KERNEL_HISTORY_LIMIT`: undo depth (default: 50)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//! - `RUST_LOG`: log filter (default: info)

use serde::{Deserialize, Serialize};

/// Default number of undoable commits.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "trace_graph_kernel=info";

/// Errors reading configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormat {
    /// Parse from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive string.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Configuration for a [`GraphState`](crate::state::GraphState).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Maximum number of undoable commits.
    pub history_limit: usize,
    /// Logging setup.
    pub log: LogConfig,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            log: LogConfig::default(),
        }
    }
}

impl KernelConfig {
    /// Small history and pretty logs, for tests.
    pub fn minimal() -> Self {
        Self {
            history_limit: 5,
            log: LogConfig {
                format: LogFormat::Pretty,
                filter: "trace_graph_kernel=debug".to_string(),
            },
        }
    }

    /// Read configuration from the environment, falling back to defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("TRACE_KERNEL_HISTORY_LIMIT") {
            config.history_limit = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "TRACE_KERNEL_HISTORY_LIMIT",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("LOG_FORMAT") {
            config.log.format = LogFormat::parse(value.trim()).ok_or(ConfigError::InvalidValue {
                var: "LOG_FORMAT",
                value: value.clone(),
            })?;
        }

        if let Some(filter) = lookup("RUST_LOG") {
            if !filter.trim().is_empty() {
                config.log.filter = filter;
            }
        }

        Ok(config)
    }
}
