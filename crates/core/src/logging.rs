//! Logging setup for Strata.
//!
//! Diagnostics always go to stderr; stdout carries command output only
//! (schema JSON, run summaries), so it stays pipeable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{
    fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};

/// Filter used when neither `--log-level` nor `RUST_LOG` is given.
const DEFAULT_FILTER: &str = "info";

/// Shape of the log lines on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Unknown log format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `log_level` takes any `EnvFilter` directive string (`debug`,
/// `strata_pipeline=trace,warn`, ...). Without one, `RUST_LOG` is consulted
/// and then `info`. Color is never used for JSON output.
///
/// # Example
/// ```no_run
/// use strata_core::logging::{init_logging, LogFormat};
///
/// init_logging(None, LogFormat::Text, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, format: LogFormat, no_color: bool) -> AppResult<()> {
    let from_env = std::env::var("RUST_LOG").ok();
    let filter_str = log_level.or(from_env.as_deref()).unwrap_or(DEFAULT_FILTER);
    let env_filter = build_filter(filter_str)?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Text => registry
            .with(
                tracing_fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(!no_color && std::env::var_os("NO_COLOR").is_none()),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
    };

    result.map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

fn build_filter(filter_str: &str) -> AppResult<EnvFilter> {
    EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", filter_str, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_directives() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("strata_pipeline=debug,warn").is_ok());
    }

    #[test]
    fn test_build_filter_rejects_garbage() {
        assert!(build_filter("strata=notalevel").is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default().to_string(), "text");
    }
}
