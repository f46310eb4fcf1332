//! # vitrine-logging
//!
//! Structured logging setup with `tracing`.
//!
//! One call to [`init`] at process start installs the global subscriber:
//! env-filter level selection (the `VITRINE_LOG` env var wins over the
//! configured level), human-readable text or JSON line output.

#![deny(unsafe_code)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Env var that overrides the configured log filter.
pub const LOG_ENV_VAR: &str = "VITRINE_LOG";

/// Output format for log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Errors from logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter {directive:?}: {source}")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// A global subscriber was already installed.
    #[error("global tracing subscriber already installed")]
    AlreadyInitialized,
}

/// Build the env filter: `VITRINE_LOG` if set, else the given directive.
pub fn build_filter(directive: &str) -> Result<EnvFilter, LoggingError> {
    if std::env::var(LOG_ENV_VAR).is_ok() {
        return Ok(EnvFilter::from_env(LOG_ENV_VAR));
    }
    EnvFilter::try_new(directive).map_err(|source| LoggingError::InvalidFilter {
        directive: directive.to_string(),
        source,
    })
}

/// Install the global tracing subscriber.
///
/// `directive` is a `tracing` env-filter expression (`info`,
/// `vitrine_server=debug`, …). Returns an error rather than panicking if a
/// subscriber is already installed, so tests can call it repeatedly.
pub fn init(directive: &str, format: LogFormat) -> Result<(), LoggingError> {
    let filter = build_filter(directive)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|_| LoggingError::AlreadyInitialized)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_filter_accepts_plain_level() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("debug").is_ok());
    }

    #[test]
    fn build_filter_accepts_module_directive() {
        assert!(build_filter("vitrine_server=debug,info").is_ok());
    }

    #[test]
    fn build_filter_rejects_garbage() {
        let result = build_filter("not==valid==at all");
        assert!(matches!(
            result,
            Err(LoggingError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn invalid_filter_error_names_directive() {
        let err = build_filter("===").unwrap_err();
        assert!(err.to_string().contains("==="));
    }

    #[test]
    fn init_twice_reports_already_initialized() {
        // Whichever call wins the race installs the subscriber; the second
        // must fail with AlreadyInitialized instead of panicking.
        let first = init("info", LogFormat::Text);
        let second = init("info", LogFormat::Text);
        assert!(first.is_ok() || matches!(first, Err(LoggingError::AlreadyInitialized)));
        assert!(matches!(second, Err(LoggingError::AlreadyInitialized)));
    }

    #[test]
    fn format_default_is_text() {
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}
