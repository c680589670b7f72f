//! Logging setup for the HabitShare engine
//!
//! Collaborators are identified by e-mail address, so account identifiers
//! must not reach log output in clear text. This crate installs the
//! `tracing-subscriber` stack and provides:
//!
//! - [`account`]: a `Display` wrapper used in tracing fields
//!   (`account = %account(id)`), rendered hashed or masked
//! - [`redact_text`]: the same rendering applied to free text; installed as
//!   the error-text filter of `error_common::log_error`
//! - [`PiiRedactor`]: configurable scrubbing with extra patterns
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init, LoggerConfig};
//!
//! init(&LoggerConfig::default()).expect("logger");
//! tracing::info!(account = %logger_redacted::account("ana@example.com"), "signed in");
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use error_common::{Categorized, ErrorCategory};
use thiserror::Error;
use tracing_subscriber::{fmt, fmt::time::ChronoUtc, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

impl Categorized for LoggerError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidFilter(_) => ErrorCategory::Validation,
            Self::AlreadyInitialized(_) => ErrorCategory::Internal,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `config.log_level`.
pub fn init(config: &LoggerConfig) -> Result<(), LoggerError> {
    set_account_redaction(config.redaction_enabled, config.hash_for_correlation);
    error_common::set_message_filter(redact_text);

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| LoggerError::InvalidFilter(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init()
            .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_level(true),
            )
            .try_init()
            .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
    }
}
