use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use crate::codes;

/// Error taxonomy shared by every crate in the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Entity, document or collaborator is absent
    NotFound,
    /// Malformed input (bad dates, non-array lists, forbidden roles)
    Validation,
    /// Document store or local cache failure
    Persistence,
    /// A domain invariant could not be upheld
    InvariantViolation,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Persistence => "persistence",
            Self::InvariantViolation => "invariant_violation",
            Self::Internal => "internal",
        }
    }

    /// Default code reported for the category when the error has no more specific one
    pub fn default_code(&self) -> &'static str {
        match self {
            Self::NotFound => codes::not_found::ENTITY_NOT_FOUND,
            Self::Validation => codes::validation::INVALID_INPUT,
            Self::Persistence => codes::persistence::STORE_FAILED,
            Self::InvariantViolation => codes::invariant::OWNER_INVARIANT,
            Self::Internal => codes::internal::INTERNAL,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every crate-level error enum so callers can map it onto the taxonomy
pub trait Categorized {
    fn category(&self) -> ErrorCategory;

    fn code(&self) -> &'static str {
        self.category().default_code()
    }
}

/// Catch-all error for glue code that has no crate-specific enum
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Categorized for EngineError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Persistence(_) => ErrorCategory::Persistence,
            Self::Other(_) => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Validation(err.to_string())
    }
}

/// Result type alias for glue operations
pub type Result<T> = std::result::Result<T, EngineError>;

static MESSAGE_FILTER: OnceLock<fn(&str) -> String> = OnceLock::new();

/// Install the filter applied to error text before [`log_error`] writes it.
///
/// Only the first call takes effect; returns whether this call installed it.
pub fn set_message_filter(filter: fn(&str) -> String) -> bool {
    MESSAGE_FILTER.set(filter).is_ok()
}

/// Error text as [`log_error`] writes it
pub fn filtered_message(text: &str) -> String {
    match MESSAGE_FILTER.get() {
        Some(filter) => filter(text),
        None => text.to_string(),
    }
}

/// Log an error with its category and code attached
pub fn log_error<E>(context: &str, error: &E)
where
    E: Categorized + fmt::Display,
{
    tracing::error!(
        context = context,
        category = %error.category(),
        code = error.code(),
        error = %filtered_message(&error.to_string()),
        "operation failed"
    );
}
