use error_common::{codes, Categorized, ErrorCategory};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration source not found: {0}")]
    SourceNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl Categorized for ConfigError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceNotFound(_) => ErrorCategory::NotFound,
            Self::ParseError(_) | Self::ValidationError(_) => ErrorCategory::Validation,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => codes::not_found::ENTITY_NOT_FOUND,
            Self::ParseError(_) => codes::validation::INVALID_FORMAT,
            Self::ValidationError(_) => codes::validation::INVALID_INPUT,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
