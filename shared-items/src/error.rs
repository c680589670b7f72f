use error_common::{codes, Categorized, ErrorCategory};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("Invalid time frame: {0}")]
    InvalidTimeFrame(String),

    #[error("Account is not a collaborator: {0}")]
    UnknownCollaborator(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Categorized for ItemError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownCollaborator(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::Validation,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::UnknownCollaborator(_) => codes::not_found::COLLABORATOR_NOT_FOUND,
            Self::InvalidDate(_) | Self::InvalidTimeFrame(_) => codes::validation::INVALID_FORMAT,
            _ => codes::validation::INVALID_INPUT,
        }
    }
}

pub type Result<T> = std::result::Result<T, ItemError>;
