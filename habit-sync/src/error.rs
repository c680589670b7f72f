//! Error types for the sync coordinator

use error_common::{codes, Categorized, ErrorCategory};
use shared_items::ItemError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Local cache error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl Categorized for SyncError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Database(_) | Self::Store(_) | Self::Network(_) => ErrorCategory::Persistence,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Item(err) => err.category(),
            Self::Serialization(_)
            | Self::PermissionDenied(_)
            | Self::Duplicate(_)
            | Self::InvalidOperation(_) => ErrorCategory::Validation,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => codes::persistence::CACHE_FAILED,
            Self::Store(_) => codes::persistence::STORE_FAILED,
            Self::Network(_) => codes::persistence::NETWORK_FAILED,
            Self::NotFound(_) => codes::not_found::ENTITY_NOT_FOUND,
            Self::Item(err) => err.code(),
            Self::Serialization(_) => codes::validation::INVALID_FORMAT,
            Self::PermissionDenied(_) => codes::validation::PERMISSION_DENIED,
            Self::Duplicate(_) => codes::validation::DUPLICATE_ENTITY,
            Self::InvalidOperation(_) => codes::validation::INVALID_INPUT,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_errors_keep_their_category() {
        let err: SyncError = ItemError::UnknownCollaborator("x@y.io".into()).into();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.code(), codes::not_found::COLLABORATOR_NOT_FOUND);
    }

    #[test]
    fn test_store_failures_are_persistence() {
        let err = SyncError::Network("offline".into());
        assert_eq!(err.category(), ErrorCategory::Persistence);
        assert_eq!(err.code(), "STORE_4003");
    }
}
