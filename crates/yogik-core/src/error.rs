//! Core error types for yogik-core.
//!
//! The failure surface is narrow: the app is offline and single-user, so
//! most problems degrade to "stay in the current state". What remains is
//! modelled with thiserror so callers can still report it.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for yogik-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence-related errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Session configuration rejected at start
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Sequence document could not be imported
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Store is locked by another writer
    #[error("Store is locked")]
    Locked,

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Invalid session configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Every phase the session would run has zero duration
    #[error("Every phase has zero duration; nothing to run")]
    AllPhasesZero,

    /// A kriya stage cannot produce any breath
    #[error("Stage {index} has no breath-in or breath-out time")]
    EmptyStage { index: usize },

    /// Collection that must not be empty is empty
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Sequence import errors.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Document is not valid JSON for the exchange format
    #[error("Malformed sequence document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Document version is newer than this build understands
    #[error("Unsupported sequence document version {0}")]
    UnsupportedVersion(u32),

    /// Document parsed but carries no poses
    #[error("Sequence '{0}' has no poses")]
    NoPoses(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_wraps_into_core_error() {
        let err: CoreError = StoreError::DataDir("permission denied".into()).into();
        assert!(matches!(err, CoreError::Store(StoreError::DataDir(_))));
        assert_eq!(
            err.to_string(),
            "Storage error: Data directory unavailable: permission denied"
        );
    }

    #[test]
    fn validation_and_import_errors_convert() {
        let err: CoreError = ValidationError::EmptyStage { index: 2 }.into();
        assert_eq!(
            err.to_string(),
            "Validation error: Stage 2 has no breath-in or breath-out time"
        );

        let err: CoreError = ImportError::UnsupportedVersion(3).into();
        assert!(matches!(err, CoreError::Import(ImportError::UnsupportedVersion(3))));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err: CoreError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
