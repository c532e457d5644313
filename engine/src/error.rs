//! Application error handling
//!
//! One error type for every fallible engine operation. Each variant maps
//! to a stable code that hosts show or match on.

use calorie_tracker_shared::validation::ValidationError;
use calorie_tracker_shared::{CatalogError, ErrorDetail, ErrorResponse, StorageError};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl TrackerError {
    /// Validation failure on one field, prefixed with its display label
    pub fn invalid(field: &str, message: impl AsRef<str>) -> Self {
        TrackerError::Validation(ValidationError::new(field, message.as_ref()).user_message())
    }

    pub fn code(&self) -> &'static str {
        match self {
            TrackerError::Validation(_) => "VALIDATION_ERROR",
            TrackerError::NotFound(_) => "NOT_FOUND",
            TrackerError::Conflict(_) => "CONFLICT",
            TrackerError::Storage(_) => "STORAGE_ERROR",
            TrackerError::Serialization(_) => "SERIALIZATION_ERROR",
            TrackerError::Catalog(_) => "CATALOG_ERROR",
            TrackerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Payload handed to hosts; internal details are logged, not exposed
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            TrackerError::Internal(err) => {
                error!("Internal error: {:?}", err);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        }
    }
}

/// Shorthand for boundary checks returning `Result<(), String>`
pub(crate) fn check(field: &str, result: Result<(), String>) -> TrackerResult<()> {
    result.map_err(|message| TrackerError::invalid(field, message))
}

/// Result type alias for engine operations
pub type TrackerResult<T> = Result<T, TrackerError>;
