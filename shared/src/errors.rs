//! Error types for the Calorie Tracker

use thiserror::Error;

/// Failures while reading a food/activity catalog resource
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// Key-value storage backend errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}
