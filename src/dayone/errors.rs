//! Day One import error types

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while reading an export or converting its entries
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Entry is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid creation date: {0}")]
    InvalidDate(String),

    #[error("File already exists: {0}")]
    DuplicateNote(String),

    #[error("Invalid export document: {0}")]
    InvalidDocument(String),

    #[error("No Day One export found: {0}")]
    ExportNotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
