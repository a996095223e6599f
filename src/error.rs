//! Custom error types for Bookshelf
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for Bookshelf operations
#[derive(Error, Debug)]
pub enum BookshelfError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Input violates a field constraint
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Failure on the persisted catalog
    #[error("Storage error: {0}")]
    Storage(String),

    /// Snapshot creation or rotation failed
    #[error("Backup error: {0}")]
    Backup(String),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl BookshelfError {
    /// Create a "not found" error for books
    pub fn book_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Book",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a backup error
    pub fn is_backup(&self) -> bool {
        matches!(self, Self::Backup(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for BookshelfError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BookshelfError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<rusqlite::Error> for BookshelfError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<csv::Error> for BookshelfError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

/// Result type alias for Bookshelf operations
pub type BookshelfResult<T> = Result<T, BookshelfError>;
