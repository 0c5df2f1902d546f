//! # Error Types
//!
//! Structured error types for revest_core. Every fallible operation in the
//! engine and the store returns a [`CalcError`] that carries enough context
//! for the presentation layer to tell the user what to fix.
//!
//! ## Example
//!
//! ```rust
//! use revest_core::errors::{CalcError, CalcResult};
//!
//! fn validate_length(length_m: f64) -> CalcResult<()> {
//!     if !(length_m.is_finite() && length_m > 0.0) {
//!         return Err(CalcError::invalid_input(
//!             "length_m",
//!             length_m.to_string(),
//!             "Length must be a positive number",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_length(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for revest_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for estimation and store operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (non-positive, not finite, ...)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A project or room id does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Persisted state could not be decoded
    #[error("Persisted state is corrupt: {reason}")]
    PersistenceCorrupt { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// The state file is held by another live process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        CalcError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a PersistenceCorrupt error
    pub fn persistence_corrupt(reason: impl Into<String>) -> Self {
        CalcError::PersistenceCorrupt {
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this error is handled without surfacing a failure
    /// (corrupt state is replaced by defaults, a lock may be released later).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::FileLocked { .. } | CalcError::PersistenceCorrupt { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::NotFound { .. } => "NOT_FOUND",
            CalcError::PersistenceCorrupt { .. } => "PERSISTENCE_CORRUPT",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}
