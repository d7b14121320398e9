//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, StorageError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::StorageError(StorageError::Validation(msg)) => format!("Invalid input: {}", msg),
        ApiError::StorageError(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

/// Process exit code for an error.
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::StorageError(StorageError::Validation(_))
        | ApiError::StorageError(StorageError::DuplicateName { .. })
        | ApiError::StorageError(StorageError::EntityNotFound { .. })
        | ApiError::StorageError(StorageError::VersionNotFound { .. })
        | ApiError::StorageError(StorageError::ItemNotFound(_)) => 2,
        ApiError::ConfigError(_) | ApiError::NoBaseFolder => 3,
        _ => 1,
    }
}
