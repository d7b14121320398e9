//! Error types for the labtrack metadata store.

use crate::types::{EntityKind, VersionId};
use std::path::Path;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("{kind} '{name}' not found")]
    EntityNotFound { kind: EntityKind, name: String },

    #[error("Version {version} of {kind} '{name}' not found")]
    VersionNotFound {
        kind: EntityKind,
        name: String,
        version: VersionId,
    },

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Corrupt metadata document: {0}")]
    CorruptDocument(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Edit session is already closed")]
    SessionClosed,

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Wrap an I/O error with the action and path that failed, keeping its kind.
    pub fn io(action: &str, path: &Path, err: std::io::Error) -> Self {
        StorageError::IoError(std::io::Error::new(
            err.kind(),
            format!("Failed to {} {:?}: {}", action, path, err),
        ))
    }
}

/// Facade-level errors (configuration, logging, front ends)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No base folder selected. Pass --base or set base_folder in the config file.")]
    NoBaseFolder,
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
