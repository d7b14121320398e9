//! Persistence layer for the metadata document
//!
//! One `metadata.json` per base folder, pretty-printed with a 4-space indent.
//! Writers are assumed to be single: concurrent processes saving the same
//! base folder race, and the last `save` wins. There is no lock file.

use crate::error::StorageError;
use crate::metadata::{Entity, RootDocument, VersionRecord};
use crate::tree::path::entity_storage_name;
use crate::types::EntityKind;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the root document inside a base folder
pub const METADATA_FILE: &str = "metadata.json";

/// Serialize a value as UTF-8 JSON with a 4-space indent
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer).map_err(|e| {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to serialize metadata: {}", e),
        ))
    })?;
    out.push(b'\n');
    Ok(out)
}

/// Write bytes to `path` atomically (write to .tmp, then rename)
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::io("create directory", parent, e))?;
    }
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, bytes).map_err(|e| StorageError::io("write", &temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StorageError::io("replace", path, e)
    })
}

/// Loads and saves the root document of one base folder
#[derive(Debug, Clone)]
pub struct MetadataRepository {
    base_folder: PathBuf,
    tracking_dir: Option<PathBuf>,
}

impl MetadataRepository {
    pub fn new<P: AsRef<Path>>(base_folder: P) -> Self {
        Self {
            base_folder: base_folder.as_ref().to_path_buf(),
            tracking_dir: None,
        }
    }

    /// Enable best-effort backups into `<tracking_dir>/backup/<Kind>/`.
    pub fn with_tracking_dir(mut self, tracking_dir: Option<PathBuf>) -> Self {
        self.tracking_dir = tracking_dir;
        self
    }

    pub fn base_folder(&self) -> &Path {
        &self.base_folder
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.base_folder.join(METADATA_FILE)
    }

    /// Managed storage directory for one entity kind.
    pub fn files_dir(&self, kind: EntityKind) -> PathBuf {
        self.base_folder.join(kind.files_dir_name())
    }

    /// Create `metadata.json` (if absent) and the managed storage directories.
    pub fn init(&self) -> Result<RootDocument, StorageError> {
        for kind in EntityKind::ALL {
            let dir = self.files_dir(kind);
            fs::create_dir_all(&dir).map_err(|e| StorageError::io("create directory", &dir, e))?;
        }
        let doc = self.load()?;
        if !self.metadata_path().exists() {
            self.save(&doc)?;
            info!(path = %self.metadata_path().display(), "Created metadata document");
        }
        Ok(doc)
    }

    /// Load the root document. An absent file yields an empty document.
    pub fn load(&self) -> Result<RootDocument, StorageError> {
        let path = self.metadata_path();
        if !path.exists() {
            debug!(path = %path.display(), "No metadata document yet");
            return Ok(RootDocument::new());
        }

        let bytes = fs::read(&path).map_err(|e| StorageError::io("read", &path, e))?;
        let doc: RootDocument = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::CorruptDocument(format!("{}: {}", path.display(), e))
        })?;
        doc.validate()?;

        debug!(entities = doc.entity_count(), "Loaded metadata document");
        Ok(doc)
    }

    /// Persist the root document.
    pub fn save(&self, doc: &RootDocument) -> Result<(), StorageError> {
        let bytes = to_pretty_json(doc)?;
        write_atomic(&self.metadata_path(), &bytes)?;
        debug!(bytes = bytes.len(), "Saved metadata document");
        Ok(())
    }

    /// Where the backup of an entity goes, if a tracking directory is set.
    pub fn backup_path(&self, kind: EntityKind, name: &str) -> Option<PathBuf> {
        self.tracking_dir.as_ref().map(|dir| {
            dir.join("backup")
                .join(kind.label())
                .join(format!("{}.json", entity_storage_name(name)))
        })
    }

    /// Write a secondary copy of an entity to the tracking directory.
    ///
    /// Failures are logged and otherwise ignored. Returns whether a backup
    /// was written.
    pub fn backup_entity<R: VersionRecord>(&self, entity: &Entity<R>) -> bool {
        let Some(path) = self.backup_path(R::KIND, &entity.name) else {
            return false;
        };
        let result = to_pretty_json(entity).and_then(|bytes| write_atomic(&path, &bytes));
        match result {
            Ok(()) => {
                debug!(path = %path.display(), "Wrote backup");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Backup to tracking directory failed");
                false
            }
        }
    }
}
