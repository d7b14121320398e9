//! Versioned Entity Store
//!
//! Append-only CRUD over the entity/version model, operating on an owned
//! in-memory `RootDocument`. Persistence lives in `persistence`.

pub mod filter;
pub mod persistence;

pub use filter::ExperimentFilter;
pub use persistence::MetadataRepository;

use crate::error::StorageError;
use crate::metadata::{Entity, RootDocument, VersionRecord};
use crate::types::VersionId;
use tracing::{debug, info};

/// Store over one base folder's metadata document
#[derive(Debug, Clone, Default)]
pub struct VersionedEntityStore {
    doc: RootDocument,
}

impl VersionedEntityStore {
    pub fn new(doc: RootDocument) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &RootDocument {
        &self.doc
    }

    pub fn into_document(self) -> RootDocument {
        self.doc
    }

    /// Look up an entity by name. Surrounding whitespace is ignored, as on create.
    pub fn entity<R: VersionRecord>(&self, name: &str) -> Result<&Entity<R>, StorageError> {
        let name = name.trim();
        R::entities(&self.doc)
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| StorageError::EntityNotFound {
                kind: R::KIND,
                name: name.to_string(),
            })
    }

    pub fn contains<R: VersionRecord>(&self, name: &str) -> bool {
        let name = name.trim();
        R::entities(&self.doc).iter().any(|e| e.name == name)
    }

    /// Create an entity with `first` as version 1.
    pub fn create_entity<R: VersionRecord>(
        &mut self,
        name: &str,
        first: R,
    ) -> Result<VersionId, StorageError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::Validation(format!(
                "{} name cannot be empty",
                R::KIND
            )));
        }
        require_summary(&first)?;
        if self.contains::<R>(name) {
            return Err(StorageError::DuplicateName {
                kind: R::KIND,
                name: name.to_string(),
            });
        }

        R::entities_mut(&mut self.doc).push(Entity::new(name, first));
        info!(kind = %R::KIND, name, "Created entity");
        Ok(VersionId::FIRST)
    }

    /// Append `record` as the next version of an existing entity.
    pub fn append_version<R: VersionRecord>(
        &mut self,
        name: &str,
        record: R,
    ) -> Result<VersionId, StorageError> {
        require_summary(&record)?;
        let name = name.trim();
        let entity = R::entities_mut(&mut self.doc)
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| StorageError::EntityNotFound {
                kind: R::KIND,
                name: name.to_string(),
            })?;

        let next = entity.next_version_id();
        entity.versions.insert(next, record);
        info!(kind = %R::KIND, name, version = %next, "Appended version");
        Ok(next)
    }

    /// Record with the numerically highest version id.
    pub fn get_latest_version<R: VersionRecord>(&self, name: &str) -> Result<&R, StorageError> {
        self.latest_with_id::<R>(name).map(|(_, r)| r)
    }

    pub fn latest_version_id<R: VersionRecord>(&self, name: &str) -> Result<VersionId, StorageError> {
        self.latest_with_id::<R>(name).map(|(id, _)| id)
    }

    fn latest_with_id<R: VersionRecord>(&self, name: &str) -> Result<(VersionId, &R), StorageError> {
        let entity = self.entity::<R>(name)?;
        entity.latest().ok_or_else(|| StorageError::EntityNotFound {
            kind: R::KIND,
            name: name.to_string(),
        })
    }

    pub fn get_version<R: VersionRecord>(
        &self,
        name: &str,
        version: VersionId,
    ) -> Result<&R, StorageError> {
        self.entity::<R>(name)?
            .version(version)
            .ok_or_else(|| StorageError::VersionNotFound {
                kind: R::KIND,
                name: name.trim().to_string(),
                version,
            })
    }

    /// All versions of an entity, newest first.
    pub fn version_history<R: VersionRecord>(
        &self,
        name: &str,
    ) -> Result<Vec<(VersionId, &R)>, StorageError> {
        let entity = self.entity::<R>(name)?;
        Ok(entity.versions.iter().rev().map(|(id, r)| (*id, r)).collect())
    }

    /// Entities whose (entity, latest record) pair satisfies `predicate`,
    /// in document order.
    pub fn list_entities<R, F>(&self, predicate: F) -> Vec<&Entity<R>>
    where
        R: VersionRecord,
        F: Fn(&Entity<R>, &R) -> bool,
    {
        let matched: Vec<&Entity<R>> = R::entities(&self.doc)
            .iter()
            .filter(|e| e.latest().map_or(false, |(_, latest)| predicate(e, latest)))
            .collect();
        debug!(kind = %R::KIND, matched = matched.len(), "Listed entities");
        matched
    }
}

fn require_summary<R: VersionRecord>(record: &R) -> Result<(), StorageError> {
    if record.version_summary().trim().is_empty() {
        return Err(StorageError::Validation(
            "a version summary is required".to_string(),
        ));
    }
    Ok(())
}
