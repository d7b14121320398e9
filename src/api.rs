//! Tracker API
//!
//! Facade over one base folder: loads the document, hands out edit sessions,
//! and persists (plus backs up) every written version. Front ends call this
//! instead of touching the store and repository directly.

use crate::change::{CommitOutcome, EditSession};
use crate::config::TrackerConfig;
use crate::error::{ApiError, StorageError};
use crate::metadata::{Entity, ExperimentRecord, VersionRecord};
use crate::store::{ExperimentFilter, MetadataRepository, VersionedEntityStore};
use crate::tree::path::canonicalize_path;
use crate::types::VersionId;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Tracker service for one base folder
#[derive(Debug)]
pub struct TrackerApi {
    repository: MetadataRepository,
    store: VersionedEntityStore,
}

impl TrackerApi {
    /// Open an existing (or not yet initialized) base folder.
    pub fn open(base_folder: &Path, tracking_dir: Option<PathBuf>) -> Result<Self, ApiError> {
        let base_folder = canonicalize_path(base_folder)?;
        let repository = MetadataRepository::new(&base_folder).with_tracking_dir(tracking_dir);
        let store = VersionedEntityStore::new(repository.load()?);
        Ok(Self { repository, store })
    }

    /// Create the base folder layout if missing, then open it.
    pub fn init(base_folder: &Path, tracking_dir: Option<PathBuf>) -> Result<Self, ApiError> {
        std::fs::create_dir_all(base_folder)
            .map_err(|e| StorageError::io("create directory", base_folder, e))?;
        let base_folder = canonicalize_path(base_folder)?;
        let repository = MetadataRepository::new(&base_folder).with_tracking_dir(tracking_dir);
        let store = VersionedEntityStore::new(repository.init()?);
        info!(base = %base_folder.display(), "Initialized base folder");
        Ok(Self { repository, store })
    }

    /// Open the base folder named by `config`.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ApiError> {
        Self::open(config.require_base_folder()?, config.tracking_dir.clone())
    }

    pub fn base_folder(&self) -> &Path {
        self.repository.base_folder()
    }

    pub fn repository(&self) -> &MetadataRepository {
        &self.repository
    }

    pub fn store(&self) -> &VersionedEntityStore {
        &self.store
    }

    /// Discard in-memory state and re-read `metadata.json`.
    pub fn reload(&mut self) -> Result<(), ApiError> {
        self.store = VersionedEntityStore::new(self.repository.load()?);
        Ok(())
    }

    /// Session for a new entity; committing it creates version 1.
    pub fn create_session<R: VersionRecord>(
        &self,
        name: &str,
        draft: R,
    ) -> Result<EditSession<R>, ApiError> {
        if self.store.contains::<R>(name.trim()) {
            return Err(StorageError::DuplicateName {
                kind: R::KIND,
                name: name.trim().to_string(),
            }
            .into());
        }
        Ok(EditSession::create(self.base_folder(), name, draft)?)
    }

    /// Session editing `version` (latest when `None`) of an existing entity.
    pub fn open_session<R: VersionRecord>(
        &self,
        name: &str,
        version: Option<VersionId>,
    ) -> Result<EditSession<R>, ApiError> {
        Ok(EditSession::open(&self.store, self.base_folder(), name, version)?)
    }

    /// Commit a session, then save the document and back up the entity.
    ///
    /// If the save fails the in-memory store is rolled back to its state
    /// before the commit and the session stays open, temp copies included,
    /// so the commit can be retried.
    #[instrument(skip(self, session, summary), fields(kind = %R::KIND, name = %session.name()))]
    pub fn commit<R: VersionRecord>(
        &mut self,
        session: &mut EditSession<R>,
        summary: &str,
    ) -> Result<CommitOutcome, ApiError> {
        let before = self.store.clone();
        let outcome = session.write_version(&mut self.store, summary)?;
        if let CommitOutcome::Written(_) = outcome {
            if let Err(e) = self.repository.save(self.store.document()) {
                self.store = before;
                return Err(e.into());
            }
            session.finish();
            let entity = self.store.entity::<R>(session.name())?;
            self.repository.backup_entity(entity);
        }
        Ok(outcome)
    }

    /// Entities of one kind, in document order.
    pub fn list<R: VersionRecord>(&self) -> Vec<&Entity<R>> {
        self.store.list_entities::<R, _>(|_, _| true)
    }

    /// Experiments whose latest version matches `filter`.
    pub fn experiments(&self, filter: &ExperimentFilter) -> Vec<&Entity<ExperimentRecord>> {
        self.store
            .list_entities::<ExperimentRecord, _>(|_, latest| filter.matches(latest))
    }

    /// Versions of an entity, newest first.
    pub fn history<R: VersionRecord>(&self, name: &str) -> Result<Vec<(VersionId, &R)>, ApiError> {
        Ok(self.store.version_history::<R>(name)?)
    }

    /// One version of an entity (latest when `None`).
    pub fn show<R: VersionRecord>(
        &self,
        name: &str,
        version: Option<VersionId>,
    ) -> Result<(VersionId, &R), ApiError> {
        let id = match version {
            Some(id) => id,
            None => self.store.latest_version_id::<R>(name)?,
        };
        Ok((id, self.store.get_version::<R>(name, id)?))
    }
}
