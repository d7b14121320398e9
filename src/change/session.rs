//! Edit sessions
//!
//! An `EditSession` snapshots one version of an entity (or starts from an
//! empty draft for a new entity), collects uploads, removals, scalar edits
//! and content edits made through temp copies, and on commit decides whether
//! a new version is warranted.
//!
//! Uploads are copied into `<base>/<Kind> Files/<entity>/` as they happen.
//! Files already referenced by stored versions are never overwritten.

use crate::change::reconcile::plan_at;
use crate::error::StorageError;
use crate::metadata::VersionRecord;
use crate::store::VersionedEntityStore;
use crate::tree::hasher::hash_file;
use crate::tree::node::{children_at_mut, find_item, remove_item, Item};
use crate::tree::path::{entity_storage_name, file_name_of, timestamped_name};
use crate::tree::scanner::FolderScanner;
use crate::types::{Timestamp, VersionId};
use chrono::Local;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Result of an upload call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Names appended to the working items
    pub added: Vec<String>,
    /// Names skipped because the same (name, managed path) pair already exists
    pub skipped: Vec<String>,
}

/// Result of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing differs from the snapshot; nothing was written
    NoChange,
    /// A version was written
    Written(VersionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    New,
    Existing { opened: VersionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Editing,
    Committed,
    Cancelled,
}

/// Edit of one entity, from snapshot to commit or cancel
#[derive(Debug)]
pub struct EditSession<R: VersionRecord> {
    name: String,
    files_dir: PathBuf,
    target: Target,
    baseline: Option<R>,
    snapshot: Vec<Item>,
    draft: R,
    temp_copies: HashMap<PathBuf, PathBuf>,
    state: SessionState,
}

impl<R: VersionRecord> EditSession<R> {
    /// Start an edit of an existing entity from `version` (latest when `None`).
    pub fn open(
        store: &VersionedEntityStore,
        base_folder: &Path,
        name: &str,
        version: Option<VersionId>,
    ) -> Result<Self, StorageError> {
        let name = name.trim();
        let opened = match version {
            Some(id) => id,
            None => store.latest_version_id::<R>(name)?,
        };
        let baseline = store.get_version::<R>(name, opened)?.clone();
        debug!(kind = %R::KIND, name, version = %opened, "Opened edit session");

        Ok(Self {
            name: name.to_string(),
            files_dir: entity_files_dir::<R>(base_folder, name),
            target: Target::Existing { opened },
            snapshot: baseline.uploaded_items().to_vec(),
            draft: baseline.clone(),
            baseline: Some(baseline),
            temp_copies: HashMap::new(),
            state: SessionState::Editing,
        })
    }

    /// Start a session for a new entity; committing it creates version 1.
    pub fn create(base_folder: &Path, name: &str, draft: R) -> Result<Self, StorageError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::Validation(format!(
                "{} name cannot be empty",
                R::KIND
            )));
        }
        Ok(Self {
            name: name.to_string(),
            files_dir: entity_files_dir::<R>(base_folder, name),
            target: Target::New,
            baseline: None,
            snapshot: Vec::new(),
            draft,
            temp_copies: HashMap::new(),
            state: SessionState::Editing,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version the session was opened from, `None` for a new entity.
    pub fn opened_version(&self) -> Option<VersionId> {
        match self.target {
            Target::New => None,
            Target::Existing { opened } => Some(opened),
        }
    }

    /// Managed directory uploads are copied into.
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Editing
    }

    pub fn draft(&self) -> &R {
        &self.draft
    }

    /// Scalar fields of the next version.
    pub fn draft_mut(&mut self) -> Result<&mut R, StorageError> {
        self.ensure_open()?;
        Ok(&mut self.draft)
    }

    /// Working item forest.
    pub fn items(&self) -> &[Item] {
        self.draft.uploaded_items()
    }

    /// Temp copies handed out by `open_for_edit`, keyed by stored path.
    pub fn temp_copies(&self) -> &HashMap<PathBuf, PathBuf> {
        &self.temp_copies
    }

    /// Upload files at the top level of the working items.
    pub fn upload_files<P: AsRef<Path>>(
        &mut self,
        sources: &[P],
    ) -> Result<UploadReport, StorageError> {
        self.upload_files_into::<&str, P>(&[], sources)
    }

    /// Upload files into the folder addressed by `folder_path`.
    pub fn upload_files_into<S: AsRef<str>, P: AsRef<Path>>(
        &mut self,
        folder_path: &[S],
        sources: &[P],
    ) -> Result<UploadReport, StorageError> {
        self.ensure_open()?;
        for source in sources {
            let source = source.as_ref();
            if !source.is_file() {
                return Err(StorageError::InvalidPath(format!(
                    "{:?} is not a file",
                    source
                )));
            }
        }

        let dest_dir = self.level_dir(folder_path);
        let level = level_mut(&mut self.draft, folder_path)?;
        let mut report = UploadReport::default();

        for source in sources {
            let source = source.as_ref();
            let name = file_name_of(source)?;
            let dest = dest_dir.join(&name);
            if level
                .iter()
                .any(|i| i.name() == name && i.path() == Some(dest.as_path()))
            {
                debug!(file = %name, "Skipping duplicate upload");
                report.skipped.push(name);
                continue;
            }
            let stored = store_file(source, &dest_dir, &name)?;
            level.push(Item::file(name.clone(), stored));
            report.added.push(name);
        }

        info!(
            added = report.added.len(),
            skipped = report.skipped.len(),
            "Uploaded files"
        );
        Ok(report)
    }

    /// Upload a folder recursively at the top level.
    pub fn upload_folder(&mut self, source: &Path) -> Result<UploadReport, StorageError> {
        self.upload_folder_with::<&str>(&[], source, &FolderScanner::default())
    }

    /// Upload only the image files of a folder at the top level.
    pub fn upload_image_folder(&mut self, source: &Path) -> Result<UploadReport, StorageError> {
        self.upload_folder_with::<&str>(&[], source, &FolderScanner::images_only())
    }

    /// Upload a folder recursively into the folder addressed by `folder_path`.
    pub fn upload_folder_into<S: AsRef<str>>(
        &mut self,
        folder_path: &[S],
        source: &Path,
    ) -> Result<UploadReport, StorageError> {
        self.upload_folder_with(folder_path, source, &FolderScanner::default())
    }

    fn upload_folder_with<S: AsRef<str>>(
        &mut self,
        folder_path: &[S],
        source: &Path,
        scanner: &FolderScanner,
    ) -> Result<UploadReport, StorageError> {
        self.ensure_open()?;
        if !source.is_dir() {
            return Err(StorageError::InvalidPath(format!(
                "{:?} is not a directory",
                source
            )));
        }

        let name = file_name_of(source)?;
        let dest_dir = self.level_dir(folder_path);
        let level = level_mut(&mut self.draft, folder_path)?;
        let mut report = UploadReport::default();

        if level.iter().any(|i| i.is_folder() && i.name() == name) {
            debug!(folder = %name, "Skipping duplicate folder upload");
            report.skipped.push(name);
            return Ok(report);
        }

        let mut dest = dest_dir.join(&name);
        if dest.exists() {
            dest = dest_dir.join(timestamped_name(&name, Local::now().naive_local()));
        }
        let item = scanner.scan(source, &dest)?;
        level.push(item);
        report.added.push(name);
        Ok(report)
    }

    /// Drop an item (and its subtree) from the working items.
    ///
    /// Stored files stay on disk; earlier versions still reference them.
    pub fn remove_item<S: AsRef<str>>(&mut self, item_path: &[S]) -> Result<Item, StorageError> {
        self.ensure_open()?;
        let removed = remove_item(self.draft.uploaded_items_mut(), item_path)
            .ok_or_else(|| StorageError::ItemNotFound(display_path(item_path)))?;

        let mut removed_files = Vec::new();
        collect_paths(&removed, &mut removed_files);
        for path in removed_files {
            if let Some(temp) = self.temp_copies.remove(&path) {
                discard_temp(&temp);
            }
        }
        debug!(item = %display_path(item_path), "Removed item from working copy");
        Ok(removed)
    }

    /// Hand out a temp copy of a stored file for editing.
    ///
    /// The copy is compared against the stored original on commit. Opening
    /// the same file twice returns the same temp copy.
    pub fn open_for_edit<S: AsRef<str>>(&mut self, item_path: &[S]) -> Result<PathBuf, StorageError> {
        self.ensure_open()?;
        let stored = match find_item(self.draft.uploaded_items(), item_path) {
            Some(Item::File(file)) => file.path.clone(),
            _ => return Err(StorageError::ItemNotFound(display_path(item_path))),
        };
        if let Some(existing) = self.temp_copies.get(&stored) {
            return Ok(existing.clone());
        }

        let suffix = stored
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix("labtrack-edit-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| StorageError::io("create temp copy of", &stored, e))?;
        let temp_path = temp
            .into_temp_path()
            .keep()
            .map_err(|e| StorageError::io("keep temp copy of", &stored, e.error))?;
        if let Err(e) = fs::copy(&stored, &temp_path) {
            discard_temp(&temp_path);
            return Err(StorageError::io("copy", &stored, e));
        }

        debug!(stored = %stored.display(), temp = %temp_path.display(), "Opened temp copy for editing");
        self.temp_copies.insert(stored, temp_path.clone());
        Ok(temp_path)
    }

    /// Reconcile the working copy against the snapshot and write a version
    /// if anything changed.
    ///
    /// On `NoChange` or an error the session stays open. A blank summary is
    /// rejected before any file is copied.
    pub fn commit(
        &mut self,
        store: &mut VersionedEntityStore,
        summary: &str,
    ) -> Result<CommitOutcome, StorageError> {
        let outcome = self.write_version(store, summary)?;
        if let CommitOutcome::Written(_) = outcome {
            self.finish();
        }
        Ok(outcome)
    }

    /// Append the next version to `store` without closing the session.
    ///
    /// Temp copies stay in place, so a caller whose save fails can roll the
    /// store back and commit again. Call `finish` once the version is durable.
    #[instrument(skip(self, store, summary), fields(kind = %R::KIND, name = %self.name))]
    pub(crate) fn write_version(
        &mut self,
        store: &mut VersionedEntityStore,
        summary: &str,
    ) -> Result<CommitOutcome, StorageError> {
        self.ensure_open()?;
        let start = Instant::now();
        let now = Timestamp::now();

        let plan = plan_at(
            &self.snapshot,
            self.draft.uploaded_items(),
            &self.temp_copies,
            now.as_naive(),
        );
        let fields_changed = match &self.baseline {
            Some(baseline) => !baseline.same_fields(&self.draft),
            None => true,
        };
        if !plan.changed && !fields_changed {
            info!("No changes detected, nothing written");
            return Ok(CommitOutcome::NoChange);
        }

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(StorageError::Validation(
                "a version summary is required".to_string(),
            ));
        }
        match self.target {
            Target::New if store.contains::<R>(&self.name) => {
                return Err(StorageError::DuplicateName {
                    kind: R::KIND,
                    name: self.name.clone(),
                });
            }
            Target::Existing { .. } if !store.contains::<R>(&self.name) => {
                return Err(StorageError::EntityNotFound {
                    kind: R::KIND,
                    name: self.name.clone(),
                });
            }
            _ => {}
        }

        plan.apply()?;
        let revisions = plan.copies.len();
        let mut record = self.draft.clone();
        *record.uploaded_items_mut() = plan.items;
        record.stamp(summary.to_string(), now);

        let version = match self.target {
            Target::New => store.create_entity(&self.name, record)?,
            Target::Existing { .. } => store.append_version(&self.name, record)?,
        };

        info!(
            version = %version,
            items_changed = plan.changed,
            fields_changed,
            revisions,
            duration_ms = start.elapsed().as_millis(),
            "Committed version"
        );
        Ok(CommitOutcome::Written(version))
    }

    /// Close the session after its version was written and saved.
    pub(crate) fn finish(&mut self) {
        self.discard_temp_copies();
        self.state = SessionState::Committed;
        debug!(kind = %R::KIND, name = %self.name, "Closed edit session");
    }

    /// Close the session without writing anything.
    pub fn cancel(&mut self) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.discard_temp_copies();
        self.state = SessionState::Cancelled;
        debug!(kind = %R::KIND, name = %self.name, "Cancelled edit session");
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.state == SessionState::Editing {
            Ok(())
        } else {
            Err(StorageError::SessionClosed)
        }
    }

    fn level_dir<S: AsRef<str>>(&self, folder_path: &[S]) -> PathBuf {
        folder_path
            .iter()
            .fold(self.files_dir.clone(), |dir, part| dir.join(part.as_ref()))
    }

    fn discard_temp_copies(&mut self) {
        for (_, temp) in self.temp_copies.drain() {
            discard_temp(&temp);
        }
    }
}

impl<R: VersionRecord> Drop for EditSession<R> {
    fn drop(&mut self) {
        self.discard_temp_copies();
    }
}

fn entity_files_dir<R: VersionRecord>(base_folder: &Path, name: &str) -> PathBuf {
    base_folder
        .join(R::KIND.files_dir_name())
        .join(entity_storage_name(name))
}

fn level_mut<'a, R: VersionRecord, S: AsRef<str>>(
    draft: &'a mut R,
    folder_path: &[S],
) -> Result<&'a mut Vec<Item>, StorageError> {
    children_at_mut(draft.uploaded_items_mut(), folder_path)
        .ok_or_else(|| StorageError::ItemNotFound(display_path(folder_path)))
}

/// Copy `source` into `dest_dir` as `name`, without overwriting stored files.
///
/// When `name` is taken by a file with the same content it is reused; with
/// different content the copy gets a timestamped name.
fn store_file(source: &Path, dest_dir: &Path, name: &str) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dest_dir).map_err(|e| StorageError::io("create directory", dest_dir, e))?;
    let mut dest = dest_dir.join(name);
    if dest.exists() {
        if hash_file(&dest)? == hash_file(source)? {
            return Ok(dest);
        }
        dest = dest_dir.join(timestamped_name(name, Local::now().naive_local()));
    }
    fs::copy(source, &dest).map_err(|e| StorageError::io("copy", source, e))?;
    Ok(dest)
}

fn collect_paths(item: &Item, out: &mut Vec<PathBuf>) {
    match item {
        Item::File(file) => out.push(file.path.clone()),
        Item::Folder(folder) => {
            for child in &folder.children {
                collect_paths(child, out);
            }
        }
    }
}

fn discard_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(temp = %path.display(), error = %e, "Failed to remove temp copy");
    }
}

fn display_path<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("/")
}
