//! Item forest reconciliation
//!
//! Compares the items of the version an edit started from with the items the
//! user ended up with. Files that were opened for editing are compared by
//! content digest; a differing temp copy becomes a new timestamped revision
//! stored next to the original. Originals are never overwritten.

use crate::error::StorageError;
use crate::tree::hasher::hash_file;
use crate::tree::node::{FileItem, Item};
use crate::tree::path::timestamped_name;
use chrono::{Local, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A temp copy that must be stored under a new managed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCopy {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of reconciliation before anything is written to storage
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    /// Item forest for the new version
    pub items: Vec<Item>,
    /// Whether the forest differs from the previous one
    pub changed: bool,
    /// Edited revisions to copy into managed storage
    pub copies: Vec<PendingCopy>,
}

impl ReconcilePlan {
    /// Copy every edited revision into managed storage.
    pub fn apply(&self) -> Result<(), StorageError> {
        for copy in &self.copies {
            if let Some(parent) = copy.to.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| StorageError::io("create directory", parent, e))?;
            }
            fs::copy(&copy.from, &copy.to)
                .map_err(|e| StorageError::io("store edited revision", &copy.to, e))?;
            debug!(to = %copy.to.display(), "Stored edited revision");
        }
        Ok(())
    }
}

/// Decide the new item forest without touching managed storage.
///
/// `edits` maps a stored file path to the temp copy the user edited.
pub fn plan(
    previous: &[Item],
    current: &[Item],
    edits: &HashMap<PathBuf, PathBuf>,
) -> ReconcilePlan {
    plan_at(previous, current, edits, Local::now().naive_local())
}

/// `plan` with an explicit instant for revision names.
pub fn plan_at(
    previous: &[Item],
    current: &[Item],
    edits: &HashMap<PathBuf, PathBuf>,
    at: NaiveDateTime,
) -> ReconcilePlan {
    let mut copies = Vec::new();
    let (items, changed) = plan_level(previous, current, edits, at, &mut copies);
    debug!(changed, revisions = copies.len(), "Reconciled item forest");
    ReconcilePlan {
        items,
        changed,
        copies,
    }
}

/// Plan, then store edited revisions. Returns the new forest and whether it changed.
pub fn reconcile(
    previous: &[Item],
    current: &[Item],
    edits: &HashMap<PathBuf, PathBuf>,
) -> Result<(Vec<Item>, bool), StorageError> {
    let plan = plan(previous, current, edits);
    plan.apply()?;
    Ok((plan.items, plan.changed))
}

fn plan_level(
    previous: &[Item],
    current: &[Item],
    edits: &HashMap<PathBuf, PathBuf>,
    at: NaiveDateTime,
    copies: &mut Vec<PendingCopy>,
) -> (Vec<Item>, bool) {
    let lookup: HashMap<&str, &Item> = previous.iter().map(|i| (i.name(), i)).collect();
    let mut changed = false;
    let mut items = Vec::with_capacity(current.len());

    for item in current {
        match item {
            Item::Folder(folder) => {
                let previous_children: &[Item] = match lookup.get(folder.name.as_str()) {
                    Some(Item::Folder(prev)) => &prev.children,
                    _ => {
                        changed = true;
                        &[]
                    }
                };
                let (children, children_changed) =
                    plan_level(previous_children, &folder.children, edits, at, copies);
                changed |= children_changed;
                items.push(Item::folder(folder.name.clone(), children));
            }
            Item::File(file) => {
                let previous_path = match lookup.get(file.name.as_str()) {
                    Some(Item::File(prev)) => &prev.path,
                    _ => {
                        changed = true;
                        items.push(item.clone());
                        continue;
                    }
                };
                // Same name, different stored file: a re-upload after removal.
                if *previous_path != file.path {
                    changed = true;
                }
                let revision = edits
                    .get(&file.path)
                    .and_then(|temp| edited_revision(file, temp, at));
                match revision {
                    Some((revised, copy)) => {
                        changed = true;
                        copies.push(copy);
                        items.push(Item::File(revised));
                    }
                    None => items.push(item.clone()),
                }
            }
        }
    }

    let current_names: HashSet<&str> = current.iter().map(Item::name).collect();
    if previous.iter().any(|p| !current_names.contains(p.name())) {
        changed = true;
    }

    (items, changed)
}

/// New revision for an edited file, or `None` when the content is unchanged.
fn edited_revision(
    file: &FileItem,
    temp: &Path,
    at: NaiveDateTime,
) -> Option<(FileItem, PendingCopy)> {
    let edited = match hash_file(temp) {
        Ok(digest) => digest,
        Err(e) => {
            warn!(file = %file.name, temp = %temp.display(), error = %e, "Temp copy unreadable, edit ignored");
            return None;
        }
    };
    match hash_file(&file.path) {
        Ok(original) if original == edited => return None,
        Ok(_) => {}
        Err(e) => {
            warn!(file = %file.name, error = %e, "Stored original unreadable, keeping edit as a new revision");
        }
    }

    let name = timestamped_name(&file.name, at);
    let path = file.path.with_file_name(&name);
    Some((
        FileItem {
            name,
            path: path.clone(),
        },
        PendingCopy {
            from: temp.to_path_buf(),
            to: path,
        },
    ))
}
