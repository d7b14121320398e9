//! Entity version chains and the root metadata document

use crate::error::StorageError;
use crate::metadata::records::{
    ExperimentRecord, ProjectRecord, PrototypeRecord, UserRecord, VersionRecord,
};
use crate::types::{EntityKind, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A named entity and its append-only version history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(bound(serialize = "R: Serialize", deserialize = "R: Deserialize<'de>"))]
pub struct Entity<R> {
    pub name: String,
    pub versions: BTreeMap<VersionId, R>,
}

impl<R> Entity<R> {
    pub fn new(name: impl Into<String>, first: R) -> Self {
        let mut versions = BTreeMap::new();
        versions.insert(VersionId::FIRST, first);
        Self {
            name: name.into(),
            versions,
        }
    }

    /// Highest version id and its record.
    pub fn latest(&self) -> Option<(VersionId, &R)> {
        self.versions.iter().next_back().map(|(id, r)| (*id, r))
    }

    pub fn version(&self, id: VersionId) -> Option<&R> {
        self.versions.get(&id)
    }

    pub fn next_version_id(&self) -> VersionId {
        self.latest()
            .map(|(id, _)| id.next())
            .unwrap_or(VersionId::FIRST)
    }

    /// Check that ids run 1..=N without gaps.
    fn check_contiguous(&self) -> Result<(), String> {
        if self.versions.is_empty() {
            return Err(format!("'{}' has no versions", self.name));
        }
        for (expected, id) in (1u32..).zip(self.versions.keys()) {
            if id.get() != expected {
                return Err(format!(
                    "'{}' has version {} where {} was expected",
                    self.name, id, expected
                ));
            }
        }
        Ok(())
    }
}

/// Contents of `metadata.json` for one base folder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootDocument {
    #[serde(rename = "Projects")]
    pub projects: Vec<Entity<ProjectRecord>>,
    #[serde(rename = "Prototypes")]
    pub prototypes: Vec<Entity<PrototypeRecord>>,
    #[serde(rename = "Experiments")]
    pub experiments: Vec<Entity<ExperimentRecord>>,
    #[serde(rename = "Users")]
    pub users: Vec<Entity<UserRecord>>,
}

impl RootDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entity names of one kind, in document order.
    pub fn names(&self, kind: EntityKind) -> Vec<&str> {
        fn collect<R>(entities: &[Entity<R>]) -> Vec<&str> {
            entities.iter().map(|e| e.name.as_str()).collect()
        }
        match kind {
            EntityKind::Project => collect(&self.projects),
            EntityKind::Prototype => collect(&self.prototypes),
            EntityKind::Experiment => collect(&self.experiments),
            EntityKind::User => collect(&self.users),
        }
    }

    pub fn entity_count(&self) -> usize {
        self.projects.len() + self.prototypes.len() + self.experiments.len() + self.users.len()
    }

    /// Check document invariants: unique names per kind, contiguous version ids.
    pub fn validate(&self) -> Result<(), StorageError> {
        validate_kind::<ProjectRecord>(self)?;
        validate_kind::<PrototypeRecord>(self)?;
        validate_kind::<ExperimentRecord>(self)?;
        validate_kind::<UserRecord>(self)?;
        Ok(())
    }
}

fn validate_kind<R: VersionRecord>(doc: &RootDocument) -> Result<(), StorageError> {
    let mut seen = HashSet::new();
    for entity in R::entities(doc) {
        if !seen.insert(entity.name.as_str()) {
            return Err(StorageError::CorruptDocument(format!(
                "duplicate {} name '{}'",
                R::KIND,
                entity.name
            )));
        }
        entity.check_contiguous().map_err(|msg| {
            StorageError::CorruptDocument(format!("{} {}", R::KIND, msg))
        })?;
    }
    Ok(())
}
