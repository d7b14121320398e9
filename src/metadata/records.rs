//! Version record types, one per entity kind

use crate::metadata::document::{Entity, RootDocument};
use crate::tree::node::{Item, Node};
use crate::types::{EntityKind, Timestamp};
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Behavior shared by every version record.
///
/// The record type fixes the entity kind, so store operations are generic
/// over `R: VersionRecord` instead of taking a kind argument.
pub trait VersionRecord: Clone + Debug + Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn description(&self) -> &str;
    fn uploaded_items(&self) -> &[Item];
    fn uploaded_items_mut(&mut self) -> &mut Vec<Item>;
    fn version_summary(&self) -> &str;
    fn timestamp(&self) -> Timestamp;

    /// Set the changelog summary and creation instant of a new version.
    fn stamp(&mut self, version_summary: String, timestamp: Timestamp);

    /// Compare every field except uploaded items, summary and timestamp.
    fn same_fields(&self, other: &Self) -> bool;

    fn entities(doc: &RootDocument) -> &Vec<Entity<Self>>;
    fn entities_mut(doc: &mut RootDocument) -> &mut Vec<Entity<Self>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectRecord {
    pub description: String,
    pub tree_structure: Vec<Node>,
    pub uploaded_items: Vec<Item>,
    pub version_summary: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrototypeRecord {
    pub description: String,
    pub uploaded_items: Vec<Item>,
    pub version_summary: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRecord {
    pub description: String,
    pub uploaded_items: Vec<Item>,
    pub version_summary: String,
    pub timestamp: Timestamp,
}

/// Experiment version. Cross-references are stored by name and are not
/// checked against existing entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentRecord {
    pub description: String,
    pub associated_project: String,
    pub associated_node: String,
    pub associated_users: BTreeSet<String>,
    pub associated_prototypes: BTreeSet<String>,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub uploaded_items: Vec<Item>,
    pub version_summary: String,
    pub timestamp: Timestamp,
}

impl Default for ProjectRecord {
    fn default() -> Self {
        Self {
            description: String::new(),
            tree_structure: Vec::new(),
            uploaded_items: Vec::new(),
            version_summary: String::new(),
            timestamp: Timestamp::now(),
        }
    }
}

impl Default for PrototypeRecord {
    fn default() -> Self {
        Self {
            description: String::new(),
            uploaded_items: Vec::new(),
            version_summary: String::new(),
            timestamp: Timestamp::now(),
        }
    }
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            description: String::new(),
            uploaded_items: Vec::new(),
            version_summary: String::new(),
            timestamp: Timestamp::now(),
        }
    }
}

impl Default for ExperimentRecord {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            description: String::new(),
            associated_project: String::new(),
            associated_node: String::new(),
            associated_users: BTreeSet::new(),
            associated_prototypes: BTreeSet::new(),
            category: String::new(),
            start_date: today,
            end_date: today,
            uploaded_items: Vec::new(),
            version_summary: String::new(),
            timestamp: Timestamp::now(),
        }
    }
}

impl VersionRecord for ProjectRecord {
    const KIND: EntityKind = EntityKind::Project;

    fn description(&self) -> &str {
        &self.description
    }
    fn uploaded_items(&self) -> &[Item] {
        &self.uploaded_items
    }
    fn uploaded_items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.uploaded_items
    }
    fn version_summary(&self) -> &str {
        &self.version_summary
    }
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
    fn stamp(&mut self, version_summary: String, timestamp: Timestamp) {
        self.version_summary = version_summary;
        self.timestamp = timestamp;
    }
    fn same_fields(&self, other: &Self) -> bool {
        self.description.trim() == other.description.trim()
            && self.tree_structure == other.tree_structure
    }
    fn entities(doc: &RootDocument) -> &Vec<Entity<Self>> {
        &doc.projects
    }
    fn entities_mut(doc: &mut RootDocument) -> &mut Vec<Entity<Self>> {
        &mut doc.projects
    }
}

impl VersionRecord for PrototypeRecord {
    const KIND: EntityKind = EntityKind::Prototype;

    fn description(&self) -> &str {
        &self.description
    }
    fn uploaded_items(&self) -> &[Item] {
        &self.uploaded_items
    }
    fn uploaded_items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.uploaded_items
    }
    fn version_summary(&self) -> &str {
        &self.version_summary
    }
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
    fn stamp(&mut self, version_summary: String, timestamp: Timestamp) {
        self.version_summary = version_summary;
        self.timestamp = timestamp;
    }
    fn same_fields(&self, other: &Self) -> bool {
        self.description.trim() == other.description.trim()
    }
    fn entities(doc: &RootDocument) -> &Vec<Entity<Self>> {
        &doc.prototypes
    }
    fn entities_mut(doc: &mut RootDocument) -> &mut Vec<Entity<Self>> {
        &mut doc.prototypes
    }
}

impl VersionRecord for UserRecord {
    const KIND: EntityKind = EntityKind::User;

    fn description(&self) -> &str {
        &self.description
    }
    fn uploaded_items(&self) -> &[Item] {
        &self.uploaded_items
    }
    fn uploaded_items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.uploaded_items
    }
    fn version_summary(&self) -> &str {
        &self.version_summary
    }
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
    fn stamp(&mut self, version_summary: String, timestamp: Timestamp) {
        self.version_summary = version_summary;
        self.timestamp = timestamp;
    }
    fn same_fields(&self, other: &Self) -> bool {
        self.description.trim() == other.description.trim()
    }
    fn entities(doc: &RootDocument) -> &Vec<Entity<Self>> {
        &doc.users
    }
    fn entities_mut(doc: &mut RootDocument) -> &mut Vec<Entity<Self>> {
        &mut doc.users
    }
}

impl VersionRecord for ExperimentRecord {
    const KIND: EntityKind = EntityKind::Experiment;

    fn description(&self) -> &str {
        &self.description
    }
    fn uploaded_items(&self) -> &[Item] {
        &self.uploaded_items
    }
    fn uploaded_items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.uploaded_items
    }
    fn version_summary(&self) -> &str {
        &self.version_summary
    }
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
    fn stamp(&mut self, version_summary: String, timestamp: Timestamp) {
        self.version_summary = version_summary;
        self.timestamp = timestamp;
    }
    fn same_fields(&self, other: &Self) -> bool {
        self.description.trim() == other.description.trim()
            && self.associated_project.trim() == other.associated_project.trim()
            && self.associated_node == other.associated_node
            && self.associated_users == other.associated_users
            && self.associated_prototypes == other.associated_prototypes
            && self.category.trim() == other.category.trim()
            && self.start_date == other.start_date
            && self.end_date == other.end_date
    }
    fn entities(doc: &RootDocument) -> &Vec<Entity<Self>> {
        &doc.experiments
    }
    fn entities_mut(doc: &mut RootDocument) -> &mut Vec<Entity<Self>> {
        &mut doc.experiments
    }
}
