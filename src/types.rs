//! Core types for the labtrack metadata store.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Digest: 256-bit content hash value
pub type Digest = [u8; 32];

/// Kind of a tracked entity.
///
/// Each kind owns one array in the root document and one managed storage
/// directory under the base folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum EntityKind {
    Project,
    Prototype,
    Experiment,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Project,
        EntityKind::Prototype,
        EntityKind::Experiment,
        EntityKind::User,
    ];

    /// Singular label, e.g. "Project".
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Project => "Project",
            EntityKind::Prototype => "Prototype",
            EntityKind::Experiment => "Experiment",
            EntityKind::User => "User",
        }
    }

    /// Key of this kind's array in `metadata.json`.
    pub fn document_key(&self) -> &'static str {
        match self {
            EntityKind::Project => "Projects",
            EntityKind::Prototype => "Prototypes",
            EntityKind::Experiment => "Experiments",
            EntityKind::User => "Users",
        }
    }

    /// Managed storage directory name, relative to the base folder.
    pub fn files_dir_name(&self) -> &'static str {
        match self {
            EntityKind::Project => "Project Files",
            EntityKind::Prototype => "Prototype Files",
            EntityKind::Experiment => "Experiment Files",
            EntityKind::User => "User Files",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "project" | "projects" => Ok(EntityKind::Project),
            "prototype" | "prototypes" => Ok(EntityKind::Prototype),
            "experiment" | "experiments" => Ok(EntityKind::Experiment),
            "user" | "users" => Ok(EntityKind::User),
            other => Err(format!("Unknown entity kind: {}", other)),
        }
    }
}

/// Version number within one entity's history.
///
/// Serialized as a JSON object key (`"1"`, `"2"`, ...). Ordering is numeric,
/// so `10` sorts after `9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u32);

impl VersionId {
    pub const FIRST: VersionId = VersionId(1);

    pub fn new(value: u32) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(VersionId(value))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> VersionId {
        VersionId(self.0 + 1)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid version id: {}", s))?;
        VersionId::new(value).ok_or_else(|| "Version ids start at 1".to_string())
    }
}

/// Record creation instant, stored as `YYYY-MM-DD-HH-MM-SS` local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub const FORMAT: &'static str = "%Y-%m-%d-%H-%M-%S";

    pub fn now() -> Self {
        Timestamp(Local::now().naive_local())
    }

    pub fn from_naive(value: NaiveDateTime) -> Self {
        Timestamp(value)
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s, Self::FORMAT).map(Timestamp)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|e| {
            serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e))
        })
    }
}
