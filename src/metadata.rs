//! Metadata document model
//!
//! Explicit record types per entity kind, the generic `Entity` version chain,
//! and the `RootDocument` persisted as `metadata.json`.

pub mod document;
pub mod records;

pub use document::{Entity, RootDocument};
pub use records::{
    ExperimentRecord, ProjectRecord, PrototypeRecord, UserRecord, VersionRecord,
};
