//! labtrack: Versioned R&D Metadata Store
//!
//! Tracks projects, prototypes, experiments and users as named entities with
//! append-only version histories. Uploaded files are copied into managed
//! storage under a base folder; edits are detected by content hash and stored
//! as new timestamped revisions, never overwriting what earlier versions
//! reference.

pub mod api;
pub mod change;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod store;
pub mod tree;
pub mod types;
