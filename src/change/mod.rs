//! Change detection and edit sessions
//!
//! `reconcile` diffs a previous item forest against an edited one and decides
//! which stored files need a new revision. `session` drives one edit of one
//! entity from snapshot to commit.

pub mod reconcile;
pub mod session;

pub use reconcile::{plan, reconcile, PendingCopy, ReconcilePlan};
pub use session::{CommitOutcome, EditSession, UploadReport};
