//! Experiment listing filter

use crate::metadata::ExperimentRecord;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Multi-field experiment filter.
///
/// Every field is optional; an absent (or empty) field places no constraint.
/// Membership fields match when the experiment shares at least one name with
/// the filter set. The date range is inclusive: an experiment matches when it
/// starts on or after `start_date` and ends on or before `end_date`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentFilter {
    pub project: Option<String>,
    pub node: Option<String>,
    pub users: BTreeSet<String>,
    pub prototypes: BTreeSet<String>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ExperimentFilter {
    pub fn is_empty(&self) -> bool {
        *self == ExperimentFilter::default()
    }

    pub fn matches(&self, record: &ExperimentRecord) -> bool {
        if let Some(project) = &self.project {
            if *project != record.associated_project {
                return false;
            }
        }
        if let Some(node) = &self.node {
            if *node != record.associated_node {
                return false;
            }
        }
        if !self.prototypes.is_empty()
            && self.prototypes.is_disjoint(&record.associated_prototypes)
        {
            return false;
        }
        if !self.users.is_empty() && self.users.is_disjoint(&record.associated_users) {
            return false;
        }
        if let Some(category) = &self.category {
            if *category != record.category {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if record.start_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.end_date > end {
                return false;
            }
        }
        true
    }
}
