//! # Progress Records
//!
//! The three-flag completion state for one (physician, task, evaluator, trait)
//! tuple. A record is created with all flags false the first time a trait
//! workflow is opened, advances monotonically as stages are submitted, and is
//! terminal once `review_completed` is set.
//!
//! The flags are intended to form a non-decreasing chain
//! (`review ⇒ machine ⇒ human`), but records produced by partial failures may
//! violate it; the reconciliation engine repairs such records rather than
//! rejecting them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::TraitKind;

/// Dedup key for progress records: at most one record is current per key.
///
/// Mirrors the backend's uniqueness constraint and partitions the local cache
/// so workflows for different traits never interfere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    pub physician_id: i64,
    pub task_id: i64,
    pub evaluator: String,
    #[serde(rename = "trait")]
    pub trait_kind: TraitKind,
}

impl ProgressKey {
    pub fn new(
        physician_id: i64,
        task_id: i64,
        evaluator: impl Into<String>,
        trait_kind: TraitKind,
    ) -> Self {
        Self {
            physician_id,
            task_id,
            evaluator: evaluator.into(),
            trait_kind,
        }
    }

    /// Stable string form used as the durable backup store key
    pub fn storage_key(&self) -> String {
        format!(
            "progress:{}:{}:{}:{}",
            self.physician_id, self.task_id, self.evaluator, self.trait_kind
        )
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "physician={} task={} evaluator={} trait={}",
            self.physician_id, self.task_id, self.evaluator, self.trait_kind
        )
    }
}

/// Per-trait completion state as reported by the backend or cached locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub physician_id: i64,
    pub task_id: i64,
    pub evaluator: String,
    #[serde(rename = "trait")]
    pub trait_kind: TraitKind,
    pub human_annotation_completed: bool,
    pub machine_evaluation_completed: bool,
    pub review_completed: bool,
    /// Last backend write, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// A record with no stage completed, as created the first time a trait
    /// workflow is opened
    pub fn fresh(key: &ProgressKey) -> Self {
        Self {
            physician_id: key.physician_id,
            task_id: key.task_id,
            evaluator: key.evaluator.clone(),
            trait_kind: key.trait_kind,
            human_annotation_completed: false,
            machine_evaluation_completed: false,
            review_completed: false,
            timestamp: None,
        }
    }

    pub fn key(&self) -> ProgressKey {
        ProgressKey {
            physician_id: self.physician_id,
            task_id: self.task_id,
            evaluator: self.evaluator.clone(),
            trait_kind: self.trait_kind,
        }
    }

    /// The three completion flags in workflow order
    pub fn flags(&self) -> [bool; 3] {
        [
            self.human_annotation_completed,
            self.machine_evaluation_completed,
            self.review_completed,
        ]
    }

    /// Flag equality, ignoring identity and timestamp
    pub fn same_flags(&self, other: &ProgressRecord) -> bool {
        self.flags() == other.flags()
    }

    /// Whether the flags satisfy the chain `review ⇒ machine ⇒ human`
    pub fn satisfies_chain(&self) -> bool {
        (!self.review_completed || self.machine_evaluation_completed)
            && (!self.machine_evaluation_completed || self.human_annotation_completed)
    }

    /// A completed record accepts no further transitions
    pub fn is_terminal(&self) -> bool {
        self.review_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ProgressKey {
        ProgressKey::new(1003892073, 17, "evaluator_a", TraitKind::Openness)
    }

    #[test]
    fn test_fresh_record_has_no_progress() {
        let record = ProgressRecord::fresh(&key());
        assert_eq!(record.flags(), [false, false, false]);
        assert!(record.satisfies_chain());
        assert!(!record.is_terminal());
    }

    #[test]
    fn test_key_round_trip() {
        let record = ProgressRecord::fresh(&key());
        assert_eq!(record.key(), key());
    }

    #[test]
    fn test_chain_violation_detected() {
        let mut record = ProgressRecord::fresh(&key());
        record.review_completed = true;
        assert!(!record.satisfies_chain());
        assert!(record.is_terminal());

        record.human_annotation_completed = true;
        record.machine_evaluation_completed = true;
        assert!(record.satisfies_chain());
    }

    #[test]
    fn test_serde_field_names_match_backend() {
        let mut record = ProgressRecord::fresh(&key());
        record.human_annotation_completed = true;
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["trait"], "openness");
        assert_eq!(json["human_annotation_completed"], true);
        assert_eq!(json["machine_evaluation_completed"], false);
        assert!(json.get("timestamp").is_none());

        let parsed: ProgressRecord = serde_json::from_value(json).unwrap();
        assert!(parsed.same_flags(&record));
    }

    #[test]
    fn test_storage_key_is_stable() {
        assert_eq!(
            key().storage_key(),
            "progress:1003892073:17:evaluator_a:openness"
        );
    }
}
