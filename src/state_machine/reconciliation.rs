//! # Progress Reconciliation
//!
//! Merges a progress record reported by the backend with one cached locally
//! into a single authoritative record. The merge never loses progress either
//! side has observed, repairs records that violate the completion chain, and
//! reports when the local side carried information the backend did not have
//! so the caller can surface a corrective prompt instead of silently
//! preferring one side.

use tracing::{debug, warn};

use crate::models::ProgressRecord;

/// Result of merging remote and local progress
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The merged record, guaranteed to satisfy the completion chain
    pub record: ProgressRecord,
    /// True when the merged record is more advanced than what the backend
    /// reported (including a backend that had no record at all)
    pub diverged: bool,
}

/// Merge logic for backend-reported vs locally cached progress
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Merge the two sides of a progress observation.
    ///
    /// For each completion flag the merged record takes the logical OR of the
    /// inputs, then monotonicity is repaired so `review ⇒ machine ⇒ human`
    /// holds even if either input violated it. Identity fields come from the
    /// remote side when present, timestamps take the newer of the two.
    ///
    /// The merge is commutative and idempotent on the completion flags.
    /// Returns `None` only when neither side exists.
    pub fn merge(
        remote: Option<&ProgressRecord>,
        local: Option<&ProgressRecord>,
    ) -> Option<Reconciled> {
        let (base, other) = match (remote, local) {
            (Some(r), Some(l)) => (r, Some(l)),
            (Some(r), None) => (r, None),
            (None, Some(l)) => (l, None),
            (None, None) => return None,
        };

        let mut record = base.clone();
        if let Some(other) = other {
            record.human_annotation_completed |= other.human_annotation_completed;
            record.machine_evaluation_completed |= other.machine_evaluation_completed;
            record.review_completed |= other.review_completed;
            record.timestamp = match (record.timestamp, other.timestamp) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
        Self::repair_chain(&mut record);

        // Divergence is measured against what the backend knows: an absent
        // remote record counts as all-false.
        let diverged = match remote {
            Some(remote_record) => !record.same_flags(remote_record),
            None => record.flags() != [false, false, false],
        };
        if diverged {
            warn!(
                key = %record.key(),
                remote_present = remote.is_some(),
                merged_flags = ?record.flags(),
                "Local progress is ahead of backend, flagging divergence"
            );
        } else {
            debug!(key = %record.key(), flags = ?record.flags(), "Progress reconciled");
        }

        Some(Reconciled { record, diverged })
    }

    /// Force the completion chain invariant: a later flag implies all
    /// earlier ones
    fn repair_chain(record: &mut ProgressRecord) {
        if record.review_completed {
            record.machine_evaluation_completed = true;
        }
        if record.machine_evaluation_completed {
            record.human_annotation_completed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TraitKind;
    use crate::models::ProgressKey;
    use crate::state_machine::states::{derive_stage, WorkflowStage};

    fn record(human: bool, machine: bool, review: bool) -> ProgressRecord {
        let key = ProgressKey::new(9, 3, "eva", TraitKind::Conscientiousness);
        let mut record = ProgressRecord::fresh(&key);
        record.human_annotation_completed = human;
        record.machine_evaluation_completed = machine;
        record.review_completed = review;
        record
    }

    #[test]
    fn test_merge_of_nothing_is_nothing() {
        assert!(ReconciliationEngine::merge(None, None).is_none());
    }

    #[test]
    fn test_single_side_is_returned_and_repaired() {
        let remote_only = ReconciliationEngine::merge(Some(&record(true, false, false)), None)
            .expect("remote side present");
        assert_eq!(remote_only.record.flags(), [true, false, false]);
        assert!(!remote_only.diverged);

        // A remote record violating the chain is repaired, which counts as
        // divergence from what the backend reported.
        let repaired = ReconciliationEngine::merge(Some(&record(false, true, false)), None)
            .expect("remote side present");
        assert_eq!(repaired.record.flags(), [true, true, false]);
        assert!(repaired.diverged);

        // Local-only progress is by definition ahead of the backend.
        let local_only = ReconciliationEngine::merge(None, Some(&record(true, false, false)))
            .expect("local side present");
        assert_eq!(local_only.record.flags(), [true, false, false]);
        assert!(local_only.diverged);

        let local_fresh = ReconciliationEngine::merge(None, Some(&record(false, false, false)))
            .expect("local side present");
        assert!(!local_fresh.diverged);
    }

    #[test]
    fn test_pointwise_or() {
        let merged = ReconciliationEngine::merge(
            Some(&record(false, false, false)),
            Some(&record(true, false, false)),
        )
        .unwrap();
        assert_eq!(merged.record.flags(), [true, false, false]);
        assert_eq!(derive_stage(&merged.record), WorkflowStage::MachineEvaluation);
        assert!(merged.diverged);
    }

    #[test]
    fn test_chain_repair_promotes_earlier_flags() {
        let merged = ReconciliationEngine::merge(
            Some(&record(false, false, true)),
            Some(&record(false, false, false)),
        )
        .unwrap();
        assert_eq!(merged.record.flags(), [true, true, true]);
        assert_eq!(derive_stage(&merged.record), WorkflowStage::Completed);
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = record(true, false, false);
        let b = record(false, true, false);
        let ab = ReconciliationEngine::merge(Some(&a), Some(&b)).unwrap();
        let ba = ReconciliationEngine::merge(Some(&b), Some(&a)).unwrap();
        assert!(ab.record.same_flags(&ba.record));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = record(true, false, false);
        let b = record(false, true, false);
        let once = ReconciliationEngine::merge(Some(&a), Some(&b)).unwrap();
        let twice = ReconciliationEngine::merge(Some(&once.record), Some(&b)).unwrap();
        assert!(once.record.same_flags(&twice.record));
    }

    #[test]
    fn test_remote_ahead_is_not_divergence() {
        let merged = ReconciliationEngine::merge(
            Some(&record(true, true, false)),
            Some(&record(true, false, false)),
        )
        .unwrap();
        assert_eq!(merged.record.flags(), [true, true, false]);
        assert!(!merged.diverged);
    }

    #[test]
    fn test_newer_timestamp_wins() {
        use chrono::{Duration, Utc};
        let older = Utc::now() - Duration::minutes(10);
        let newer = Utc::now();

        let mut a = record(true, false, false);
        a.timestamp = Some(older);
        let mut b = record(false, true, false);
        b.timestamp = Some(newer);

        let merged = ReconciliationEngine::merge(Some(&a), Some(&b)).unwrap();
        assert_eq!(merged.record.timestamp, Some(newer));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_record() -> impl Strategy<Value = ProgressRecord> {
            (any::<bool>(), any::<bool>(), any::<bool>())
                .prop_map(|(h, m, r)| record(h, m, r))
        }

        proptest! {
            #[test]
            fn merged_record_always_satisfies_chain(a in arb_record(), b in arb_record()) {
                let merged = ReconciliationEngine::merge(Some(&a), Some(&b)).unwrap();
                prop_assert!(merged.record.satisfies_chain());
            }

            #[test]
            fn merge_never_loses_progress(a in arb_record(), b in arb_record()) {
                let merged = ReconciliationEngine::merge(Some(&a), Some(&b)).unwrap();
                for (i, merged_flag) in merged.record.flags().iter().enumerate() {
                    prop_assert!(*merged_flag >= a.flags()[i] || *merged_flag >= b.flags()[i]);
                    prop_assert!(*merged_flag >= (a.flags()[i] | b.flags()[i]));
                }
            }

            #[test]
            fn merge_commutes(a in arb_record(), b in arb_record()) {
                let ab = ReconciliationEngine::merge(Some(&a), Some(&b)).unwrap();
                let ba = ReconciliationEngine::merge(Some(&b), Some(&a)).unwrap();
                prop_assert!(ab.record.same_flags(&ba.record));
            }

            #[test]
            fn merge_is_idempotent_on_flags(a in arb_record(), b in arb_record()) {
                let once = ReconciliationEngine::merge(Some(&a), Some(&b)).unwrap();
                let twice = ReconciliationEngine::merge(Some(&once.record), Some(&b)).unwrap();
                prop_assert!(once.record.same_flags(&twice.record));
            }
        }
    }
}
