//! Events that drive trait workflow transitions.
//!
//! Each event names the flag it sets on the progress record; the resulting
//! stage is always re-derived from the merged record rather than taken from
//! the event itself, so out-of-order arrivals cannot regress a trait.

use serde::{Deserialize, Serialize};

use super::states::WorkflowStage;
use crate::models::{ProgressKey, ProgressRecord};

/// A stage-completion event for one trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StageEvent {
    /// Evaluator submitted their own annotation
    HumanAnnotationSubmitted,
    /// Evaluator submitted judgements for all model outputs
    MachineEvaluationSubmitted,
    /// Evaluator finalized the review stage
    ReviewCompleted,
    /// Recovery override requesting a specific stage
    ForceStage(WorkflowStage),
}

impl StageEvent {
    /// String form for logging and the diagnostic event log
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::HumanAnnotationSubmitted => "human_annotation_submitted",
            Self::MachineEvaluationSubmitted => "machine_evaluation_submitted",
            Self::ReviewCompleted => "review_completed",
            Self::ForceStage(_) => "force_stage",
        }
    }

    /// Synthesize the local progress record this event implies, used when the
    /// backend cannot acknowledge the write or for the force-stage override.
    ///
    /// Submission events set exactly their own flag on top of `base`; the
    /// override reconstructs the full flag set consistent with the requested
    /// stage (earlier stages true, later stages false).
    pub fn synthesize_record(&self, key: &ProgressKey, base: &ProgressRecord) -> ProgressRecord {
        let mut record = base.clone();
        match self {
            Self::HumanAnnotationSubmitted => record.human_annotation_completed = true,
            Self::MachineEvaluationSubmitted => record.machine_evaluation_completed = true,
            Self::ReviewCompleted => record.review_completed = true,
            Self::ForceStage(stage) => {
                let index = stage.step_index();
                record = ProgressRecord::fresh(key);
                record.human_annotation_completed = index >= 1;
                record.machine_evaluation_completed = index >= 2;
                record.review_completed = index >= 3;
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TraitKind;

    fn key() -> ProgressKey {
        ProgressKey::new(5, 2, "eva", TraitKind::Extraversion)
    }

    #[test]
    fn test_submission_events_set_only_their_flag() {
        let base = ProgressRecord::fresh(&key());

        let human = StageEvent::HumanAnnotationSubmitted.synthesize_record(&key(), &base);
        assert_eq!(human.flags(), [true, false, false]);

        let machine = StageEvent::MachineEvaluationSubmitted.synthesize_record(&key(), &human);
        assert_eq!(machine.flags(), [true, true, false]);

        let review = StageEvent::ReviewCompleted.synthesize_record(&key(), &machine);
        assert_eq!(review.flags(), [true, true, true]);
    }

    #[test]
    fn test_force_stage_reconstructs_consistent_flags() {
        let base = ProgressRecord::fresh(&key());

        let to_review = StageEvent::ForceStage(WorkflowStage::ReviewAndModify)
            .synthesize_record(&key(), &base);
        assert_eq!(to_review.flags(), [true, true, false]);
        assert!(to_review.satisfies_chain());

        let to_start =
            StageEvent::ForceStage(WorkflowStage::HumanAnnotation).synthesize_record(&key(), &base);
        assert_eq!(to_start.flags(), [false, false, false]);

        let to_completed =
            StageEvent::ForceStage(WorkflowStage::Completed).synthesize_record(&key(), &base);
        assert_eq!(to_completed.flags(), [true, true, true]);
    }

    #[test]
    fn test_event_type_strings() {
        assert_eq!(
            StageEvent::HumanAnnotationSubmitted.event_type(),
            "human_annotation_submitted"
        );
        assert_eq!(
            StageEvent::ForceStage(WorkflowStage::Completed).event_type(),
            "force_stage"
        );
    }
}
