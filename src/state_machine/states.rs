//! # Workflow Stages
//!
//! Stage definitions for the three-step trait workflow, plus the stage
//! deriver. Exactly one stage is active per trait at a time, and it is a
//! deterministic function of the trait's progress record; nothing else in the
//! crate computes stage from progress.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ProgressRecord;

/// Current step of a trait's workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Evaluator provides their own assessment
    HumanAnnotation,
    /// Evaluator judges each model output
    MachineEvaluation,
    /// Evaluator reviews prior work and finalizes
    ReviewAndModify,
    /// All three steps are done; the trait accepts no further transitions
    Completed,
}

impl WorkflowStage {
    /// Check if this is the terminal stage (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Zero-based position in the step sequence, for progress displays
    pub fn step_index(&self) -> usize {
        match self {
            Self::HumanAnnotation => 0,
            Self::MachineEvaluation => 1,
            Self::ReviewAndModify => 2,
            Self::Completed => 3,
        }
    }
}

impl Default for WorkflowStage {
    fn default() -> Self {
        Self::HumanAnnotation
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HumanAnnotation => write!(f, "human_annotation"),
            Self::MachineEvaluation => write!(f, "machine_evaluation"),
            Self::ReviewAndModify => write!(f, "review_and_modify"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for WorkflowStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human_annotation" => Ok(Self::HumanAnnotation),
            "machine_evaluation" => Ok(Self::MachineEvaluation),
            "review_and_modify" => Ok(Self::ReviewAndModify),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid workflow stage: {s}")),
        }
    }
}

/// Derive the active stage from a progress record.
///
/// Total and pure; checked in priority order so records that violate the
/// chain invariant still map to the most advanced stage their flags claim.
pub fn derive_stage(record: &ProgressRecord) -> WorkflowStage {
    if record.review_completed {
        WorkflowStage::Completed
    } else if record.machine_evaluation_completed {
        WorkflowStage::ReviewAndModify
    } else if record.human_annotation_completed {
        WorkflowStage::MachineEvaluation
    } else {
        WorkflowStage::HumanAnnotation
    }
}
