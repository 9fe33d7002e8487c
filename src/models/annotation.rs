//! # Annotation Models
//!
//! Payload types for the three workflow stages: the evaluator's own annotation,
//! the model outputs under review, and the evaluator's judgement of each model
//! output. Closed vocabularies (score bands, evidence levels, ratings) are
//! enums that serialize to the backend's exact strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::TraitKind;
use crate::error::{PhyreviewError, Result};
use crate::models::progress::ProgressKey;

/// Score band a model may assign to a trait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreBand {
    #[serde(rename = "No Evidence")]
    NoEvidence,
    Low,
    #[serde(rename = "Low to Moderate")]
    LowToModerate,
    Moderate,
    #[serde(rename = "Moderate to High")]
    ModerateToHigh,
    High,
}

/// Consistency / sufficiency grading of trait evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceLevel {
    Low,
    Moderate,
    High,
}

/// Evaluator verdict on a single model output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Positive,
    Negative,
    Neutral,
}

/// The evaluator's own assessment of one trait, submitted in the
/// human-annotation stage and amendable during review (same identity,
/// new values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanAnnotation {
    pub physician_id: i64,
    pub evaluator: String,
    pub task_id: i64,
    #[serde(rename = "trait")]
    pub trait_kind: TraitKind,
    /// 1-5
    pub score: u8,
    /// 1-3
    pub consistency: u8,
    /// 1-3
    pub sufficiency: u8,
    pub evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HumanAnnotation {
    pub fn new(key: &ProgressKey, score: u8, consistency: u8, sufficiency: u8, evidence: impl Into<String>) -> Self {
        Self {
            physician_id: key.physician_id,
            evaluator: key.evaluator.clone(),
            task_id: key.task_id,
            trait_kind: key.trait_kind,
            score,
            consistency,
            sufficiency,
            evidence: evidence.into(),
            timestamp: None,
        }
    }

    /// Range-check the graded fields before submission
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.score) {
            return Err(PhyreviewError::Validation(format!(
                "score must be 1-5, got {}",
                self.score
            )));
        }
        if !(1..=3).contains(&self.consistency) {
            return Err(PhyreviewError::Validation(format!(
                "consistency must be 1-3, got {}",
                self.consistency
            )));
        }
        if !(1..=3).contains(&self.sufficiency) {
            return Err(PhyreviewError::Validation(format!(
                "sufficiency must be 1-3, got {}",
                self.sufficiency
            )));
        }
        Ok(())
    }
}

/// A model's output for one trait, fetched in bulk for the
/// machine-evaluation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAnnotation {
    pub id: i64,
    pub physician_id: i64,
    pub model_name: String,
    #[serde(rename = "trait")]
    pub trait_kind: TraitKind,
    pub score: ScoreBand,
    pub consistency: EvidenceLevel,
    pub sufficiency: EvidenceLevel,
    pub evidence: String,
}

/// The evaluator's judgement of one model output; one per
/// (model output, evaluator) pair, submitted in bulk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEvaluation {
    pub model_annotation_id: i64,
    pub physician_id: i64,
    pub task_id: i64,
    pub evaluator: String,
    #[serde(rename = "trait")]
    pub trait_kind: TraitKind,
    pub model_name: String,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MachineEvaluation {
    pub fn for_annotation(
        key: &ProgressKey,
        annotation: &ModelAnnotation,
        rating: Rating,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            model_annotation_id: annotation.id,
            physician_id: key.physician_id,
            task_id: key.task_id,
            evaluator: key.evaluator.clone(),
            trait_kind: key.trait_kind,
            model_name: annotation.model_name.clone(),
            rating,
            comment: comment.into(),
            timestamp: None,
        }
    }
}

/// Previously submitted work for one trait, loaded for the review stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_annotation: Option<HumanAnnotation>,
    #[serde(default)]
    pub machine_evaluations: Vec<MachineEvaluation>,
}
