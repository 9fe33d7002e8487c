//! Adapter trait for the annotation backend.
//!
//! Every operation may fail with a network error or a non-success status;
//! callers treat both as "backend unreachable" and take the degraded path,
//! so the error variants exist for logging and diagnostics rather than for
//! branching.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    HumanAnnotation, MachineEvaluation, ModelAnnotation, ProgressKey, ProgressRecord, TraitHistory,
};

/// Errors raised at the backend boundary
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Transport-level failure: connection refused, timeout, DNS
    #[error("network error: {message}")]
    Network { message: String },

    /// The backend answered with a non-success status
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected shape
    #[error("response serialization error: {message}")]
    Serialization { message: String },

    /// Client-side configuration problem (e.g. malformed base URL)
    #[error("adapter configuration error: {message}")]
    Configuration { message: String },
}

impl AdapterError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// Backend collaborator for one evaluator session.
///
/// Implementations must be safe to share across the five trait workflows.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Authoritative progress for one trait
    async fn fetch_progress(&self, key: &ProgressKey) -> Result<ProgressRecord, AdapterError>;

    /// Submit the evaluator's own annotation for the human-annotation stage
    async fn submit_human_annotation(
        &self,
        key: &ProgressKey,
        annotation: &HumanAnnotation,
    ) -> Result<(), AdapterError>;

    /// Model outputs to be judged in the machine-evaluation stage
    async fn fetch_machine_annotations(
        &self,
        key: &ProgressKey,
    ) -> Result<Vec<ModelAnnotation>, AdapterError>;

    /// Submit the evaluator's judgements of the model outputs, in bulk
    async fn submit_machine_evaluations(
        &self,
        key: &ProgressKey,
        evaluations: &[MachineEvaluation],
    ) -> Result<(), AdapterError>;

    /// Previously submitted work for the review stage
    async fn fetch_history(&self, key: &ProgressKey) -> Result<TraitHistory, AdapterError>;

    /// Mark the review stage finished, with an optional closing comment
    async fn complete_review(
        &self,
        key: &ProgressKey,
        comment: Option<&str>,
    ) -> Result<(), AdapterError>;
}
