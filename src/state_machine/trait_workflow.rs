//! # Trait Workflow
//!
//! One trait's state machine. Holds the current progress record and its
//! derived stage, advances on stage-completion events, and keeps itself
//! consistent with the backend through the persistence adapter and the
//! reconciliation engine.
//!
//! Failure semantics: completions are best-effort durable. When the backend
//! is unreachable the workflow synthesizes the progress locally, flags the
//! record as degraded, and keeps moving so the evaluator is never blocked by
//! a transient outage. Stage is always re-derived from the merged record; an
//! out-of-order backend response merges against the cache's record at the
//! moment it arrives, so it can only add information.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::events::StageEvent;
use super::reconciliation::{Reconciled, ReconciliationEngine};
use super::states::{derive_stage, WorkflowStage};
use crate::cache::ProgressCache;
use crate::client::{AdapterError, PersistenceAdapter};
use crate::constants::TraitKind;
use crate::error::{PhyreviewError, Result};
use crate::events::{WorkflowEvent, WorkflowEventPublisher};
use crate::models::{
    HumanAnnotation, MachineEvaluation, ModelAnnotation, ProgressKey, ProgressRecord, TraitHistory,
};

/// State machine for a single trait's three-stage workflow
pub struct TraitWorkflow {
    key: ProgressKey,
    record: ProgressRecord,
    /// Derived from `record` on every change; cached only for cheap reads
    stage: WorkflowStage,
    /// True while the record holds locally synthesized progress the backend
    /// has not acknowledged
    degraded: bool,
    adapter: Arc<dyn PersistenceAdapter>,
    cache: Arc<ProgressCache>,
    publisher: WorkflowEventPublisher,
}

impl TraitWorkflow {
    pub fn new(
        key: ProgressKey,
        adapter: Arc<dyn PersistenceAdapter>,
        cache: Arc<ProgressCache>,
        publisher: WorkflowEventPublisher,
    ) -> Self {
        let record = ProgressRecord::fresh(&key);
        let stage = derive_stage(&record);
        Self {
            key,
            record,
            stage,
            degraded: false,
            adapter,
            cache,
            publisher,
        }
    }

    pub fn trait_kind(&self) -> TraitKind {
        self.key.trait_kind
    }

    pub fn key(&self) -> &ProgressKey {
        &self.key
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Whether the record holds unacknowledged local progress
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Fetch remote progress, reconcile with the cache, and derive the
    /// starting stage. A backend failure degrades to cached (or fresh)
    /// progress rather than blocking.
    pub async fn initialize(&mut self) -> WorkflowStage {
        let remote = match self.adapter.fetch_progress(&self.key).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Progress fetch failed, falling back to cached progress"
                );
                None
            }
        };
        let local = self.cache.get(&self.key);
        let reconciled = ReconciliationEngine::merge(remote.as_ref(), local.as_ref())
            .unwrap_or_else(|| Reconciled {
                record: ProgressRecord::fresh(&self.key),
                diverged: false,
            });
        if remote.is_some() && !reconciled.diverged {
            // The backend covers everything known locally.
            self.degraded = false;
        }
        self.apply(reconciled, "initialize", true)
    }

    /// Submit the evaluator's own annotation and advance past the
    /// human-annotation stage. No-op once the trait is completed.
    pub async fn complete_human_annotation(
        &mut self,
        annotation: &HumanAnnotation,
    ) -> Result<WorkflowStage> {
        if self.stage.is_terminal() {
            debug!(key = %self.key, "Trait already completed, ignoring annotation submission");
            return Ok(self.stage);
        }
        annotation.validate()?;

        let submitted = self
            .adapter
            .submit_human_annotation(&self.key, annotation)
            .await;
        Ok(self
            .finish_completion(StageEvent::HumanAnnotationSubmitted, submitted)
            .await)
    }

    /// Submit judgements for all model outputs and advance past the
    /// machine-evaluation stage. Rejects an empty batch; no-op once the
    /// trait is completed.
    pub async fn complete_machine_evaluation(
        &mut self,
        evaluations: &[MachineEvaluation],
    ) -> Result<WorkflowStage> {
        if self.stage.is_terminal() {
            debug!(key = %self.key, "Trait already completed, ignoring evaluation submission");
            return Ok(self.stage);
        }
        if evaluations.is_empty() {
            return Err(PhyreviewError::Validation(
                "machine evaluation batch is empty".to_string(),
            ));
        }

        let submitted = self
            .adapter
            .submit_machine_evaluations(&self.key, evaluations)
            .await;
        Ok(self
            .finish_completion(StageEvent::MachineEvaluationSubmitted, submitted)
            .await)
    }

    /// Finalize the review stage. Terminal: once the trait is completed any
    /// later call is a no-op, not an error.
    pub async fn complete_review(&mut self, comment: Option<&str>) -> Result<WorkflowStage> {
        if self.stage.is_terminal() {
            debug!(key = %self.key, "Trait already completed, ignoring review completion");
            return Ok(self.stage);
        }

        let submitted = self.adapter.complete_review(&self.key, comment).await;
        Ok(self
            .finish_completion(StageEvent::ReviewCompleted, submitted)
            .await)
    }

    /// Recovery override: reconstruct a synthetic record consistent with the
    /// requested stage and run it through the normal merge/derive path.
    /// Merging with the current record makes the override advance-only; a
    /// completed trait is never regressed.
    pub fn force_stage(&mut self, stage: WorkflowStage) -> WorkflowStage {
        let event = StageEvent::ForceStage(stage);
        let synthetic = event.synthesize_record(&self.key, &self.record);
        let current = self
            .cache
            .get(&self.key)
            .unwrap_or_else(|| self.record.clone());
        let reconciled = ReconciliationEngine::merge(Some(&current), Some(&synthetic))
            .expect("both sides present");
        info!(key = %self.key, requested = %stage, "Applying stage override");
        self.apply(reconciled, event.event_type(), false)
    }

    /// Model outputs for the machine-evaluation stage
    pub async fn fetch_machine_annotations(&self) -> Result<Vec<ModelAnnotation>> {
        Ok(self.adapter.fetch_machine_annotations(&self.key).await?)
    }

    /// Previously submitted work for the review stage
    pub async fn fetch_history(&self) -> Result<TraitHistory> {
        Ok(self.adapter.fetch_history(&self.key).await?)
    }

    /// Post-submission bookkeeping shared by the three completion
    /// operations
    async fn finish_completion(
        &mut self,
        event: StageEvent,
        submitted: std::result::Result<(), AdapterError>,
    ) -> WorkflowStage {
        match submitted {
            Ok(()) => match self.adapter.fetch_progress(&self.key).await {
                Ok(remote) => {
                    // Merge against the cache's record as of now, not a
                    // call-time snapshot, and fold in the flag whose write
                    // the backend just acknowledged so a stale read cannot
                    // drop it.
                    let local_now = self
                        .cache
                        .get(&self.key)
                        .unwrap_or_else(|| self.record.clone());
                    let synthesized = event.synthesize_record(&self.key, &local_now);
                    let reconciled =
                        ReconciliationEngine::merge(Some(&remote), Some(&synthesized))
                            .expect("both sides present");
                    self.degraded = false;
                    self.apply(reconciled, event.event_type(), true)
                }
                Err(e) => {
                    warn!(
                        key = %self.key,
                        error = %e,
                        "Progress refetch failed after submission, synthesizing locally"
                    );
                    self.degrade(event)
                }
            },
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Backend unreachable, continuing in degraded mode"
                );
                self.degrade(event)
            }
        }
    }

    /// Record the completion locally so the workflow still advances, and
    /// flag it for later reconciliation
    fn degrade(&mut self, event: StageEvent) -> WorkflowStage {
        let base = self
            .cache
            .get(&self.key)
            .unwrap_or_else(|| self.record.clone());
        let synthesized = event.synthesize_record(&self.key, &base);
        let reconciled = ReconciliationEngine::merge(None, Some(&synthesized))
            .expect("local side present");
        self.degraded = true;
        self.publisher.publish(WorkflowEvent::DegradedWrite {
            trait_kind: self.key.trait_kind,
            event: event.event_type().to_string(),
        });
        // DegradedWrite already signals the backend gap; the divergence
        // prompt fires on the next successful reconciliation instead.
        self.apply(reconciled, event.event_type(), false)
    }

    /// Store a reconciled record, re-derive stage, write through to the
    /// cache, and publish what changed
    fn apply(&mut self, reconciled: Reconciled, event: &str, emit_divergence: bool) -> WorkflowStage {
        let previous = self.stage;
        self.record = reconciled.record;
        self.stage = derive_stage(&self.record);
        self.cache.put(self.record.clone());

        if reconciled.diverged && emit_divergence {
            self.publisher.publish(WorkflowEvent::Divergence {
                trait_kind: self.key.trait_kind,
            });
        }
        if self.stage != previous {
            info!(
                key = %self.key,
                from = %previous,
                to = %self.stage,
                event,
                "Stage advanced"
            );
            self.publisher.publish(WorkflowEvent::StageAdvanced {
                trait_kind: self.key.trait_kind,
                from: previous,
                to: self.stage,
                event: event.to_string(),
            });
        }
        self.stage
    }
}
