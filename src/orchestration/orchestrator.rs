//! # Trait Orchestrator
//!
//! Owns one workflow per trait in canonical order, computes aggregate
//! completion, and selects which trait to present next. Workflow events are
//! observed through the shared broadcast channel after every delegated
//! operation: completions advance the active trait, and everything observed
//! lands in the bounded diagnostic log.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::event_log::{EventLog, LogEntry};
use crate::cache::ProgressCache;
use crate::client::PersistenceAdapter;
use crate::config::EventConfig;
use crate::constants::TraitKind;
use crate::error::Result;
use crate::events::{WorkflowEvent, WorkflowEventPublisher};
use crate::models::{HumanAnnotation, MachineEvaluation, ModelAnnotation, ProgressKey, TraitHistory};
use crate::state_machine::{TraitWorkflow, WorkflowStage};

/// Coordinator for one evaluator's five trait workflows on one task
pub struct TraitOrchestrator {
    /// Indexed by `TraitKind::ordinal`
    workflows: Vec<TraitWorkflow>,
    active: Option<TraitKind>,
    publisher: WorkflowEventPublisher,
    events_rx: broadcast::Receiver<WorkflowEvent>,
    event_log: EventLog,
}

impl TraitOrchestrator {
    pub fn new(
        physician_id: i64,
        task_id: i64,
        evaluator: impl Into<String>,
        adapter: Arc<dyn PersistenceAdapter>,
        cache: Arc<ProgressCache>,
        events: EventConfig,
    ) -> Self {
        let evaluator = evaluator.into();
        let publisher = WorkflowEventPublisher::new(events.channel_capacity);
        let events_rx = publisher.subscribe();

        let workflows = TraitKind::ALL
            .iter()
            .map(|&trait_kind| {
                TraitWorkflow::new(
                    ProgressKey::new(physician_id, task_id, evaluator.clone(), trait_kind),
                    Arc::clone(&adapter),
                    Arc::clone(&cache),
                    publisher.clone(),
                )
            })
            .collect();

        Self {
            workflows,
            active: Some(TraitKind::ALL[0]),
            publisher,
            events_rx,
            event_log: EventLog::new(events.log_capacity),
        }
    }

    /// Initialize every workflow and activate the first non-completed trait.
    /// A backend failure degrades the affected trait only.
    pub async fn initialize_all(&mut self) -> Option<TraitKind> {
        for workflow in &mut self.workflows {
            workflow.initialize().await;
        }
        self.drain_events();
        self.active = self.first_incomplete();
        info!(
            completed = self.completed_count(),
            active = ?self.active,
            "Trait workflows initialized"
        );
        self.active
    }

    /// Number of traits whose stage is `Completed`
    pub fn completed_count(&self) -> usize {
        self.workflows
            .iter()
            .filter(|w| w.stage().is_terminal())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.completed_count() == self.workflows.len()
    }

    /// The trait currently presented to the evaluator
    pub fn active_trait(&self) -> Option<TraitKind> {
        self.active
    }

    pub fn stage_of(&self, trait_kind: TraitKind) -> WorkflowStage {
        self.workflows[trait_kind.ordinal()].stage()
    }

    pub fn workflow(&self, trait_kind: TraitKind) -> &TraitWorkflow {
        &self.workflows[trait_kind.ordinal()]
    }

    /// Traits carrying unacknowledged local progress, for the
    /// reconciliation prompt
    pub fn degraded_traits(&self) -> Vec<TraitKind> {
        self.workflows
            .iter()
            .filter(|w| w.is_degraded())
            .map(|w| w.trait_kind())
            .collect()
    }

    /// Subscribe to workflow notifications (the UI layer's completion
    /// callback channel)
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.publisher.subscribe()
    }

    /// Copy of the bounded diagnostic log, oldest first
    pub fn diagnostics(&self) -> Vec<LogEntry> {
        self.event_log.snapshot()
    }

    pub async fn complete_human_annotation(
        &mut self,
        trait_kind: TraitKind,
        annotation: &HumanAnnotation,
    ) -> Result<WorkflowStage> {
        let result = self.workflows[trait_kind.ordinal()]
            .complete_human_annotation(annotation)
            .await;
        self.drain_events();
        result
    }

    pub async fn complete_machine_evaluation(
        &mut self,
        trait_kind: TraitKind,
        evaluations: &[MachineEvaluation],
    ) -> Result<WorkflowStage> {
        let result = self.workflows[trait_kind.ordinal()]
            .complete_machine_evaluation(evaluations)
            .await;
        self.drain_events();
        result
    }

    pub async fn complete_review(
        &mut self,
        trait_kind: TraitKind,
        comment: Option<&str>,
    ) -> Result<WorkflowStage> {
        let result = self.workflows[trait_kind.ordinal()]
            .complete_review(comment)
            .await;
        self.drain_events();
        result
    }

    /// Recovery override for one trait, through the normal merge path
    pub fn force_stage(&mut self, trait_kind: TraitKind, stage: WorkflowStage) -> WorkflowStage {
        let result = self.workflows[trait_kind.ordinal()].force_stage(stage);
        self.drain_events();
        result
    }

    pub async fn fetch_machine_annotations(
        &self,
        trait_kind: TraitKind,
    ) -> Result<Vec<ModelAnnotation>> {
        self.workflows[trait_kind.ordinal()]
            .fetch_machine_annotations()
            .await
    }

    pub async fn fetch_history(&self, trait_kind: TraitKind) -> Result<TraitHistory> {
        self.workflows[trait_kind.ordinal()].fetch_history().await
    }

    /// Re-run initialization for one trait, used after connectivity returns
    /// to reconcile degraded progress
    pub async fn reconcile_trait(&mut self, trait_kind: TraitKind) -> WorkflowStage {
        let stage = self.workflows[trait_kind.ordinal()].initialize().await;
        self.drain_events();
        stage
    }

    fn first_incomplete(&self) -> Option<TraitKind> {
        self.workflows
            .iter()
            .find(|w| !w.stage().is_terminal())
            .map(|w| w.trait_kind())
    }

    /// Next non-completed trait after `from` in canonical order, wrapping to
    /// the lowest-ordered one when everything later is done
    fn next_incomplete_after(&self, from: TraitKind) -> Option<TraitKind> {
        self.workflows
            .iter()
            .skip(from.ordinal() + 1)
            .find(|w| !w.stage().is_terminal())
            .map(|w| w.trait_kind())
            .or_else(|| self.first_incomplete())
    }

    fn drain_events(&mut self) {
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => self.observe(event),
                Err(broadcast::error::TryRecvError::Empty) => break,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Diagnostic log missed workflow events");
                }
                Err(broadcast::error::TryRecvError::Closed) => break,
            }
        }
    }

    fn observe(&mut self, event: WorkflowEvent) {
        self.event_log.record(event.clone());
        if let WorkflowEvent::StageAdvanced {
            trait_kind,
            to: WorkflowStage::Completed,
            ..
        } = event
        {
            self.active = self.next_incomplete_after(trait_kind);
            info!(
                completed_trait = %trait_kind,
                next_active = ?self.active,
                "Trait completed"
            );
            self.publisher
                .publish(WorkflowEvent::TraitCompleted { trait_kind });
            if self.is_complete() {
                self.publisher.publish(WorkflowEvent::AllTraitsCompleted);
            }
        }
    }
}
