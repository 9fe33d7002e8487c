//! Broadcast publisher for workflow lifecycle events.
//!
//! Publishing never blocks and never fails: with no subscribers the event is
//! simply dropped, which is acceptable for notifications that exist to drive
//! UI prompts and diagnostics rather than control flow.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::constants::TraitKind;
use crate::state_machine::states::WorkflowStage;

/// Notifications emitted by trait workflows and the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A trait's derived stage changed
    StageAdvanced {
        trait_kind: TraitKind,
        from: WorkflowStage,
        to: WorkflowStage,
        event: String,
    },
    /// Local progress was ahead of the backend after reconciliation;
    /// surfaced as a corrective prompt, never an error
    Divergence { trait_kind: TraitKind },
    /// A completion was recorded locally because the backend was unreachable
    DegradedWrite {
        trait_kind: TraitKind,
        event: String,
    },
    /// A trait reached the terminal stage
    TraitCompleted { trait_kind: TraitKind },
    /// All five traits are complete
    AllTraitsCompleted,
}

/// Clone-able handle for publishing workflow events
#[derive(Debug, Clone)]
pub struct WorkflowEventPublisher {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowEventPublisher {
    /// Create a publisher with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Succeeds whether or not anyone is listening.
    pub fn publish(&self, event: WorkflowEvent) {
        // send() errors only when there are no subscribers, which is fine.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for WorkflowEventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}
