// Event system foundation.
//
// Workflow-level notifications flow out of the trait workflows through a
// broadcast publisher; the orchestrator and the UI layer subscribe to the
// same channel.

pub mod publisher;

pub use publisher::{WorkflowEvent, WorkflowEventPublisher};
