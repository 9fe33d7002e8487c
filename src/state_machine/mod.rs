// State machine module for the per-trait annotation workflow.
//
// Stage is always a derived value: `states::derive_stage` is the single place
// progress flags are turned into a stage, `reconciliation` merges backend and
// cached progress into one authoritative record, and `trait_workflow` owns one
// trait's lifecycle on top of both.

pub mod events;
pub mod reconciliation;
pub mod states;
pub mod trait_workflow;

pub use events::StageEvent;
pub use reconciliation::{Reconciled, ReconciliationEngine};
pub use states::{derive_stage, WorkflowStage};
pub use trait_workflow::TraitWorkflow;
