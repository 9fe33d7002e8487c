// Data model layer for the annotation workflow.
//
// These are the value types exchanged with the backend and held by the
// per-trait state machines. Serialization matches the backend's snake_case
// JSON field names exactly.

pub mod annotation;
pub mod progress;

pub use annotation::{
    EvidenceLevel, HumanAnnotation, MachineEvaluation, ModelAnnotation, Rating, ScoreBand,
    TraitHistory,
};
pub use progress::{ProgressKey, ProgressRecord};
