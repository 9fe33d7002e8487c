#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Phyreview Core
//!
//! Rust core for the physician review annotation workflow. Evaluators
//! annotate physicians on the five Big Five personality traits across a
//! three-stage workflow (human annotation, machine-output evaluation,
//! review/finalize); this crate owns the per-trait state machines and keeps
//! their progress consistent with the annotation backend.
//!
//! ## Architecture
//!
//! Stage is never stored as its own source of truth: it is derived from a
//! per-trait progress record, and progress observed from the backend is
//! reconciled with progress cached locally before anything is derived. When
//! the backend is unreachable, completions are synthesized locally and
//! flagged so the evaluator is never blocked by a transient outage.
//!
//! ## Module Organization
//!
//! - [`models`] - Progress records and annotation payloads
//! - [`constants`] - The fixed five-trait set
//! - [`state_machine`] - Stage derivation, reconciliation, and the per-trait workflow
//! - [`cache`] - Progress cache with a durable backup store
//! - [`client`] - The backend adapter trait and its HTTP implementation
//! - [`events`] - Workflow notification channel
//! - [`orchestration`] - Cross-trait coordination and diagnostics
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use phyreview_core::config::PhyreviewConfig;
//! use phyreview_core::orchestration::TraitOrchestrator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PhyreviewConfig::load()?;
//! let adapter = Arc::new(config.build_client()?);
//! let cache = config.open_cache()?;
//!
//! let mut orchestrator =
//!     TraitOrchestrator::new(1003892073, 17, "evaluator_a", adapter, cache, config.events);
//! let active = orchestrator.initialize_all().await;
//! println!("{} of 5 traits complete, next up: {active:?}", orchestrator.completed_count());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;

pub use cache::{BackupStore, CacheError, FileBackupStore, MemoryBackupStore, ProgressCache};
pub use client::{AdapterError, AnnotationApiClient, ApiConfig, PersistenceAdapter};
pub use config::{CacheConfig, EventConfig, PhyreviewConfig};
pub use constants::TraitKind;
pub use error::{PhyreviewError, Result};
pub use events::{WorkflowEvent, WorkflowEventPublisher};
pub use models::{
    EvidenceLevel, HumanAnnotation, MachineEvaluation, ModelAnnotation, ProgressKey,
    ProgressRecord, Rating, ScoreBand, TraitHistory,
};
pub use orchestration::{EventLog, TraitOrchestrator};
pub use state_machine::{derive_stage, ReconciliationEngine, TraitWorkflow, WorkflowStage};
