//! Shared test doubles for integration tests.
//!
//! `MockBackend` mirrors the annotation backend's observable behavior: it
//! stores submissions, advances the stored progress record the way the real
//! controllers do, and can be taken offline to exercise the degraded path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use phyreview_core::{
    AdapterError, HumanAnnotation, MachineEvaluation, ModelAnnotation, PersistenceAdapter,
    ProgressKey, ProgressRecord, TraitHistory,
};

#[derive(Default)]
struct TraitState {
    progress: Option<ProgressRecord>,
    annotation: Option<HumanAnnotation>,
    evaluations: Vec<MachineEvaluation>,
}

/// In-memory stand-in for the annotation backend
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<HashMap<String, TraitState>>,
    online: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.online.store(true, Ordering::SeqCst);
        backend
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), AdapterError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AdapterError::network("connection refused"))
        }
    }

    /// Progress as the backend would report it, for assertions
    pub fn progress_of(&self, key: &ProgressKey) -> Option<ProgressRecord> {
        self.state
            .lock()
            .get(&key.storage_key())
            .and_then(|s| s.progress.clone())
    }

    fn update_progress(
        state: &mut TraitState,
        key: &ProgressKey,
        apply: impl FnOnce(&mut ProgressRecord),
    ) {
        let mut record = state
            .progress
            .clone()
            .unwrap_or_else(|| ProgressRecord::fresh(key));
        apply(&mut record);
        record.timestamp = Some(chrono::Utc::now());
        state.progress = Some(record);
    }
}

#[async_trait]
impl PersistenceAdapter for MockBackend {
    async fn fetch_progress(&self, key: &ProgressKey) -> Result<ProgressRecord, AdapterError> {
        self.check_online()?;
        Ok(self
            .progress_of(key)
            .unwrap_or_else(|| ProgressRecord::fresh(key)))
    }

    async fn submit_human_annotation(
        &self,
        key: &ProgressKey,
        annotation: &HumanAnnotation,
    ) -> Result<(), AdapterError> {
        self.check_online()?;
        let mut state = self.state.lock();
        let trait_state = state.entry(key.storage_key()).or_default();
        trait_state.annotation = Some(annotation.clone());
        Self::update_progress(trait_state, key, |r| r.human_annotation_completed = true);
        Ok(())
    }

    async fn fetch_machine_annotations(
        &self,
        key: &ProgressKey,
    ) -> Result<Vec<ModelAnnotation>, AdapterError> {
        self.check_online()?;
        let _ = key;
        Ok(vec![])
    }

    async fn submit_machine_evaluations(
        &self,
        key: &ProgressKey,
        evaluations: &[MachineEvaluation],
    ) -> Result<(), AdapterError> {
        self.check_online()?;
        let mut state = self.state.lock();
        let trait_state = state.entry(key.storage_key()).or_default();
        trait_state.evaluations = evaluations.to_vec();
        Self::update_progress(trait_state, key, |r| {
            r.machine_evaluation_completed = true;
        });
        Ok(())
    }

    async fn fetch_history(&self, key: &ProgressKey) -> Result<TraitHistory, AdapterError> {
        self.check_online()?;
        let state = self.state.lock();
        Ok(state
            .get(&key.storage_key())
            .map(|s| TraitHistory {
                human_annotation: s.annotation.clone(),
                machine_evaluations: s.evaluations.clone(),
            })
            .unwrap_or_default())
    }

    async fn complete_review(
        &self,
        key: &ProgressKey,
        _comment: Option<&str>,
    ) -> Result<(), AdapterError> {
        self.check_online()?;
        let mut state = self.state.lock();
        let trait_state = state.entry(key.storage_key()).or_default();
        Self::update_progress(trait_state, key, |r| r.review_completed = true);
        Ok(())
    }
}
