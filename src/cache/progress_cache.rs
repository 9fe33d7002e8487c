//! # Progress Cache
//!
//! Local store of the most recently seen progress per (physician, task,
//! evaluator, trait). Reads hit the ephemeral layer first and fall back to
//! the durable backup, promoting what they find (read-repair); writes go to
//! both layers (write-through). Partitioned by `ProgressKey`, so workflows
//! for different traits cannot interfere.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::store::{BackupStore, MemoryBackupStore};
use crate::models::{ProgressKey, ProgressRecord};

/// Shared progress cache with a durable backup behind it
pub struct ProgressCache {
    ephemeral: DashMap<ProgressKey, ProgressRecord>,
    backup: Arc<dyn BackupStore>,
}

impl ProgressCache {
    pub fn new(backup: Arc<dyn BackupStore>) -> Self {
        Self {
            ephemeral: DashMap::new(),
            backup,
        }
    }

    /// Cache backed only by memory, for tests and throwaway sessions
    pub fn ephemeral_only() -> Self {
        Self::new(Arc::new(MemoryBackupStore::new()))
    }

    /// Most recently seen record for `key`, recovering from the durable
    /// backup when the ephemeral layer has nothing (e.g. after a reload)
    pub fn get(&self, key: &ProgressKey) -> Option<ProgressRecord> {
        if let Some(record) = self.ephemeral.get(key) {
            return Some(record.clone());
        }
        match self.backup.load(key) {
            Ok(Some(record)) => {
                debug!(key = %key, "Recovered progress from durable backup");
                self.ephemeral.insert(key.clone(), record.clone());
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Durable backup read failed");
                None
            }
        }
    }

    /// Write-through: the record lands in both layers. A durable-store
    /// failure is logged and tolerated; the ephemeral layer still serves the
    /// session.
    pub fn put(&self, record: ProgressRecord) {
        let key = record.key();
        if let Err(e) = self.backup.save(&key, &record) {
            warn!(key = %key, error = %e, "Durable backup write failed");
        }
        self.ephemeral.insert(key, record);
    }

    /// Drop the record for `key` from both layers
    pub fn clear(&self, key: &ProgressKey) {
        self.ephemeral.remove(key);
        if let Err(e) = self.backup.remove(key) {
            warn!(key = %key, error = %e, "Durable backup remove failed");
        }
    }

    /// Number of records in the ephemeral layer
    pub fn len(&self) -> usize {
        self.ephemeral.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ephemeral.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::FileBackupStore;
    use crate::constants::TraitKind;

    fn key(trait_kind: TraitKind) -> ProgressKey {
        ProgressKey::new(21, 8, "eva", trait_kind)
    }

    fn advanced(trait_kind: TraitKind) -> ProgressRecord {
        let mut record = ProgressRecord::fresh(&key(trait_kind));
        record.human_annotation_completed = true;
        record
    }

    #[test]
    fn test_get_miss_returns_none() {
        let cache = ProgressCache::ephemeral_only();
        assert!(cache.get(&key(TraitKind::Openness)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let cache = ProgressCache::ephemeral_only();
        cache.put(advanced(TraitKind::Openness));

        let got = cache.get(&key(TraitKind::Openness)).expect("cached");
        assert!(got.human_annotation_completed);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_partitioned_by_trait() {
        let cache = ProgressCache::ephemeral_only();
        cache.put(advanced(TraitKind::Openness));

        assert!(cache.get(&key(TraitKind::Neuroticism)).is_none());

        // Same trait, different evaluator is a different partition too.
        let other_evaluator = ProgressKey::new(21, 8, "someone_else", TraitKind::Openness);
        assert!(cache.get(&other_evaluator).is_none());
    }

    #[test]
    fn test_read_repair_recovers_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let cache = ProgressCache::new(Arc::new(FileBackupStore::open(&path).unwrap()));
        cache.put(advanced(TraitKind::Agreeableness));

        // Simulated reload: fresh ephemeral layer over the same backup file.
        let reloaded = ProgressCache::new(Arc::new(FileBackupStore::open(&path).unwrap()));
        assert!(reloaded.is_empty());
        let got = reloaded
            .get(&key(TraitKind::Agreeableness))
            .expect("recovered from backup");
        assert!(got.human_annotation_completed);
        // Promotion into the ephemeral layer happened.
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_clear_removes_both_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let cache = ProgressCache::new(Arc::new(FileBackupStore::open(&path).unwrap()));
        cache.put(advanced(TraitKind::Extraversion));
        cache.clear(&key(TraitKind::Extraversion));

        assert!(cache.get(&key(TraitKind::Extraversion)).is_none());
        let reloaded = ProgressCache::new(Arc::new(FileBackupStore::open(&path).unwrap()));
        assert!(reloaded.get(&key(TraitKind::Extraversion)).is_none());
    }
}
