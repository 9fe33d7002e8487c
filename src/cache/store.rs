//! # Durable Backup Stores
//!
//! Persistence boundary behind the progress cache. The file-backed store
//! keeps one JSON document mapping storage keys to progress records, loaded
//! at construction and rewritten on every save so a crash loses at most the
//! write in flight.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::models::{ProgressKey, ProgressRecord};

/// Errors raised by backup store operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("backup store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("backup store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable storage for progress records, keyed by `ProgressKey::storage_key`
pub trait BackupStore: Send + Sync {
    fn load(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, CacheError>;
    fn save(&self, key: &ProgressKey, record: &ProgressRecord) -> Result<(), CacheError>;
    fn remove(&self, key: &ProgressKey) -> Result<(), CacheError>;
}

/// JSON-file backed store for recovery across reloads
pub struct FileBackupStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, ProgressRecord>>,
}

impl FileBackupStore {
    /// Open the store at `path`, reading any existing snapshot. A missing
    /// file starts empty; a parent directory is created if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = entries.len(), "Opened progress backup store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<String, ProgressRecord>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl BackupStore for FileBackupStore {
    fn load(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, CacheError> {
        Ok(self.entries.lock().get(&key.storage_key()).cloned())
    }

    fn save(&self, key: &ProgressKey, record: &ProgressRecord) -> Result<(), CacheError> {
        let mut entries = self.entries.lock();
        entries.insert(key.storage_key(), record.clone());
        self.flush(&entries)
    }

    fn remove(&self, key: &ProgressKey) -> Result<(), CacheError> {
        let mut entries = self.entries.lock();
        if entries.remove(&key.storage_key()).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and environments without a writable disk
#[derive(Default)]
pub struct MemoryBackupStore {
    entries: Mutex<HashMap<String, ProgressRecord>>,
}

impl MemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackupStore for MemoryBackupStore {
    fn load(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>, CacheError> {
        Ok(self.entries.lock().get(&key.storage_key()).cloned())
    }

    fn save(&self, key: &ProgressKey, record: &ProgressRecord) -> Result<(), CacheError> {
        self.entries
            .lock()
            .insert(key.storage_key(), record.clone());
        Ok(())
    }

    fn remove(&self, key: &ProgressKey) -> Result<(), CacheError> {
        self.entries.lock().remove(&key.storage_key());
        Ok(())
    }
}
