//! # Configuration
//!
//! Explicit, validated configuration for the workflow core: an optional YAML
//! file plus a small set of `PHYREVIEW_`-prefixed environment overrides,
//! with working defaults when neither is present. Validation rejects values
//! the core cannot run with rather than silently falling back.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{FileBackupStore, ProgressCache};
use crate::client::{AnnotationApiClient, ApiConfig};
use crate::error::{PhyreviewError, Result};

/// Durable backup settings for the progress cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON snapshot used to recover progress across reloads
    pub backup_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backup_path: PathBuf::from(".phyreview/progress.json"),
        }
    }
}

/// Event channel and diagnostic log sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Broadcast channel capacity for workflow notifications
    pub channel_capacity: usize,
    /// Bounded diagnostic log capacity
    pub log_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            log_capacity: 128,
        }
    }
}

/// Top-level configuration for the annotation workflow core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhyreviewConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub events: EventConfig,
}

impl PhyreviewConfig {
    /// Load `phyreview.yaml` from the working directory when present, then
    /// apply environment overrides and validate
    pub fn load() -> Result<Self> {
        Self::load_from_file(Path::new("phyreview.yaml"))
    }

    /// Load a specific YAML file (missing file means defaults), then apply
    /// environment overrides and validate
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut loaded = if path.exists() {
            let contents = fs::read_to_string(path)
                .map_err(|e| PhyreviewError::Configuration(format!("{}: {e}", path.display())))?;
            serde_yaml::from_str(&contents)
                .map_err(|e| PhyreviewError::Configuration(format!("{}: {e}", path.display())))?
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Self::default()
        };
        loaded.apply_env_overrides();
        loaded.validate()?;
        Ok(loaded)
    }

    /// Environment variables take precedence over file values
    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = env::var("PHYREVIEW_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Some(timeout_ms) = env_parse("PHYREVIEW_API_TIMEOUT_MS") {
            self.api.timeout_ms = timeout_ms;
        }
        if let Some(max_retries) = env_parse("PHYREVIEW_API_MAX_RETRIES") {
            self.api.max_retries = max_retries;
        }
        if let Ok(backup_path) = env::var("PHYREVIEW_CACHE_BACKUP_PATH") {
            self.cache.backup_path = PathBuf::from(backup_path);
        }
        if let Some(log_capacity) = env_parse("PHYREVIEW_EVENT_LOG_CAPACITY") {
            self.events.log_capacity = log_capacity;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(PhyreviewError::Configuration(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if self.api.timeout_ms == 0 {
            return Err(PhyreviewError::Configuration(
                "api.timeout_ms must be positive".to_string(),
            ));
        }
        if self.api.max_retries == 0 {
            return Err(PhyreviewError::Configuration(
                "api.max_retries must be at least 1".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 || self.events.log_capacity == 0 {
            return Err(PhyreviewError::Configuration(
                "event capacities must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Progress cache backed by the configured durable snapshot
    pub fn open_cache(&self) -> Result<Arc<ProgressCache>> {
        let store = FileBackupStore::open(&self.cache.backup_path)?;
        Ok(Arc::new(ProgressCache::new(Arc::new(store))))
    }

    /// HTTP adapter for the configured backend
    pub fn build_client(&self) -> Result<AnnotationApiClient> {
        Ok(AnnotationApiClient::new(self.api.clone())?)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
