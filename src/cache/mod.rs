// Local progress caching.
//
// The ephemeral layer answers reads for the current session; the durable
// backup store recovers progress across reloads. Both sit behind an explicit
// get/put/clear interface rather than ambient key-value access.

pub mod progress_cache;
pub mod store;

pub use progress_cache::ProgressCache;
pub use store::{BackupStore, CacheError, FileBackupStore, MemoryBackupStore};
