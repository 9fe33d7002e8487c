//! # Structured Error Handling
//!
//! Crate-wide error taxonomy using thiserror for structured error types
//! instead of `Box<dyn Error>` patterns. Adapter and cache failures keep their
//! own error enums close to the code that raises them; this module provides
//! the top-level type the public API surfaces.

use thiserror::Error;

use crate::cache::CacheError;
use crate::client::AdapterError;

/// Top-level error type for the annotation workflow core
#[derive(Debug, Error)]
pub enum PhyreviewError {
    /// The backend could not be reached or rejected the request
    #[error("backend adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// The progress cache or its durable backup failed
    #[error("progress cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration loading or validation failed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input failed domain validation
    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, PhyreviewError>;
