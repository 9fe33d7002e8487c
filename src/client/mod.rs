//! # Backend Client
//!
//! The boundary through which progress and annotations are fetched from and
//! submitted to the annotation backend. The core depends only on the
//! `PersistenceAdapter` trait; `api_client` provides the HTTP implementation
//! used in production.

pub mod api_client;
pub mod persistence;

pub use api_client::{AnnotationApiClient, ApiConfig};
pub use persistence::{AdapterError, PersistenceAdapter};
