//! # Annotation API Client
//!
//! HTTP implementation of `PersistenceAdapter` against the annotation
//! backend's REST routes. Handles URL construction, timeouts, retry with
//! exponential backoff on submissions, and the mapping from transport and
//! status failures to `AdapterError`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::persistence::{AdapterError, PersistenceAdapter};
use crate::models::{
    HumanAnnotation, MachineEvaluation, ModelAnnotation, ProgressKey, ProgressRecord, TraitHistory,
};

/// Configuration for the annotation API client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL for the annotation API (e.g. "<http://localhost:8080/api>")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum number of attempts for submissions
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 30_000,
            max_retries: 3,
        }
    }
}

/// HTTP client for the annotation backend
#[derive(Clone)]
pub struct AnnotationApiClient {
    client: Client,
    config: ApiConfig,
    base_url: Url,
}

impl std::fmt::Debug for AnnotationApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("max_retries", &self.config.max_retries)
            .finish()
    }
}

#[derive(Serialize)]
struct CompleteReviewRequest<'a> {
    evaluator: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

impl AnnotationApiClient {
    /// Create a client from configuration. Fails only on a malformed base
    /// URL or an unbuildable HTTP client.
    pub fn new(config: ApiConfig) -> Result<Self, AdapterError> {
        // Url::join drops the last path segment of a base without a trailing
        // slash, so normalize here.
        let normalized = if config.base_url.ends_with('/') {
            config.base_url.clone()
        } else {
            format!("{}/", config.base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| AdapterError::Configuration {
            message: format!("invalid base URL {}: {e}", config.base_url),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("phyreview-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdapterError::Configuration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        info!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            "Created annotation API client"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// URL for a trait-scoped backend route
    fn trait_url(&self, key: &ProgressKey, suffix: &str) -> Result<Url, AdapterError> {
        let path = format!(
            "physician/{}/task/{}/trait/{}/{}",
            key.physician_id, key.task_id, key.trait_kind, suffix
        );
        self.base_url
            .join(&path)
            .map_err(|e| AdapterError::Configuration {
                message: format!("failed to construct URL for {path}: {e}"),
            })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, AdapterError> {
        debug!(url = %url, "GET annotation backend");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AdapterError::network(e.to_string()))?;
        Self::parse_json(response).await
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AdapterError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdapterError::status(status.as_u16(), message));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AdapterError::Serialization {
                message: e.to_string(),
            })
    }

    /// POST a JSON body, retrying server errors and network failures with
    /// exponential backoff up to `max_retries` attempts. Client errors (4xx)
    /// are returned immediately.
    async fn post_with_retry<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
        operation: &str,
    ) -> Result<(), AdapterError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(url = %url, attempt, operation, "POST annotation backend");

            let result = self.client.post(url.clone()).json(body).send().await;
            let last_error = match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(());
                    }
                    let message = response.text().await.unwrap_or_default();
                    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
                        return Err(AdapterError::status(status.as_u16(), message));
                    }
                    AdapterError::status(status.as_u16(), message)
                }
                Err(e) => AdapterError::network(e.to_string()),
            };

            if attempt >= self.config.max_retries {
                warn!(
                    operation,
                    attempts = attempt,
                    error = %last_error,
                    "Exhausted retries submitting to annotation backend"
                );
                return Err(last_error);
            }

            let delay = Duration::from_millis(250 * (1 << attempt));
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "Submission failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PersistenceAdapter for AnnotationApiClient {
    async fn fetch_progress(&self, key: &ProgressKey) -> Result<ProgressRecord, AdapterError> {
        let mut url = self.trait_url(key, "progress")?;
        url.query_pairs_mut()
            .append_pair("username", &key.evaluator);
        self.get_json(url).await
    }

    async fn submit_human_annotation(
        &self,
        key: &ProgressKey,
        annotation: &HumanAnnotation,
    ) -> Result<(), AdapterError> {
        let url = self.trait_url(key, "human-annotation")?;
        self.post_with_retry(url, annotation, "human_annotation")
            .await
    }

    async fn fetch_machine_annotations(
        &self,
        key: &ProgressKey,
    ) -> Result<Vec<ModelAnnotation>, AdapterError> {
        let url = self.trait_url(key, "machine-annotations")?;
        self.get_json(url).await
    }

    async fn submit_machine_evaluations(
        &self,
        key: &ProgressKey,
        evaluations: &[MachineEvaluation],
    ) -> Result<(), AdapterError> {
        let url = self.trait_url(key, "machine-evaluation")?;
        self.post_with_retry(url, evaluations, "machine_evaluation")
            .await
    }

    async fn fetch_history(&self, key: &ProgressKey) -> Result<TraitHistory, AdapterError> {
        let mut url = self.trait_url(key, "history")?;
        url.query_pairs_mut()
            .append_pair("username", &key.evaluator);
        self.get_json(url).await
    }

    async fn complete_review(
        &self,
        key: &ProgressKey,
        comment: Option<&str>,
    ) -> Result<(), AdapterError> {
        let url = self.trait_url(key, "complete")?;
        let body = CompleteReviewRequest {
            evaluator: &key.evaluator,
            comment,
        };
        self.post_with_retry(url, &body, "complete_review").await
    }
}
