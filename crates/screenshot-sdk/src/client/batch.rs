//! Batch screenshot jobs.
//!
//! A batch renders many pages asynchronously. The service answers the submit
//! call with a job id; completion is reported either by polling
//! [`ScreenshotClient::batch_status`] or through a `batch.completed` /
//! `batch.failed` webhook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::ScreenshotClient;
use crate::error::ApiError;
use crate::options::ScreenshotOptions;

/// Request body for submitting a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchRequest {
    /// One entry per page to render.
    pub requests: Vec<ScreenshotOptions>,

    /// Where to deliver the completion webhook, overriding the account default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl BatchRequest {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page to the batch.
    pub fn with_request(mut self, options: ScreenshotOptions) -> Self {
        self.requests.push(options);
        self
    }

    /// Deliver the completion webhook to `url`.
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }
}

/// Lifecycle state of a batch or of a single item in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// A state this SDK version does not know about.
    #[serde(other)]
    Unknown,
}

impl BatchStatus {
    /// Whether the job will not change state any more.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Result for a single page in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub url: String,
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A batch job as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: String,
    pub status: BatchStatus,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub items: Vec<BatchItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ScreenshotClient {
    /// Submit a batch of screenshots.
    ///
    /// Sends `POST <base>/screenshot/batch`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` without contacting the service if
    /// the batch is empty.
    #[instrument(skip(self, request), fields(size = request.requests.len()))]
    pub async fn submit_batch(&self, request: &BatchRequest) -> Result<BatchJob, ApiError> {
        if request.requests.is_empty() {
            return Err(ApiError::InvalidRequest {
                message: "batch must contain at least one request".to_string(),
            });
        }

        let url = self.endpoint(&["screenshot", "batch"])?;
        let job: BatchJob = self
            .execute_json("submit_batch", || {
                self.http_client.post(url.clone()).json(request)
            })
            .await?;

        info!(batch_id = %job.id, "Batch submitted");
        Ok(job)
    }

    /// Fetch the current state of a batch.
    ///
    /// Sends `GET <base>/screenshot/batch/<id>`.
    #[instrument(skip(self))]
    pub async fn batch_status(&self, batch_id: &str) -> Result<BatchJob, ApiError> {
        let url = self.endpoint(&["screenshot", "batch", batch_id])?;
        self.execute_json("batch_status", || self.http_client.get(url.clone()))
            .await
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
