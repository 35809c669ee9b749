//! Rendered-screenshot cache management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::ScreenshotClient;
use crate::error::ApiError;

/// A cached screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Filters and paging for listing cache entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheListQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub url_prefix: Option<String>,
}

impl CacheListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = Some(prefix.into());
        self
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }
        if let Some(prefix) = &self.url_prefix {
            pairs.push(("url_prefix", prefix.clone()));
        }
        pairs
    }
}

/// One page of cache entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachePage {
    #[serde(default)]
    pub entries: Vec<CacheEntry>,
    /// Cursor for the next page; `None` on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Selects cache entries to purge.
///
/// At least one selector must be set; purging everything requires
/// [`PurgeRequest::all`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PurgeRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_prefix: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub all: bool,
}

impl PurgeRequest {
    /// Purge the given keys.
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Purge every entry whose source URL starts with `prefix`.
    pub fn url_prefix(prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Purge the whole cache.
    pub fn all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.url_prefix.is_none() && !self.all
    }
}

/// Outcome of a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeResult {
    pub purged: u64,
}

impl ScreenshotClient {
    /// List cached screenshots.
    ///
    /// Sends `GET <base>/cache`.
    #[instrument(skip(self))]
    pub async fn list_cache(&self, query: &CacheListQuery) -> Result<CachePage, ApiError> {
        let url = self.endpoint(&["cache"])?;
        let pairs = query.to_query_pairs();
        self.execute_json("list_cache", || {
            self.http_client.get(url.clone()).query(&pairs)
        })
        .await
    }

    /// Fetch one cache entry.
    ///
    /// Sends `GET <base>/cache/<key>`.
    #[instrument(skip(self))]
    pub async fn get_cache_entry(&self, key: &str) -> Result<CacheEntry, ApiError> {
        let url = self.endpoint(&["cache", key])?;
        self.execute_json("get_cache_entry", || self.http_client.get(url.clone()))
            .await
    }

    /// Delete one cache entry.
    ///
    /// Sends `DELETE <base>/cache/<key>`.
    #[instrument(skip(self))]
    pub async fn delete_cache_entry(&self, key: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["cache", key])?;
        self.execute("delete_cache_entry", || self.http_client.delete(url.clone()))
            .await?;

        info!(key, "Cache entry deleted");
        Ok(())
    }

    /// Purge cache entries.
    ///
    /// Sends `POST <base>/cache/purge`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` without contacting the service if
    /// the request selects nothing.
    #[instrument(skip(self))]
    pub async fn purge_cache(&self, request: &PurgeRequest) -> Result<PurgeResult, ApiError> {
        if request.is_empty() {
            return Err(ApiError::InvalidRequest {
                message: "purge request must select keys, a URL prefix, or all".to_string(),
            });
        }

        let url = self.endpoint(&["cache", "purge"])?;
        let result: PurgeResult = self
            .execute_json("purge_cache", || {
                self.http_client.post(url.clone()).json(request)
            })
            .await?;

        info!(purged = result.purged, "Cache purged");
        Ok(result)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
