//! HTTP client for the screenshot service.
//!
//! [`ScreenshotClient`] submits screenshot, batch and cache requests with the
//! caller's API key, retries transient failures with exponential backoff,
//! and normalizes every non-2xx response into an [`ApiError`]. It also
//! issues signed URLs, which need no network round trip.
//!
//! # Examples
//!
//! ```no_run
//! use screenshot_sdk::client::ScreenshotClient;
//! use screenshot_sdk::options::ScreenshotOptions;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ScreenshotClient::builder("sk_live_123").build()?;
//!
//! let shot = client
//!     .screenshot(&ScreenshotOptions::new("https://example.com").with_width(1280))
//!     .await?;
//! std::fs::write("example.png", &shot.bytes)?;
//! # Ok(())
//! # }
//! ```

mod batch;
mod cache;
mod retry;

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{ApiError, ConfigError};
use crate::options::ScreenshotOptions;
use crate::signing::UrlSigner;

pub use batch::{BatchItem, BatchJob, BatchRequest, BatchStatus};
pub use cache::{CacheEntry, CacheListQuery, CachePage, PurgeRequest, PurgeResult};
pub use retry::{parse_retry_after, RetryPolicy};

/// Service base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.screenshotapi.example/v1";

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Configuration for client behavior.
///
/// # Examples
///
/// ```
/// use screenshot_sdk::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("sk_live_123")
///     .with_timeout(Duration::from_secs(60))
///     .with_max_retries(5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// API key; authenticates requests and keys signed URLs
    pub api_key: String,
    /// Service base URL, e.g. `https://api.screenshotapi.example/v1`
    pub base_url: String,
    /// User agent string for API requests
    pub user_agent: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Base delay for exponential backoff retries
    pub initial_retry_delay: Duration,
    /// Maximum delay between retries
    pub max_retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("screenshot-sdk/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(60),
            max_retries: 3,
            initial_retry_delay: Duration::from_millis(250),
            max_retry_delay: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with defaults and the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create a new builder for client configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the service base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff delays.
    pub fn with_retry_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_retry_delay = initial;
        self.max_retry_delay = max;
        self
    }

    /// Retry policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.initial_retry_delay,
            self.max_retry_delay,
        )
    }

    /// Check that the configuration can be used to build a client.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::MissingApiKey`] - the API key is empty
    /// * [`ConfigError::InvalidBaseUrl`] - the base URL is not absolute http(s)
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url().map(|_| ())
    }

    fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                message: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

// Security: Don't expose the API key in debug output
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("initial_retry_delay", &self.initial_retry_delay)
            .field("max_retry_delay", &self.max_retry_delay)
            .finish()
    }
}

/// Builder for constructing `ClientConfig` instances.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new configuration builder with defaults.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    /// Set the service base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the initial backoff delay.
    pub fn initial_retry_delay(mut self, delay: Duration) -> Self {
        self.config.initial_retry_delay = delay;
        self
    }

    /// Set the maximum backoff delay.
    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.config.max_retry_delay = delay;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A rendered screenshot.
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// The image (or PDF) bytes.
    pub bytes: Bytes,
    /// `Content-Type` of the response, e.g. `image/png`.
    pub content_type: Option<String>,
    /// `X-Cache-Status` of the response (`HIT` / `MISS`), when reported.
    pub cache_status: Option<String>,
    /// `X-Request-Id` of the response, useful when contacting support.
    pub request_id: Option<String>,
}

impl Screenshot {
    /// Whether the service answered from its cache.
    pub fn is_cache_hit(&self) -> bool {
        self.cache_status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("hit"))
    }
}

/// Client for the screenshot service API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ScreenshotClient {
    http_client: reqwest::Client,
    config: ClientConfig,
    base_url: Url,
    retry_policy: RetryPolicy,
    signer: UrlSigner,
}

impl ScreenshotClient {
    /// Create a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the configuration is invalid or
    /// the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.parsed_base_url()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                message: e.to_string(),
            })?;

        let screenshot_endpoint = endpoint(&base_url, &["screenshot"])?;
        let signer = UrlSigner::new(config.api_key.clone(), screenshot_endpoint.to_string());

        Ok(Self {
            http_client,
            retry_policy: config.retry_policy(),
            base_url,
            config,
            signer,
        })
    }

    /// Create a new builder for constructing a client.
    pub fn builder(api_key: impl Into<String>) -> ScreenshotClientBuilder {
        ScreenshotClientBuilder::new(api_key)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the URL signer bound to this client's API key and endpoint.
    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Render a screenshot.
    ///
    /// Sends `GET <base>/screenshot` with the options as query parameters.
    ///
    /// # Errors
    ///
    /// Returns the normalized `ApiError` for non-2xx responses after any
    /// retries have been exhausted.
    #[instrument(skip(self, options), fields(page_url = %options.url()))]
    pub async fn screenshot(&self, options: &ScreenshotOptions) -> Result<Screenshot, ApiError> {
        let url = self.endpoint(&["screenshot"])?;
        let query = options.to_query_pairs();

        let response = self
            .execute("screenshot", || self.http_client.get(url.clone()).query(&query))
            .await?;

        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        debug!(size = bytes.len(), "Screenshot received");

        Ok(Screenshot {
            bytes,
            content_type: header_string(&headers, CONTENT_TYPE.as_str()),
            cache_status: header_string(&headers, "x-cache-status"),
            request_id: header_string(&headers, "x-request-id"),
        })
    }

    /// Create a signed URL that renders `options` until `expires_at`.
    ///
    /// The URL is keyed with this client's API key. No request is made.
    pub fn signed_url(&self, options: &ScreenshotOptions, expires_at: DateTime<Utc>) -> String {
        self.signer.sign(options, expires_at)
    }

    /// Create a signed URL valid for `valid_for` from now.
    pub fn signed_url_expiring_in(&self, options: &ScreenshotOptions, valid_for: Duration) -> String {
        let valid_for = chrono::Duration::from_std(valid_for).unwrap_or(chrono::Duration::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(valid_for)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.signed_url(options, expires_at)
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint(&self.base_url, segments)
    }

    /// Send a request, retrying transient failures.
    ///
    /// `build` is called once per attempt because a `RequestBuilder` cannot
    /// be reused after sending.
    pub(crate) async fn execute<F>(&self, operation: &str, build: F) -> Result<reqwest::Response, ApiError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            debug!(operation, attempt, "Sending request");

            let result = build()
                .header(API_KEY_HEADER, &self.config.api_key)
                .send()
                .await;

            let error = match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => error_from_response(response).await,
                Err(e) => ApiError::from(e),
            };

            if !(error.is_transient() && self.retry_policy.should_retry(attempt)) {
                return Err(error);
            }

            attempt += 1;
            let delay = self.retry_policy.delay_for(attempt, error.retry_after());
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Send a request and decode its JSON body.
    pub(crate) async fn execute_json<T, F>(&self, operation: &str, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let response = self.execute(operation, build).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for ScreenshotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenshotClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for constructing `ScreenshotClient` instances.
#[derive(Debug)]
pub struct ScreenshotClientBuilder {
    config: ClientConfig,
}

impl ScreenshotClientBuilder {
    /// Create a new client builder.
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(api_key),
        }
    }

    /// Replace the whole configuration, keeping the builder's API key when
    /// the given configuration has none.
    pub fn config(mut self, config: ClientConfig) -> Self {
        let api_key = std::mem::take(&mut self.config.api_key);
        self.config = config;
        if self.config.api_key.is_empty() {
            self.config.api_key = api_key;
        }
        self
    }

    /// Set the service base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the configuration is invalid.
    pub fn build(self) -> Result<ScreenshotClient, ApiError> {
        ScreenshotClient::new(self.config)
    }
}

fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: "URL cannot be used as a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Convert a non-success response into an `ApiError`.
async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| parse_retry_after(value, Utc::now()));

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());

    ApiError::from_status(status, extract_error_message(&body), retry_after)
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`; anything else is returned as-is.
pub(crate) fn extract_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let message = parsed.as_ref().and_then(|value| {
        value
            .get("error")
            .and_then(|error| match error {
                serde_json::Value::String(message) => Some(message.as_str()),
                other => other.get("message").and_then(|m| m.as_str()),
            })
            .or_else(|| value.get("message").and_then(|m| m.as_str()))
    });

    match message {
        Some(message) => message.to_string(),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
