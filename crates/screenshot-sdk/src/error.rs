//! Error types for screenshot SDK operations.
//!
//! This module defines the error types used throughout the SDK, with
//! classification for retry logic and enough context for debugging. Webhook
//! signature verification is deliberately absent from this taxonomy: it
//! reports a plain `bool` so that callers cannot tell a stale delivery from a
//! forged one.

use std::time::Duration;

use thiserror::Error;

/// Errors during screenshot service API operations.
///
/// These errors represent failures when communicating with the service,
/// including HTTP errors, rate limiting, and parsing failures. Every non-2xx
/// response is normalized into one of these variants.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP error response not covered by a more specific variant.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// Rate limit exceeded. Operations should wait before retrying.
    #[error("Rate limit exceeded (retry after: {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Request to the service timed out.
    #[error("Request timeout")]
    Timeout,

    /// The request was rejected as invalid (400 / 422).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The API key was missing or rejected (401).
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The API key lacks access to the requested operation (403).
    #[error("Authorization failed: {message}")]
    AuthorizationFailed { message: String },

    /// The requested resource was not found (404).
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Failed to parse a JSON response body.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[source] reqwest::Error),

    /// The client configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ApiError {
    /// Build an error from a non-success HTTP status and the server message.
    pub fn from_status(status: u16, message: String, retry_after: Option<Duration>) -> Self {
        match status {
            400 | 422 => Self::InvalidRequest { message },
            401 => Self::AuthenticationFailed { message },
            403 => Self::AuthorizationFailed { message },
            404 => Self::NotFound { message },
            429 => Self::RateLimitExceeded { retry_after },
            _ => Self::HttpError { status, message },
        }
    }

    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Transient conditions include:
    /// - Server errors (5xx)
    /// - Rate limiting (429)
    /// - Request timeouts
    /// - Network/transport errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500,
            Self::RateLimitExceeded { .. } => true,
            Self::Timeout => true,
            Self::InvalidRequest { .. } => false,
            Self::AuthenticationFailed { .. } => false,
            Self::AuthorizationFailed { .. } => false,
            Self::NotFound { .. } => false,
            Self::JsonError(_) => false,
            Self::HttpClientError(_) => true,
            Self::Configuration(_) => false,
        }
    }

    /// Get the server-recommended retry delay, if any.
    ///
    /// Returns `None` to fall back to the client's backoff policy.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::HttpClientError(err)
        }
    }
}

/// Client configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key was configured.
    #[error("API key is required")]
    MissingApiKey,

    /// The base URL is not an absolute http(s) URL.
    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {message}")]
    HttpClient { message: String },
}

/// Errors while turning an inbound webhook delivery into a typed event.
///
/// Signature, timestamp and freshness failures all collapse into
/// [`WebhookError::InvalidSignature`].
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The delivery failed signature verification.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// The (authenticated) payload is not a well-formed event.
    #[error("Webhook payload parsing failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload carried a timestamp field that is not a valid instant.
    #[error("Invalid event timestamp: {message}")]
    InvalidTimestamp { message: String },

    /// The delivery was already accepted once inside the replay window.
    #[error("Webhook event {event_id} was already processed")]
    Replayed { event_id: String },

    /// The replay store could not be consulted.
    #[error("Replay store error: {0}")]
    Store(#[from] ReplayError),
}

/// Errors raised by a [`ReplayStore`](crate::webhook::ReplayStore).
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The store backend is unavailable.
    #[error("Replay store unavailable: {message}")]
    Unavailable { message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
