//! Signed screenshot URL generation.
//!
//! A signed URL lets a browser or third party fetch a screenshot without
//! holding the API key. The service recomputes the signature over the same
//! canonical message and rejects the request if it differs or has expired,
//! so the canonicalization here is a wire contract:
//!
//! 1. keep only parameters that have a value,
//! 2. render every value in its canonical form (see [`ParamValue::canonical`]),
//! 3. sort keys by byte order and join as `k1=v1&k2=v2` with no URL-encoding,
//! 4. append `&expires=<unix seconds>`,
//! 5. sign with HMAC-SHA256 and append `&signature=<hex>`.
//!
//! # Examples
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use screenshot_sdk::options::ScreenshotOptions;
//! use screenshot_sdk::signing::UrlSigner;
//!
//! let signer = UrlSigner::new("sk_live_123", "https://api.example.com/v1/screenshot");
//! let options = ScreenshotOptions::new("https://example.com").with_width(1280);
//! let expires_at = Utc.timestamp_opt(1_705_579_200, 0).unwrap();
//!
//! let url = signer.sign(&options, expires_at);
//! assert!(url.starts_with(
//!     "https://api.example.com/v1/screenshot?url=https://example.com&width=1280&expires=1705579200&signature="
//! ));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::crypto::hmac_sha256_hex;
use crate::options::{ParamValue, ScreenshotOptions};

/// Build the canonical `key=value&...` string from a parameter map.
///
/// `BTreeMap` iteration order is the byte-wise order of the keys, which is
/// exactly the ordering the service uses.
pub fn canonical_query(parameters: &BTreeMap<String, ParamValue>) -> String {
    parameters
        .iter()
        .map(|(key, value)| format!("{}={}", key, value.canonical()))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the exact message that gets signed: the canonical query followed by
/// `&expires=<seconds>`.
///
/// The expiry is truncated to whole seconds.
pub fn signing_message(parameters: &BTreeMap<String, ParamValue>, expires_at: DateTime<Utc>) -> String {
    format!(
        "{}&expires={}",
        canonical_query(parameters),
        expires_at.timestamp()
    )
}

/// Sign `parameters` and return the complete URL.
///
/// This is a pure function: no validation is performed on the parameter
/// values, which the service checks when the URL is used.
pub fn sign_url(
    parameters: &BTreeMap<String, ParamValue>,
    expires_at: DateTime<Utc>,
    secret: &str,
    endpoint: &str,
) -> String {
    let message = signing_message(parameters, expires_at);
    let signature = hmac_sha256_hex(secret.as_bytes(), message.as_bytes());
    format!("{}?{}&signature={}", endpoint, message, signature)
}

/// Parameters and expiry for a signed URL, assembled incrementally.
///
/// Absent values are dropped on insertion, so the map never contains nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedUrlRequest {
    parameters: BTreeMap<String, ParamValue>,
    expires_at: DateTime<Utc>,
}

impl SignedUrlRequest {
    /// Create an empty request expiring at `expires_at`.
    pub fn new(expires_at: DateTime<Utc>) -> Self {
        Self {
            parameters: BTreeMap::new(),
            expires_at,
        }
    }

    /// Create a request from screenshot options.
    pub fn from_options(options: &ScreenshotOptions, expires_at: DateTime<Utc>) -> Self {
        Self {
            parameters: options.to_params(),
            expires_at,
        }
    }

    /// Create a request from `(key, optional value)` pairs, keeping only the
    /// pairs that carry a value.
    pub fn from_optional_pairs<K, I>(pairs: I, expires_at: DateTime<Utc>) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Option<ParamValue>)>,
    {
        let parameters = pairs
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.into(), v)))
            .collect();

        Self {
            parameters,
            expires_at,
        }
    }

    /// Add a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Add a parameter only when `value` is `Some`.
    pub fn optional_param(self, key: impl Into<String>, value: Option<impl Into<ParamValue>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// The parameters that will be signed.
    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    /// The absolute expiry instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// The message that will be signed.
    pub fn message(&self) -> String {
        signing_message(&self.parameters, self.expires_at)
    }

    /// Sign the request and return the complete URL.
    pub fn sign(&self, secret: &str, endpoint: &str) -> String {
        sign_url(&self.parameters, self.expires_at, secret, endpoint)
    }
}

/// Signs screenshot URLs with a fixed secret and endpoint.
///
/// The secret is the caller's API key, not the webhook signing secret.
#[derive(Clone)]
pub struct UrlSigner {
    secret: String,
    endpoint: String,
}

impl UrlSigner {
    /// Create a signer.
    ///
    /// # Arguments
    ///
    /// * `secret` - API key used as the HMAC key
    /// * `endpoint` - Full screenshot endpoint URL, without a query string
    pub fn new(secret: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            endpoint: endpoint.into(),
        }
    }

    /// The endpoint signed URLs point at.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sign screenshot options.
    pub fn sign(&self, options: &ScreenshotOptions, expires_at: DateTime<Utc>) -> String {
        sign_url(&options.to_params(), expires_at, &self.secret, &self.endpoint)
    }

    /// Sign a prepared request.
    pub fn sign_request(&self, request: &SignedUrlRequest) -> String {
        request.sign(&self.secret, &self.endpoint)
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("secret", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
#[path = "signing_tests.rs"]
mod tests;
