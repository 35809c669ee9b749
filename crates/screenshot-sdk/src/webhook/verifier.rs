//! Webhook signature verification.
//!
//! Deliveries carry `X-Webhook-Signature: sha256=<hex>` and
//! `X-Webhook-Timestamp: <unix seconds>`. The signature is HMAC-SHA256 over
//! `"<timestamp>.<raw body>"` keyed with the webhook signing secret.
//!
//! Verification is a single pass that stops at the first failing check:
//!
//! 1. every input must be non-empty,
//! 2. the timestamp must parse as an integer,
//! 3. it must lie within the tolerance window of "now" (either direction),
//! 4. the recomputed signature must match in constant time.
//!
//! Every failure yields the same `false`, so a caller (or an attacker
//! watching the caller) cannot tell a stale delivery from a forged one.
//! Verification keeps no state; replay protection beyond the time window is
//! available through [`ReplayStore`](super::ReplayStore).

use std::time::Duration;

use tracing::{debug, warn};

use super::events::{parse_event, WebhookEvent};
use super::headers::{extract_webhook_headers, HeaderSource, WebhookHeaders};
use super::replay::{ReplayKey, ReplayStore};
use crate::clock::{Clock, SystemClock};
use crate::crypto::{constant_time_eq, hmac_sha256_hex};
use crate::error::WebhookError;

/// Default freshness window for webhook timestamps (5 minutes).
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the signature header value for a payload and timestamp.
///
/// This is what the service sends; it is exposed for tests and for tools
/// that replay deliveries locally.
pub fn compute_signature(payload: &[u8], timestamp: &str, secret: &str) -> String {
    let mut message = Vec::with_capacity(timestamp.len() + 1 + payload.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.push(b'.');
    message.extend_from_slice(payload);

    format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hmac_sha256_hex(secret.as_bytes(), &message)
    )
}

/// Verify a delivery using the default tolerance window.
///
/// # Arguments
///
/// * `payload` - The raw body exactly as received, before any JSON decoding
/// * `signature` - Value of the `X-Webhook-Signature` header
/// * `timestamp` - Value of the `X-Webhook-Timestamp` header
/// * `secret` - The webhook signing secret
/// * `clock` - Source of "now" for the freshness check
pub fn verify(
    payload: impl AsRef<[u8]>,
    signature: &str,
    timestamp: &str,
    secret: &str,
    clock: &dyn Clock,
) -> bool {
    verify_with_tolerance(payload, signature, timestamp, secret, clock, DEFAULT_TOLERANCE)
}

/// Verify a delivery with an explicit tolerance window.
///
/// A timestamp exactly `tolerance` away from now is still accepted.
pub fn verify_with_tolerance(
    payload: impl AsRef<[u8]>,
    signature: &str,
    timestamp: &str,
    secret: &str,
    clock: &dyn Clock,
    tolerance: Duration,
) -> bool {
    let payload = payload.as_ref();

    if payload.is_empty() || signature.is_empty() || timestamp.is_empty() || secret.is_empty() {
        debug!("Webhook rejected: missing payload, signature, timestamp or secret");
        return false;
    }

    let sent_at = match timestamp.parse::<i64>() {
        Ok(seconds) => seconds,
        Err(_) => {
            debug!("Webhook rejected: timestamp is not an integer");
            return false;
        }
    };

    let now = clock.now().timestamp();
    let skew = now.abs_diff(sent_at);
    if skew > tolerance.as_secs() {
        debug!(
            skew_seconds = skew,
            tolerance_seconds = tolerance.as_secs(),
            "Webhook rejected: timestamp outside tolerance window"
        );
        return false;
    }

    let expected = compute_signature(payload, timestamp, secret);
    let valid = constant_time_eq(expected.as_bytes(), signature.as_bytes());
    if !valid {
        debug!("Webhook rejected: signature mismatch");
    }

    valid
}

/// Verifies webhook deliveries with a fixed secret, tolerance and clock.
///
/// # Examples
///
/// ```rust
/// use screenshot_sdk::clock::FixedClock;
/// use screenshot_sdk::webhook::{compute_signature, WebhookVerifier};
///
/// let payload = r#"{"event":"screenshot.completed","id":"req_abc123"}"#;
/// let signature = compute_signature(payload.as_bytes(), "1705579200", "whsec_test");
///
/// let verifier = WebhookVerifier::new("whsec_test")
///     .with_clock(FixedClock::from_unix(1_705_579_200).unwrap());
///
/// assert!(verifier.verify(payload, &signature, "1705579200"));
/// ```
#[derive(Clone)]
pub struct WebhookVerifier<C = SystemClock> {
    secret: String,
    tolerance: Duration,
    clock: C,
}

impl WebhookVerifier<SystemClock> {
    /// Create a verifier using the system clock and the default tolerance.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance: DEFAULT_TOLERANCE,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> WebhookVerifier<C> {
    /// Override the freshness window.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Replace the clock used for freshness checks.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> WebhookVerifier<C2> {
        WebhookVerifier {
            secret: self.secret,
            tolerance: self.tolerance,
            clock,
        }
    }

    /// The configured freshness window.
    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verify a delivery from its raw parts.
    pub fn verify(&self, payload: impl AsRef<[u8]>, signature: &str, timestamp: &str) -> bool {
        verify_with_tolerance(
            payload,
            signature,
            timestamp,
            &self.secret,
            &self.clock,
            self.tolerance,
        )
    }

    /// Verify a delivery, reading signature and timestamp from its headers.
    pub fn verify_headers<H>(&self, headers: &H, payload: impl AsRef<[u8]>) -> bool
    where
        H: HeaderSource + ?Sized,
    {
        let WebhookHeaders {
            signature,
            timestamp,
        } = extract_webhook_headers(headers);
        self.verify(payload, &signature, &timestamp)
    }

    /// Verify a delivery and parse it into a typed event.
    ///
    /// Verification always runs against the raw bytes before any decoding.
    ///
    /// # Errors
    ///
    /// * [`WebhookError::InvalidSignature`] - the delivery failed verification
    /// * [`WebhookError::Parse`] / [`WebhookError::InvalidTimestamp`] - the
    ///   authenticated body is not a well-formed event
    pub fn construct_event<H>(
        &self,
        headers: &H,
        payload: impl AsRef<[u8]>,
    ) -> Result<WebhookEvent, WebhookError>
    where
        H: HeaderSource + ?Sized,
    {
        self.verified_event(headers, payload.as_ref())
            .map(|(event, _)| event)
    }

    /// Like [`construct_event`](Self::construct_event), but also rejects a
    /// delivery whose `(event id, timestamp)` pair was already accepted.
    ///
    /// Keys are remembered for twice the tolerance window, which covers every
    /// timestamp that could still pass the freshness check.
    ///
    /// # Errors
    ///
    /// In addition to the errors of `construct_event`:
    ///
    /// * [`WebhookError::Replayed`] - the delivery was seen before
    /// * [`WebhookError::Store`] - the store could not be consulted
    pub async fn construct_event_once<H>(
        &self,
        headers: &H,
        payload: impl AsRef<[u8]>,
        store: &dyn ReplayStore,
    ) -> Result<WebhookEvent, WebhookError>
    where
        H: HeaderSource + ?Sized,
    {
        let (event, timestamp) = self.verified_event(headers, payload.as_ref())?;

        let key = ReplayKey::new(event.id.clone(), timestamp);
        if !store.check_and_record(&key, self.tolerance.saturating_mul(2)).await? {
            warn!(event_id = %event.id, "Rejecting replayed webhook delivery");
            return Err(WebhookError::Replayed {
                event_id: event.id,
            });
        }

        Ok(event)
    }

    fn verified_event<H>(
        &self,
        headers: &H,
        payload: &[u8],
    ) -> Result<(WebhookEvent, String), WebhookError>
    where
        H: HeaderSource + ?Sized,
    {
        let WebhookHeaders {
            signature,
            timestamp,
        } = extract_webhook_headers(headers);

        if !self.verify(payload, &signature, &timestamp) {
            return Err(WebhookError::InvalidSignature);
        }

        let event = parse_event(payload)?;
        Ok((event, timestamp))
    }
}

// Security: Don't expose secrets in debug output
impl<C> std::fmt::Debug for WebhookVerifier<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"<REDACTED>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

#[cfg(test)]
#[path = "verifier_tests.rs"]
mod tests;
