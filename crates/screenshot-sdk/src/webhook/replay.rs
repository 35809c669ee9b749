//! Optional replay protection for webhook deliveries.
//!
//! Signature verification is stateless, so a delivery captured inside the
//! tolerance window can be replayed until the window closes. Applications
//! that need exactly-once acceptance pass a [`ReplayStore`] to
//! [`WebhookVerifier::construct_event_once`](super::WebhookVerifier::construct_event_once),
//! which records each `(event id, timestamp)` pair it accepts.
//!
//! [`InMemoryReplayStore`] suits a single process. Deployments with several
//! receivers implement the trait over shared storage.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ReplayError;

/// Identity of a delivery for replay detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplayKey {
    pub event_id: String,
    pub timestamp: String,
}

impl ReplayKey {
    /// Build a key from an event id and the signing timestamp header.
    pub fn new(event_id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Records which deliveries were already accepted.
#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// Record `key` for `ttl`.
    ///
    /// Returns `true` if the key was not present (first delivery) and
    /// `false` if it was already recorded and has not expired.
    async fn check_and_record(&self, key: &ReplayKey, ttl: Duration) -> Result<bool, ReplayError>;
}

/// Process-local [`ReplayStore`].
///
/// Expired keys are pruned on every call, so memory stays bounded by the
/// delivery rate times the TTL. A TTL too large to represent as an
/// [`Instant`] never expires.
#[derive(Debug, Default)]
pub struct InMemoryReplayStore {
    // `None` marks a key recorded with an unrepresentable expiry.
    seen: Mutex<HashMap<ReplayKey, Option<Instant>>>,
}

impl InMemoryReplayStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently remembered, including any not yet pruned.
    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    /// Whether the store remembers no keys.
    pub async fn is_empty(&self) -> bool {
        self.seen.lock().await.is_empty()
    }
}

#[async_trait]
impl ReplayStore for InMemoryReplayStore {
    async fn check_and_record(&self, key: &ReplayKey, ttl: Duration) -> Result<bool, ReplayError> {
        let now = Instant::now();
        let mut seen = self.seen.lock().await;

        seen.retain(|_, expires_at| !matches!(expires_at, Some(at) if *at <= now));

        if seen.contains_key(key) {
            return Ok(false);
        }

        seen.insert(key.clone(), now.checked_add(ttl));
        Ok(true)
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
