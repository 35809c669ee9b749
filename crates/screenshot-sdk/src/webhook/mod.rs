//! Inbound webhook verification and parsing.
//!
//! When a long-running job finishes, the service POSTs a JSON event to the
//! application's webhook URL. This module authenticates those deliveries and
//! turns them into typed [`WebhookEvent`]s.
//!
//! # Core Components
//!
//! - [`WebhookVerifier`] / [`verify`] - HMAC-SHA256 verification with a
//!   freshness window and constant-time comparison
//! - [`HeaderSource`] / [`extract_webhook_headers`] - framework-neutral
//!   header access
//! - [`parse_event`] - typed event decoding with lenient handling of new
//!   event types
//! - [`ReplayStore`] - optional exactly-once acceptance
//!
//! # Usage
//!
//! Always verify against the raw body before decoding it:
//!
//! ```rust
//! use std::collections::HashMap;
//! use screenshot_sdk::clock::FixedClock;
//! use screenshot_sdk::webhook::{compute_signature, WebhookPayload, WebhookVerifier};
//!
//! let body = r#"{"id":"evt_1","event":"screenshot.completed","data":{"screenshot_url":"https://cdn.example.com/a.png","width":800,"height":600}}"#;
//! let headers = HashMap::from([
//!     ("x-webhook-signature".to_string(), compute_signature(body.as_bytes(), "1705579200", "whsec_abc")),
//!     ("x-webhook-timestamp".to_string(), "1705579200".to_string()),
//! ]);
//!
//! let verifier = WebhookVerifier::new("whsec_abc")
//!     .with_clock(FixedClock::from_unix(1_705_579_230).unwrap());
//!
//! let event = verifier.construct_event(&headers, body).expect("authentic delivery");
//! if let WebhookPayload::ScreenshotCompleted(shot) = event.payload {
//!     assert_eq!(shot.width, 800);
//! }
//! ```

pub mod events;
pub mod headers;
pub mod replay;
pub mod verifier;

// Re-export main types
pub use events::{
    parse_event, BatchCompleted, BatchFailed, RawEvent, ScreenshotCompleted, ScreenshotFailed,
    WebhookEvent, WebhookEventType, WebhookPayload,
};
pub use headers::{
    extract_webhook_headers, HeaderSource, WebhookHeaders, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
pub use replay::{InMemoryReplayStore, ReplayKey, ReplayStore};
pub use verifier::{
    compute_signature, verify, verify_with_tolerance, WebhookVerifier, DEFAULT_TOLERANCE,
    SIGNATURE_PREFIX,
};
