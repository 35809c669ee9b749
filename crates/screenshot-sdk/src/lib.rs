//! # Screenshot SDK
//!
//! Client SDK for a hosted screenshot rendering service.
//!
//! This SDK provides:
//! - Signed screenshot URLs that can be embedded without exposing the API key
//! - Webhook signature verification with a freshness window
//! - Typed webhook event parsing
//! - An API client for screenshots, batch jobs and cache management
//!
//! # Examples
//!
//! ## Signing a URL
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use screenshot_sdk::options::ScreenshotOptions;
//! use screenshot_sdk::signing::UrlSigner;
//!
//! let signer = UrlSigner::new("sk_live_123", "https://api.screenshotapi.example/v1/screenshot");
//! let options = ScreenshotOptions::new("https://example.com").with_width(1280);
//! let expires_at = Utc.timestamp_opt(1_705_579_200, 0).unwrap();
//!
//! let url = signer.sign(&options, expires_at);
//! assert!(url.starts_with(
//!     "https://api.screenshotapi.example/v1/screenshot?url=https://example.com&width=1280&expires=1705579200&signature="
//! ));
//! ```
//!
//! ## Verifying a Webhook
//!
//! ```rust
//! use screenshot_sdk::clock::FixedClock;
//! use screenshot_sdk::webhook::{compute_signature, verify};
//!
//! let body = br#"{"id":"evt_1","event":"screenshot.completed","data":{}}"#;
//! let signature = compute_signature(body, "1705579200", "whsec_abc");
//! let clock = FixedClock::from_unix(1_705_579_260).unwrap();
//!
//! assert!(verify(body, &signature, "1705579200", "whsec_abc", &clock));
//! assert!(!verify(body, &signature, "1705579200", "whsec_other", &clock));
//! ```

// Public modules
pub mod client;
pub mod clock;
pub mod crypto;
pub mod error;
pub mod options;
pub mod signing;
pub mod webhook;

// Re-export commonly used types at crate root for convenience
pub use error::{ApiError, ConfigError, ReplayError, WebhookError};

pub use client::{ClientConfig, Screenshot, ScreenshotClient};
pub use clock::{Clock, FixedClock, SystemClock};
pub use options::{ImageFormat, ParamValue, ScreenshotOptions, WaitUntil};
pub use signing::{sign_url, SignedUrlRequest, UrlSigner};
pub use webhook::{
    parse_event, verify, WebhookEvent, WebhookEventType, WebhookPayload, WebhookVerifier,
};
