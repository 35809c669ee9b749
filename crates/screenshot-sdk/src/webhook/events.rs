//! Typed webhook events.
//!
//! The service posts JSON of the form:
//!
//! ```json
//! {
//!   "id": "evt_123",
//!   "event": "screenshot.completed",
//!   "timestamp": "2024-01-18T12:00:00Z",
//!   "data": { "screenshot_url": "https://...", "width": 1280, "height": 720 }
//! }
//! ```
//!
//! `event` selects the [`WebhookPayload`] variant that `data` is decoded
//! into. Event names this SDK does not know yet still parse: they become
//! [`WebhookEventType::Unknown`] with an empty payload, and the raw `data`
//! stays available on [`WebhookEvent::data`].
//!
//! Parse only payloads that passed verification; see
//! [`WebhookVerifier::construct_event`](super::WebhookVerifier::construct_event).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::WebhookError;

/// Kind of webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WebhookEventType {
    /// `screenshot.completed`
    ScreenshotCompleted,
    /// `screenshot.failed`
    ScreenshotFailed,
    /// `batch.completed`
    BatchCompleted,
    /// `batch.failed`
    BatchFailed,
    /// Any event name this SDK version does not recognize.
    Unknown(String),
}

impl WebhookEventType {
    /// Map a wire event name onto a type. Never fails.
    pub fn from_name(name: &str) -> Self {
        match name {
            "screenshot.completed" => Self::ScreenshotCompleted,
            "screenshot.failed" => Self::ScreenshotFailed,
            "batch.completed" => Self::BatchCompleted,
            "batch.failed" => Self::BatchFailed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Wire event name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ScreenshotCompleted => "screenshot.completed",
            Self::ScreenshotFailed => "screenshot.failed",
            Self::BatchCompleted => "batch.completed",
            Self::BatchFailed => "batch.failed",
            Self::Unknown(name) => name,
        }
    }

    /// Whether this is one of the known event kinds.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WebhookEventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Summary of a rendered screenshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotCompleted {
    /// Where the rendered artifact can be fetched.
    pub screenshot_url: String,
    pub width: u32,
    pub height: u32,
    /// The page that was captured.
    pub url: Option<String>,
    pub format: Option<String>,
    pub file_size: Option<u64>,
    /// Whether the result came from the server-side cache.
    pub cached: Option<bool>,
}

/// Why a screenshot could not be rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotFailed {
    pub error: String,
    pub code: Option<String>,
    /// The page that was requested.
    pub url: Option<String>,
}

/// A finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchCompleted {
    pub batch_id: String,
    pub total: Option<u32>,
    pub completed: Option<u32>,
    pub failed: Option<u32>,
}

/// A batch that failed as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchFailed {
    pub batch_id: String,
    pub error: Option<String>,
}

/// Event-specific data, selected by [`WebhookEventType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum WebhookPayload {
    ScreenshotCompleted(ScreenshotCompleted),
    ScreenshotFailed(ScreenshotFailed),
    BatchCompleted(BatchCompleted),
    BatchFailed(BatchFailed),
    /// Payload of an unrecognized event type.
    Empty,
}

/// A parsed webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    /// Server-assigned event identifier.
    pub id: String,

    #[serde(rename = "event")]
    pub event_type: WebhookEventType,

    /// When the event happened, from the payload's own `timestamp` field.
    /// This is unrelated to the `X-Webhook-Timestamp` signing time.
    pub occurred_at: Option<DateTime<Utc>>,

    pub payload: WebhookPayload,

    /// The raw `data` object, kept for fields this SDK does not model.
    pub data: Value,
}

#[derive(Deserialize)]
struct RawEnvelope {
    id: String,
    event: String,
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    data: Value,
}

/// Input accepted by [`parse_event`]: the raw body or an already decoded
/// JSON value.
#[derive(Debug, Clone, Copy)]
pub enum RawEvent<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Json(&'a Value),
}

impl<'a> From<&'a str> for RawEvent<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for RawEvent<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a [u8]> for RawEvent<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

impl<'a> From<&'a Value> for RawEvent<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Json(value)
    }
}

/// Parse a webhook body into a [`WebhookEvent`].
///
/// # Errors
///
/// * [`WebhookError::Parse`] - the body is not JSON, lacks `id`/`event`, or
///   `data` has the wrong shape for a known event
/// * [`WebhookError::InvalidTimestamp`] - `timestamp` is present but is
///   neither RFC 3339 text nor integer Unix seconds
pub fn parse_event<'a>(input: impl Into<RawEvent<'a>>) -> Result<WebhookEvent, WebhookError> {
    let envelope: RawEnvelope = match input.into() {
        RawEvent::Text(text) => serde_json::from_str(text)?,
        RawEvent::Bytes(bytes) => serde_json::from_slice(bytes)?,
        RawEvent::Json(value) => RawEnvelope::deserialize(value)?,
    };

    let event_type = WebhookEventType::from_name(&envelope.event);
    let occurred_at = parse_occurred_at(&envelope.timestamp)?;
    let payload = decode_payload(&event_type, &envelope.data)?;

    Ok(WebhookEvent {
        id: envelope.id,
        event_type,
        occurred_at,
        payload,
        data: envelope.data,
    })
}

impl FromStr for WebhookEvent {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_event(s)
    }
}

fn decode_payload(event_type: &WebhookEventType, data: &Value) -> Result<WebhookPayload, WebhookError> {
    // A missing `data` decodes like an empty object so that defaults apply.
    let empty = Value::Object(serde_json::Map::new());
    let data = if data.is_null() { &empty } else { data };

    let payload = match event_type {
        WebhookEventType::ScreenshotCompleted => {
            WebhookPayload::ScreenshotCompleted(ScreenshotCompleted::deserialize(data)?)
        }
        WebhookEventType::ScreenshotFailed => {
            WebhookPayload::ScreenshotFailed(ScreenshotFailed::deserialize(data)?)
        }
        WebhookEventType::BatchCompleted => {
            WebhookPayload::BatchCompleted(BatchCompleted::deserialize(data)?)
        }
        WebhookEventType::BatchFailed => WebhookPayload::BatchFailed(BatchFailed::deserialize(data)?),
        WebhookEventType::Unknown(_) => WebhookPayload::Empty,
    };

    Ok(payload)
}

fn parse_occurred_at(value: &Value) -> Result<Option<DateTime<Utc>>, WebhookError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|instant| Some(instant.with_timezone(&Utc)))
            .map_err(|e| WebhookError::InvalidTimestamp {
                message: format!("'{}' is not RFC 3339: {}", text, e),
            }),
        Value::Number(number) => number
            .as_i64()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            .map(Some)
            .ok_or_else(|| WebhookError::InvalidTimestamp {
                message: format!("{} is not a valid Unix timestamp", number),
            }),
        other => Err(WebhookError::InvalidTimestamp {
            message: format!("unexpected timestamp value: {}", other),
        }),
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
