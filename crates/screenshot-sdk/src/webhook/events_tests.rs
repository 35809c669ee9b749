//! Tests for webhook event parsing.

use super::*;
use chrono::TimeZone;
use serde_json::json;

// ============================================================================
// Event dispatch
// ============================================================================

#[test]
fn test_screenshot_completed_exposes_summary() {
    let raw = r#"{
        "id": "evt_1",
        "event": "screenshot.completed",
        "timestamp": "2024-01-18T12:00:00Z",
        "data": {
            "screenshot_url": "https://cdn.example.com/shot.png",
            "width": 1280,
            "height": 720
        }
    }"#;

    let event = parse_event(raw).expect("valid event should parse");

    assert_eq!(event.id, "evt_1");
    assert_eq!(event.event_type, WebhookEventType::ScreenshotCompleted);
    assert_eq!(
        event.occurred_at,
        Some(Utc.with_ymd_and_hms(2024, 1, 18, 12, 0, 0).unwrap())
    );
    match event.payload {
        WebhookPayload::ScreenshotCompleted(summary) => {
            assert_eq!(summary.screenshot_url, "https://cdn.example.com/shot.png");
            assert_eq!(summary.width, 1280);
            assert_eq!(summary.height, 720);
            assert_eq!(summary.cached, None);
        }
        other => panic!("Expected ScreenshotCompleted payload, got {:?}", other),
    }
}

#[test]
fn test_screenshot_failed_exposes_reason() {
    let raw = r#"{"id":"evt_2","event":"screenshot.failed","data":{"error":"Navigation timeout","code":"timeout","url":"https://slow.example.com"}}"#;

    let event = parse_event(raw).unwrap();

    assert_eq!(event.event_type, WebhookEventType::ScreenshotFailed);
    assert_eq!(
        event.payload,
        WebhookPayload::ScreenshotFailed(ScreenshotFailed {
            error: "Navigation timeout".to_string(),
            code: Some("timeout".to_string()),
            url: Some("https://slow.example.com".to_string()),
        })
    );
}

#[test]
fn test_batch_events_expose_batch_id() {
    let completed =
        parse_event(r#"{"id":"e","event":"batch.completed","data":{"batch_id":"b_1","total":3,"completed":2,"failed":1}}"#)
            .unwrap();
    let failed =
        parse_event(r#"{"id":"e","event":"batch.failed","data":{"batch_id":"b_2","error":"quota"}}"#).unwrap();

    match completed.payload {
        WebhookPayload::BatchCompleted(batch) => {
            assert_eq!(batch.batch_id, "b_1");
            assert_eq!(batch.total, Some(3));
            assert_eq!(batch.failed, Some(1));
        }
        other => panic!("Expected BatchCompleted payload, got {:?}", other),
    }
    match failed.payload {
        WebhookPayload::BatchFailed(batch) => {
            assert_eq!(batch.batch_id, "b_2");
            assert_eq!(batch.error.as_deref(), Some("quota"));
        }
        other => panic!("Expected BatchFailed payload, got {:?}", other),
    }
}

/// Unrecognized events are not errors; they carry an empty payload.
#[test]
fn test_unknown_event_yields_empty_payload() {
    let raw = r#"{"id":"evt_9","event":"screenshot.queued","data":{"position":4}}"#;

    let event = parse_event(raw).expect("unknown events must still parse");

    assert_eq!(
        event.event_type,
        WebhookEventType::Unknown("screenshot.queued".to_string())
    );
    assert!(!event.event_type.is_known());
    assert_eq!(event.payload, WebhookPayload::Empty);
    assert_eq!(event.data, json!({"position": 4}));
}

#[test]
fn test_missing_data_uses_defaults() {
    let event = parse_event(r#"{"id":"evt_3","event":"screenshot.completed"}"#).unwrap();

    assert_eq!(
        event.payload,
        WebhookPayload::ScreenshotCompleted(ScreenshotCompleted::default())
    );
    assert_eq!(event.occurred_at, None);
}

// ============================================================================
// Input forms
// ============================================================================

#[test]
fn test_accepts_decoded_json() {
    let value = json!({
        "id": "evt_4",
        "event": "batch.completed",
        "timestamp": 1_705_579_200,
        "data": {"batch_id": "b_4"}
    });

    let event = parse_event(&value).unwrap();

    assert_eq!(event.event_type, WebhookEventType::BatchCompleted);
    assert_eq!(event.occurred_at, DateTime::from_timestamp(1_705_579_200, 0));
}

#[test]
fn test_accepts_bytes_and_from_str() {
    let raw = r#"{"id":"evt_5","event":"batch.failed","data":{"batch_id":"b_5"}}"#;

    let from_bytes = parse_event(raw.as_bytes()).unwrap();
    let from_str: WebhookEvent = raw.parse().unwrap();

    assert_eq!(from_bytes, from_str);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_json_is_an_error() {
    let result = parse_event(r#"{"id":"evt","event":"#);
    assert!(matches!(result, Err(WebhookError::Parse(_))));
}

#[test]
fn test_missing_event_name_is_an_error() {
    let result = parse_event(r#"{"id":"evt"}"#);
    assert!(matches!(result, Err(WebhookError::Parse(_))));
}

#[test]
fn test_wrongly_typed_data_is_an_error() {
    let result = parse_event(r#"{"id":"e","event":"screenshot.completed","data":{"width":"wide"}}"#);
    assert!(matches!(result, Err(WebhookError::Parse(_))));
}

#[test]
fn test_bad_timestamp_is_an_error() {
    let result = parse_event(r#"{"id":"e","event":"batch.failed","timestamp":"yesterday"}"#);
    assert!(matches!(result, Err(WebhookError::InvalidTimestamp { .. })));

    let result = parse_event(r#"{"id":"e","event":"batch.failed","timestamp":true}"#);
    assert!(matches!(result, Err(WebhookError::InvalidTimestamp { .. })));
}

// ============================================================================
// Event type names
// ============================================================================

#[test]
fn test_event_type_names_round_trip() {
    for name in [
        "screenshot.completed",
        "screenshot.failed",
        "batch.completed",
        "batch.failed",
        "custom.thing",
    ] {
        assert_eq!(WebhookEventType::from_name(name).as_str(), name);
    }
}

#[test]
fn test_event_serializes_with_wire_event_name() {
    let event = parse_event(r#"{"id":"e","event":"batch.failed","data":{"batch_id":"b"}}"#).unwrap();

    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(value["event"], "batch.failed");
    assert_eq!(value["payload"]["kind"], "batch_failed");
    assert_eq!(value["payload"]["details"]["batch_id"], "b");
}
