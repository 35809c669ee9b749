//! Tests for webhook header extraction.

use super::*;
use reqwest::header::HeaderValue;

#[test]
fn test_single_valued_map() {
    let headers = HashMap::from([
        ("X-Webhook-Signature".to_string(), "sha256=abc".to_string()),
        ("X-Webhook-Timestamp".to_string(), "1705579200".to_string()),
    ]);

    let extracted = extract_webhook_headers(&headers);

    assert_eq!(extracted.signature, "sha256=abc");
    assert_eq!(extracted.timestamp, "1705579200");
}

#[test]
fn test_lookup_is_case_insensitive() {
    let headers = HashMap::from([
        ("x-webhook-signature".to_string(), "sha256=abc".to_string()),
        ("X-WEBHOOK-TIMESTAMP".to_string(), "1705579200".to_string()),
    ]);

    let extracted = extract_webhook_headers(&headers);

    assert_eq!(extracted.signature, "sha256=abc");
    assert_eq!(extracted.timestamp, "1705579200");
}

#[test]
fn test_multi_valued_map_prefers_first_value() {
    let headers: HashMap<String, Vec<String>> = HashMap::from([
        (
            "x-webhook-signature".to_string(),
            vec!["sha256=first".to_string(), "sha256=second".to_string()],
        ),
        ("x-webhook-timestamp".to_string(), vec!["100".to_string()]),
    ]);

    let extracted = extract_webhook_headers(&headers);

    assert_eq!(extracted.signature, "sha256=first");
    assert_eq!(extracted.timestamp, "100");
}

#[test]
fn test_pair_list_prefers_first_value() {
    let headers = vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("x-webhook-timestamp".to_string(), "1".to_string()),
        ("X-Webhook-Timestamp".to_string(), "2".to_string()),
    ];

    assert_eq!(headers.first_of(TIMESTAMP_HEADER), Some("1"));
    assert_eq!(headers.lookup(TIMESTAMP_HEADER), Some("1, 2".to_string()));
    assert_eq!(headers.as_slice().first_of("content-type"), Some("application/json"));
}

#[test]
fn test_http_header_map() {
    let mut headers = HeaderMap::new();
    headers.insert("x-webhook-signature", HeaderValue::from_static("sha256=abc"));
    headers.append("x-webhook-timestamp", HeaderValue::from_static("10"));
    headers.append("x-webhook-timestamp", HeaderValue::from_static("20"));

    let extracted = extract_webhook_headers(&headers);

    assert_eq!(extracted.signature, "sha256=abc");
    assert_eq!(extracted.timestamp, "10");
    assert_eq!(headers.header_values(TIMESTAMP_HEADER), vec!["10", "20"]);
}

#[test]
fn test_header_map_undecodable_first_value_is_kept_in_place() {
    let mut headers = HeaderMap::new();
    headers.append("x-webhook-signature", HeaderValue::from_bytes(b"\xff").unwrap());
    headers.append("x-webhook-signature", HeaderValue::from_static("sha256=second"));

    assert_eq!(headers.first_of(SIGNATURE_HEADER), Some(""));
    assert_eq!(headers.header_values(SIGNATURE_HEADER), vec!["", "sha256=second"]);
    assert_eq!(extract_webhook_headers(&headers).signature, "");
}

#[test]
fn test_case_duplicate_keys_resolve_deterministically() {
    for _ in 0..32 {
        let headers = HashMap::from([
            ("x-webhook-timestamp".to_string(), "lower".to_string()),
            ("X-WEBHOOK-TIMESTAMP".to_string(), "upper".to_string()),
            ("X-Webhook-Timestamp".to_string(), "exact".to_string()),
        ]);

        assert_eq!(headers.first_of(TIMESTAMP_HEADER), Some("exact"));
        assert_eq!(headers.header_values(TIMESTAMP_HEADER), vec!["exact", "upper", "lower"]);
        assert_eq!(headers.first_of("x-webhook-timestamp"), Some("lower"));
    }

    let headers: HashMap<String, Vec<String>> = HashMap::from([
        ("x-webhook-signature".to_string(), vec!["b1".to_string(), "b2".to_string()]),
        ("X-WEBHOOK-SIGNATURE".to_string(), vec!["a1".to_string()]),
    ]);
    assert_eq!(headers.header_values(SIGNATURE_HEADER), vec!["a1", "b1", "b2"]);
}

#[test]
fn test_btree_map() {
    let headers = BTreeMap::from([(
        "X-Webhook-Signature".to_string(),
        "sha256=abc".to_string(),
    )]);

    assert_eq!(headers.first_of("x-webhook-signature"), Some("sha256=abc"));
}

/// Missing headers come back as empty strings rather than errors.
#[test]
fn test_missing_headers_yield_empty_strings() {
    let headers: HashMap<String, String> = HashMap::new();

    let extracted = extract_webhook_headers(&headers);

    assert_eq!(extracted, WebhookHeaders::default());
    assert!(extracted.signature.is_empty());
    assert!(extracted.timestamp.is_empty());
    assert_eq!(headers.lookup(SIGNATURE_HEADER), None);
}

#[test]
fn test_extract_through_trait_object() {
    let headers = HashMap::from([("x-webhook-timestamp".to_string(), "5".to_string())]);
    let source: &dyn HeaderSource = &headers;

    let extracted = extract_webhook_headers(source);

    assert_eq!(extracted.timestamp, "5");
    assert_eq!(extracted.signature, "");
}
