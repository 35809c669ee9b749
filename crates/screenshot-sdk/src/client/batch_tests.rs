//! Tests for batch operations.

use super::*;
use crate::client::{ClientConfig, API_KEY_HEADER};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> ScreenshotClient {
    let config = ClientConfig::new("sk_test")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_max_retries(0)
        .with_retry_delays(Duration::from_millis(1), Duration::from_millis(5));
    ScreenshotClient::new(config).expect("client builds")
}

mod types {
    use super::*;

    #[test]
    fn test_request_serializes_options_as_flat_params() {
        let request = BatchRequest::new()
            .with_request(ScreenshotOptions::new("https://a.example").with_width(640))
            .with_webhook_url("https://hooks.example/screens");

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "requests": [{"url": "https://a.example", "width": 640}],
                "webhook_url": "https://hooks.example/screens"
            })
        );
    }

    #[test]
    fn test_webhook_url_is_omitted_when_unset() {
        let request = BatchRequest::new().with_request(ScreenshotOptions::new("https://a.example"));
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("webhook_url").is_none());
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let job: BatchJob = serde_json::from_value(serde_json::json!({
            "id": "batch_1",
            "status": "archived"
        }))
        .unwrap();

        assert_eq!(job.status, BatchStatus::Unknown);
        assert_eq!(job.total, 0);
        assert!(job.items.is_empty());
    }

    #[test]
    fn test_terminal_states() {
        assert!(BatchStatus::Completed.is_terminal());
        assert!(BatchStatus::Failed.is_terminal());
        assert!(!BatchStatus::Pending.is_terminal());
        assert!(!BatchStatus::Processing.is_terminal());
    }
}

mod operations {
    use super::*;

    #[tokio::test]
    async fn test_submit_batch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/screenshot/batch"))
            .and(header(API_KEY_HEADER, "sk_test"))
            .and(body_json(serde_json::json!({
                "requests": [
                    {"url": "https://a.example"},
                    {"url": "https://b.example", "format": "jpeg"}
                ]
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "id": "batch_123",
                "status": "pending",
                "total": 2,
                "created_at": "2024-01-18T12:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let request = BatchRequest::new()
            .with_request(ScreenshotOptions::new("https://a.example"))
            .with_request(
                ScreenshotOptions::new("https://b.example")
                    .with_format(crate::options::ImageFormat::Jpeg),
            );

        let job = client.submit_batch(&request).await.expect("submit succeeds");

        assert_eq!(job.id, "batch_123");
        assert_eq!(job.status, BatchStatus::Pending);
        assert_eq!(job.total, 2);
        assert!(job.created_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected_locally() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        let err = client.submit_batch(&BatchRequest::new()).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidRequest { .. }));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_batch_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/screenshot/batch/batch_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "batch_123",
                "status": "completed",
                "total": 2,
                "completed": 1,
                "failed": 1,
                "items": [
                    {"url": "https://a.example", "status": "completed", "screenshot_url": "https://cdn.example/a.png"},
                    {"url": "https://b.example", "status": "failed", "error": "navigation timeout"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let job = client.batch_status("batch_123").await.expect("status succeeds");

        assert!(job.status.is_terminal());
        assert_eq!(job.completed, 1);
        assert_eq!(job.failed, 1);
        assert_eq!(job.items[1].error.as_deref(), Some("navigation timeout"));
    }

    #[tokio::test]
    async fn test_unknown_batch_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/screenshot/batch/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": {"message": "batch not found"}})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.batch_status("missing").await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound { ref message } if message == "batch not found"));
    }
}
