//! Batch endpoint tests against a mock detection service.

use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fw_client::{ClientError, DetectClient, DetectClientConfig};
use fw_models::{BatchInput, DetectionParameters, DetectionResult};

const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

fn client_for(server: &MockServer) -> DetectClient {
    DetectClient::new(DetectClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap()
}

fn params() -> DetectionParameters {
    DetectionParameters::new(0.5, 0.45, 640).unwrap()
}

#[tokio::test]
async fn image_detection_returns_annotated_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect/image"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(FAKE_JPEG),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let annotated = client
        .detect_image(vec![1, 2, 3], &params())
        .await
        .unwrap();
    assert_eq!(annotated, FAKE_JPEG);
}

#[tokio::test]
async fn url_detection_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect/url"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "url": "https://example.com/fire.jpg",
            "conf": 0.5,
            "iou": 0.45,
            "imgsz": 640,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_JPEG))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let annotated = client
        .detect_url("https://example.com/fire.jpg", &params())
        .await
        .unwrap();
    assert_eq!(annotated, FAKE_JPEG);
}

#[tokio::test]
async fn video_detection_parses_entries() {
    let server = MockServer::start().await;
    let body = serde_json::json!([{
        "timestamp": 1.2,
        "detections": [{"bbox": [10.0, 20.0, 30.0, 40.0], "confidence": 0.92, "class": "fire"}],
    }]);
    Mock::given(method("POST"))
        .and(path("/detect/video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let entries = client.detect_video(vec![0u8; 64], &params()).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].time_offset_seconds, 1.2);
    assert_eq!(entries[0].detections.len(), 1);
    assert_eq!(entries[0].detections[0].class_name, "fire");
}

#[tokio::test]
async fn submit_normalizes_video_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect/video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"timestamp": 0.0, "detections": []}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .submit(&BatchInput::Video(vec![0u8; 16]), &params())
        .await
        .unwrap();

    let DetectionResult::VideoAnnotation { entries, .. } = result else {
        panic!("expected VideoAnnotation");
    };
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn non_success_status_carries_code_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect/image"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .detect_image(vec![1], &params())
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "model exploded");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn validation_rejects_before_any_network_call() {
    // No mock server: a network attempt would fail differently.
    let client = DetectClient::new(DetectClientConfig {
        base_url: "http://127.0.0.1:1".into(),
        ..Default::default()
    })
    .unwrap();

    let err = client
        .submit(&BatchInput::RemoteUrl(String::new()), &params())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn unreachable_service_yields_network_error() {
    // Port 1 is never listening.
    let client = DetectClient::new(DetectClientConfig {
        base_url: "http://127.0.0.1:1".into(),
        timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .unwrap();

    let err = client
        .submit(
            &BatchInput::RemoteUrl("https://example.com/fire.jpg".into()),
            &params(),
        )
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "expected a transport failure, got {err:?}");
}

#[tokio::test]
async fn out_of_range_params_are_clamped_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect/url"))
        .and(body_json(serde_json::json!({
            "url": "https://example.com/f.jpg",
            "conf": 1.0,
            "iou": 0.1,
            "imgsz": 1280,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_JPEG))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let wild = DetectionParameters {
        confidence: 7.0,
        iou: 0.0,
        image_size: 50_000,
    };
    client
        .submit(&BatchInput::RemoteUrl("https://example.com/f.jpg".into()), &wild)
        .await
        .unwrap();
}

#[tokio::test]
async fn direct_endpoint_calls_clamp_params_too() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect/url"))
        .and(body_json(serde_json::json!({
            "url": "https://example.com/f.jpg",
            "conf": 1.0,
            "iou": 0.1,
            "imgsz": 1280,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_JPEG))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let wild = DetectionParameters {
        confidence: 7.0,
        iou: 0.0,
        image_size: 50_000,
    };
    // Bypassing submit(): the endpoint methods clamp on their own.
    client
        .detect_url("https://example.com/f.jpg", &wild)
        .await
        .unwrap();
}
