// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! POST /detect through the real router with stub detectors

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use super::helpers::{
    app_with, app_with_limit, app_with_workers, body_json, multipart_body, multipart_request,
    png_bytes, raw, upload_request, FailingDetector, SlowDetector, StubDetector,
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[tokio::test]
async fn test_detect_returns_detections() {
    let tmp = tempfile::tempdir().unwrap();
    let detector = Arc::new(StubDetector::new(vec![
        raw("person", 0.92, [10.0, 20.0, 40.0, 60.0]),
        raw("clock", 0.75, [0.0, 0.0, 15.0, 15.0]),
    ]));
    let app = app_with(detector, tmp.path());

    let response = app
        .oneshot(upload_request("/detect", &png_bytes(300, 200)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["image_size"]["width"], 300);
    assert_eq!(json["image_size"]["height"], 200);

    let detections = json["detections"].as_array().unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0]["class"], "person");

    for det in detections {
        let confidence = det["confidence"].as_f64().unwrap();
        assert!(confidence > 0.6 && confidence <= 1.0);

        let bbox: Vec<f64> = det["bbox"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert_eq!(bbox.len(), 4);
        assert!(bbox[0] <= bbox[2] && bbox[1] <= bbox[3]);
    }
}

#[tokio::test]
async fn test_boxes_rescaled_to_original_size() {
    let tmp = tempfile::tempdir().unwrap();
    let detector = Arc::new(StubDetector::new(vec![raw(
        "person",
        0.9,
        [10.0, 20.0, 40.0, 60.0],
    )]));
    let app = app_with(detector.clone(), tmp.path());

    let response = app
        .oneshot(upload_request("/detect", &png_bytes(300, 200)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Model saw the 30% copy
    assert_eq!(detector.seen_sizes(), vec![(90, 60)]);

    let json = body_json(response).await;
    let bbox = json["detections"][0]["bbox"].as_array().unwrap();
    let factor = 100.0 / 30.0;
    assert_close(bbox[0].as_f64().unwrap(), 10.0 * factor);
    assert_close(bbox[1].as_f64().unwrap(), 20.0 * factor);
    assert_close(bbox[2].as_f64().unwrap(), 40.0 * factor);
    assert_close(bbox[3].as_f64().unwrap(), 60.0 * factor);
}

#[tokio::test]
async fn test_confidence_threshold_is_strict() {
    let tmp = tempfile::tempdir().unwrap();
    let detector = Arc::new(StubDetector::new(vec![
        raw("cat", 0.5, [0.0, 0.0, 5.0, 5.0]),
        raw("cat", 0.6, [10.0, 10.0, 15.0, 15.0]),
        raw("cat", 0.61, [20.0, 20.0, 25.0, 25.0]),
    ]));
    let app = app_with(detector, tmp.path());

    let response = app
        .oneshot(upload_request("/detect", &png_bytes(100, 100)))
        .await
        .unwrap();

    let json = body_json(response).await;
    let detections = json["detections"].as_array().unwrap();
    assert_eq!(detections.len(), 1);
    assert_close(detections[0]["confidence"].as_f64().unwrap(), 0.61);
}

#[tokio::test]
async fn test_duplicate_corner_reported_once() {
    let tmp = tempfile::tempdir().unwrap();
    let detector = Arc::new(StubDetector::new(vec![
        raw("cat", 0.8, [10.2, 20.7, 30.0, 40.0]),
        raw("cat", 0.9, [10.9, 20.1, 31.0, 41.0]),
        raw("dog", 0.7, [10.5, 20.5, 30.0, 40.0]),
    ]));
    let app = app_with(detector, tmp.path());

    let response = app
        .oneshot(upload_request("/detect", &png_bytes(100, 100)))
        .await
        .unwrap();

    let json = body_json(response).await;
    let detections = json["detections"].as_array().unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0]["class"], "cat");
    assert_close(detections[0]["confidence"].as_f64().unwrap(), 0.8);
    assert_eq!(detections[1]["class"], "dog");
}

#[tokio::test]
async fn test_no_detections_is_success() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), tmp.path());

    let response = app
        .oneshot(upload_request("/detect", &png_bytes(64, 64)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert!(json["detections"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_image_upload_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let detector = Arc::new(StubDetector::new(vec![]));
    let app = app_with(detector.clone(), tmp.path());

    let response = app
        .oneshot(upload_request("/detect", b"definitely not an image"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("could not decode image"));
    assert!(detector.seen_sizes().is_empty());
}

#[tokio::test]
async fn test_empty_image_field_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), tmp.path());

    let response = app.oneshot(upload_request("/detect", b"")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn test_missing_image_field_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), tmp.path());

    let body = multipart_body("photo", "frame.png", &png_bytes(10, 10));
    let response = app
        .oneshot(multipart_request("/detect", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_non_multipart_body_gets_json_error() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), tmp.path());

    let request = Request::builder()
        .method("POST")
        .uri("/detect")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn test_inference_failure_is_server_error() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(FailingDetector), tmp.path());

    let response = app
        .oneshot(upload_request("/detect", &png_bytes(50, 50)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("session run failed"));
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with_limit(Arc::new(StubDetector::new(vec![])), tmp.path(), 1024);

    let response = app
        .oneshot(upload_request("/detect", &vec![0u8; 8 * 1024]))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

async fn run_two_detections(detector: Arc<SlowDetector>, workers: usize) {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with_workers(detector, tmp.path(), workers);
    let upload = png_bytes(40, 40);

    let (first, second) = tokio::join!(
        app.clone().oneshot(upload_request("/detect", &upload)),
        app.oneshot(upload_request("/detect", &upload)),
    );

    assert_eq!(first.unwrap().status(), StatusCode::OK);
    assert_eq!(second.unwrap().status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_workers_run_inferences_concurrently() {
    let detector = Arc::new(SlowDetector::default());
    run_two_detections(detector.clone(), 2).await;
    assert_eq!(detector.peak(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_worker_serializes_inference() {
    let detector = Arc::new(SlowDetector::default());
    run_two_detections(detector.clone(), 1).await;
    assert_eq!(detector.peak(), 1);
}
