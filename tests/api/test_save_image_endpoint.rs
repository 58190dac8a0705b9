// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! POST /save_image and the capture store behind it

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use fabstir_detect_node::storage::CaptureStore;
use std::sync::Arc;
use tower::ServiceExt;

use super::helpers::{
    app_with, body_json, multipart_body, multipart_request, png_bytes, upload_request,
    StubDetector,
};

#[tokio::test]
async fn test_save_writes_bytes_verbatim() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), tmp.path());
    let upload = png_bytes(32, 16);

    let response = app
        .oneshot(upload_request("/save_image", &upload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["message"].is_string());

    let filename = json["filename"].as_str().unwrap();
    assert!(filename.starts_with("capture_"));
    assert!(filename.ends_with(".jpg"));
    // capture_YYYYMMDD_HHMMSS.jpg
    assert_eq!(filename.len(), "capture_20240101_000000.jpg".len());

    let saved = std::fs::read(json["filepath"].as_str().unwrap()).unwrap();
    assert_eq!(saved, upload);
}

#[tokio::test]
async fn test_save_does_not_validate_format() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), tmp.path());

    let response = app
        .oneshot(upload_request("/save_image", b"plain text payload"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let saved = std::fs::read(json["filepath"].as_str().unwrap()).unwrap();
    assert_eq!(saved, b"plain text payload");
}

#[tokio::test]
async fn test_save_creates_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let capture_dir = tmp.path().join("captured_images");
    let app = app_with(Arc::new(StubDetector::new(vec![])), &capture_dir);

    let response = app
        .oneshot(upload_request("/save_image", &png_bytes(8, 8)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(capture_dir.is_dir());
}

#[tokio::test]
async fn test_save_without_field_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), tmp.path());

    let body = multipart_body("file", "frame.png", &png_bytes(8, 8));
    let response = app
        .oneshot(multipart_request("/save_image", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].is_string());
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_save_empty_field_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), tmp.path());

    let response = app.oneshot(upload_request("/save_image", b"")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_save_failure_is_server_error() {
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the capture directory should be
    let blocker = tmp.path().join("captured_images");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let app = app_with(Arc::new(StubDetector::new(vec![])), &blocker);

    let response = app
        .oneshot(upload_request("/save_image", &png_bytes(8, 8)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("error saving image"));
    assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");
}

#[tokio::test]
async fn test_same_second_saves_share_filename() {
    let tmp = tempfile::tempdir().unwrap();
    let store = CaptureStore::new(tmp.path());
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 45).unwrap();

    let first = store.save_at(b"first", at).await.unwrap();
    let second = store.save_at(b"second", at).await.unwrap();

    assert_eq!(first.filename, "capture_20250601_123045.jpg");
    assert_eq!(first.filename, second.filename);
    assert_eq!(std::fs::read(&second.filepath).unwrap(), b"second");
}
