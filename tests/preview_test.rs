mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{multipart_body, setup_app};
use genai_tools::services::preview::Preview;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::Ordering;
use tower::ServiceExt;

async fn stage_file(test: &common::TestApp, key: &str, data: &[u8]) {
    test.state
        .stages
        .ensure_stage_exists("images_stage")
        .await
        .unwrap();
    test.state
        .uploads
        .upload("images_stage", key, data.to_vec())
        .await
        .unwrap();
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn test_tab_separated_preview() {
    let test = setup_app();
    stage_file(&test, "rows.csv", b"a\tb\nc\td").await;

    let (status, _, body) = get(&test.app, "/stages/images_stage/objects/rows.csv/preview").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["kind"], "table");
    assert_eq!(json["table"]["rows"], serde_json::json!([["a", "b"], ["c", "d"]]));
    assert_eq!(json["table"]["columns"], 2);
    assert_eq!(json["table"]["encoding"], "utf8");
}

#[tokio::test]
async fn test_latin1_text_falls_back() {
    let test = setup_app();
    stage_file(&test, "prices.txt", b"caf\xE9\t3.50\nth\xE9\t2.00\n").await;

    let preview = test
        .state
        .previews
        .preview("images_stage", "prices.txt")
        .await
        .unwrap();

    match preview {
        Preview::Table { table } => {
            assert_eq!(table.rows[1][0], "thé");
            assert_eq!(table.total_rows, 2);
        }
        other => panic!("expected a table, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unsupported_extension_is_never_read() {
    let test = setup_app();
    stage_file(&test, "setup.exe", b"MZ\x90\x00").await;
    let gets_before = test.store.gets();

    let (status, _, body) = get(&test.app, "/stages/images_stage/objects/setup.exe/preview").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["kind"], "unsupported");
    assert_eq!(json["extension"], ".exe");
    assert_eq!(test.store.gets(), gets_before);
}

#[tokio::test]
async fn test_image_preview_reports_content_type() {
    let test = setup_app();
    stage_file(&test, "cat.png", b"\x89PNG\r\n\x1a\n0000").await;

    let (status, _, body) = get(&test.app, "/stages/images_stage/objects/cat.png/preview").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["kind"], "image");
    assert_eq!(json["content_type"], "image/png");
    assert_eq!(json["size"], 12);
}

#[tokio::test]
async fn test_binary_text_file_is_unprocessable() {
    let test = setup_app();
    stage_file(&test, "broken.txt", b"\x00\x01\x02\x03").await;

    let (status, _, body) = get(&test.app, "/stages/images_stage/objects/broken.txt/preview").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("broken.txt"));
}

#[tokio::test]
async fn test_failed_preview_does_not_fail_upload() {
    let test = setup_app();
    let boundary = "----preview-boundary";

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/stages/images_stage/objects")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(multipart_body(boundary, "empty.tsv", b"")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["object"]["size"], 0);
    assert_eq!(json["preview"]["status"], "failed");
}

#[tokio::test]
async fn test_direct_render_returns_raw_bytes() {
    let test = setup_app();
    let jpeg = b"\xFF\xD8\xFF\xE0fake-jpeg";
    stage_file(&test, "cat.jpg", jpeg).await;

    let (status, headers, body) = get(&test.app, "/stages/images_stage/objects/cat.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "inline");
    assert_eq!(body, jpeg.to_vec());
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let test = setup_app();
    test.state
        .stages
        .ensure_stage_exists("images_stage")
        .await
        .unwrap();

    let (status, _, _) = get(&test.app, "/stages/images_stage/objects/ghost.csv").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&test.app, "/stages/images_stage/objects/ghost.csv/preview").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(test.store.get_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_object_in_missing_stage_is_not_found() {
    let test = setup_app();

    let (status, _, body) = get(&test.app, "/stages/never_made/objects/a.csv").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("never_made"));

    let (status, _, _) = get(&test.app, "/stages/never_made/objects/a.csv/preview").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
