use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use jellysub::types::{Segment, Transcript};
use jellysub::{AppConfig, JobGate, PathMapping, Result, SpeechEngine, SubtitleMuxer};
use jellysub_server::{create_router, AppState};

fn mock_transcript() -> Transcript {
    Transcript {
        segments: vec![Segment {
            start: 0.0,
            end: 1.0,
            text: "mock dialogue".to_string(),
        }],
        language: "en".to_string(),
        duration: 1.0,
        model: "mock".to_string(),
    }
}

struct MockEngine;

#[async_trait]
impl SpeechEngine for MockEngine {
    async fn transcribe(&self, _media: &Path) -> Result<Transcript> {
        Ok(mock_transcript())
    }
}

/// Engine that never finishes, pinning its job's admission permit.
struct StalledEngine;

#[async_trait]
impl SpeechEngine for StalledEngine {
    async fn transcribe(&self, _media: &Path) -> Result<Transcript> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

struct MockMuxer;

#[async_trait]
impl SubtitleMuxer for MockMuxer {
    async fn mux(&self, _media: &Path, _subtitle: &Path, _codec: &str) -> Result<()> {
        Ok(())
    }
}

fn test_config(mapped_root: &Path) -> AppConfig {
    AppConfig {
        path_mappings: vec![PathMapping {
            source: "/mnt/media".to_string(),
            target: mapped_root.to_string_lossy().into_owned(),
            regex: false,
        }],
        srt_suffix: ".en.srt".to_string(),
        mux_subtitles: false,
        ..AppConfig::default()
    }
}

fn state_with(config: AppConfig, engine: Arc<dyn SpeechEngine>) -> AppState {
    let gate = JobGate::new(config.max_concurrent_jobs);
    AppState {
        config: Arc::new(config),
        engine,
        muxer: Arc::new(MockMuxer),
        gate,
    }
}

fn post_transcribe(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_always_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(state_with(test_config(dir.path()), Arc::new(MockEngine)));

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn accepted_job_reports_the_mapped_path_and_writes_the_subtitle() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ep1.mp4"), b"fake media").unwrap();
    let router = create_router(state_with(test_config(dir.path()), Arc::new(MockEngine)));

    let response = router
        .oneshot(post_transcribe(&json!({
            "title": "Some Show",
            "itemId": "item-1",
            "downloadUrl": "http://jellyfin/items/item-1/download",
            "filePath": "/mnt/media/ep1.mp4"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response_json(response).await;
    assert_eq!(body["accepted"], json!(true));
    assert_eq!(
        body["mappedPath"],
        json!(dir.path().join("ep1.mp4").to_string_lossy())
    );

    // the detached worker writes the subtitle shortly after the response
    let srt = dir.path().join("ep1.en.srt");
    for _ in 0..100 {
        if srt.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let content = std::fs::read_to_string(&srt).unwrap();
    assert!(content.contains("mock dialogue"));
}

#[tokio::test]
async fn empty_file_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(state_with(test_config(dir.path()), Arc::new(MockEngine)));

    let response = router
        .oneshot(post_transcribe(&json!({
            "title": "Some Show",
            "itemId": "item-1",
            "filePath": "   "
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["accepted"], json!(false));
    assert_eq!(body["mappedPath"], json!(""));
}

#[tokio::test]
async fn missing_file_path_field_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(state_with(test_config(dir.path()), Arc::new(MockEngine)));

    let response = router
        .oneshot(post_transcribe(&json!({
            "title": "Some Show",
            "itemId": "item-1"
        })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn unmapped_path_is_rejected_without_a_job() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(state_with(test_config(dir.path()), Arc::new(MockEngine)));

    let response = router
        .oneshot(post_transcribe(&json!({
            "title": "Some Show",
            "itemId": "item-1",
            "filePath": "/srv/elsewhere/ep1.mp4"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["accepted"], json!(false));
    assert_eq!(body["mappedPath"], json!(""));
    assert!(body["message"].as_str().unwrap().contains("no path mapping rule"));
}

#[tokio::test]
async fn second_job_is_rejected_while_the_first_is_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ep1.mp4"), b"fake media").unwrap();
    std::fs::write(dir.path().join("ep2.mp4"), b"fake media").unwrap();
    let mut config = test_config(dir.path());
    config.max_concurrent_jobs = 1;
    let router = create_router(state_with(config, Arc::new(StalledEngine)));

    let first = router
        .clone()
        .oneshot(post_transcribe(&json!({
            "title": "Some Show",
            "itemId": "item-1",
            "filePath": "/mnt/media/ep1.mp4"
        })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = router
        .oneshot(post_transcribe(&json!({
            "title": "Some Show",
            "itemId": "item-2",
            "filePath": "/mnt/media/ep2.mp4"
        })))
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response_json(second).await;
    assert_eq!(body["accepted"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("capacity"));
}

#[tokio::test]
async fn existing_subtitle_is_accepted_then_skipped_in_the_background() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ep1.mp4"), b"fake media").unwrap();
    let srt = dir.path().join("ep1.en.srt");
    std::fs::write(&srt, "previous run").unwrap();
    let router = create_router(state_with(test_config(dir.path()), Arc::new(MockEngine)));

    let response = router
        .oneshot(post_transcribe(&json!({
            "title": "Some Show",
            "itemId": "item-1",
            "filePath": "/mnt/media/ep1.mp4"
        })))
        .await
        .unwrap();

    // submission is accepted; the skip is a background outcome, not a refusal
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(std::fs::read_to_string(&srt).unwrap(), "previous run");
}
