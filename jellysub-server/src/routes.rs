use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use jellysub::worker::{self, JobOutcome, TranscriptionJob};
use jellysub::mapping::map_path;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    pub title: String,
    pub item_id: String,
    #[serde(default)]
    pub download_url: Option<String>,
    pub file_path: String,
    /// Overrides the global `overwrite_existing` flag when present.
    #[serde(default)]
    pub overwrite_existing: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
    pub accepted: bool,
    pub message: String,
    pub mapped_path: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/transcribe", post(transcribe_handler))
        .layer(trace_layer)
        .with_state(state)
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Job submission. Maps the source path, tries the admission gate, and on
/// success spawns the worker pipeline as a detached task; the response never
/// waits on transcription.
#[tracing::instrument(skip(state, request), fields(item_id = %request.item_id))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    Json(request): Json<TranscribeRequest>,
) -> (StatusCode, Json<TranscribeResponse>) {
    if request.file_path.trim().is_empty() {
        return rejected(StatusCode::BAD_REQUEST, "filePath must not be empty");
    }

    let mapped = match map_path(&request.file_path, &state.config.path_mappings) {
        Ok(mapped) => mapped,
        Err(e) => {
            tracing::warn!(file_path = %request.file_path, error = %e, "path mapping failed");
            return rejected(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string());
        }
    };

    let permit = match state.gate.try_admit() {
        Ok(permit) => permit,
        Err(e) => {
            tracing::warn!(mapped_path = %mapped, error = %e, "job rejected");
            return rejected(StatusCode::SERVICE_UNAVAILABLE, &e.to_string());
        }
    };

    let job = TranscriptionJob {
        title: request.title,
        item_id: request.item_id,
        media_path: PathBuf::from(&mapped),
        overwrite: request.overwrite_existing,
    };

    let config = Arc::clone(&state.config);
    let engine = Arc::clone(&state.engine);
    let muxer = Arc::clone(&state.muxer);
    tokio::spawn(async move {
        // permit lives as long as the job; dropping it frees the slot
        let _permit = permit;
        match worker::run_job(&job, &config, engine.as_ref(), muxer.as_ref()).await {
            Ok(JobOutcome::Completed { srt_path, muxed }) => {
                tracing::info!(
                    item_id = %job.item_id,
                    srt = %srt_path.display(),
                    muxed,
                    "job completed"
                );
            }
            Ok(JobOutcome::SkippedExisting { srt_path }) => {
                tracing::info!(
                    item_id = %job.item_id,
                    srt = %srt_path.display(),
                    "job skipped, subtitle already present"
                );
            }
            Err(e) => {
                tracing::error!(item_id = %job.item_id, error = %e, "job failed");
            }
        }
    });

    tracing::info!(mapped_path = %mapped, "transcription job accepted");
    (
        StatusCode::ACCEPTED,
        Json(TranscribeResponse {
            accepted: true,
            message: "Transcription started".to_string(),
            mapped_path: mapped,
        }),
    )
}

fn rejected(status: StatusCode, message: &str) -> (StatusCode, Json<TranscribeResponse>) {
    (
        status,
        Json(TranscribeResponse {
            accepted: false,
            message: message.to_string(),
            mapped_path: String::new(),
        }),
    )
}
