use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use airgauge_ocr::{MonitorPipeline, PipelineError, PreprocessError, Reading, Recognizer};

use crate::spa;

/// Upper bound on uploaded photo size.
const UPLOAD_LIMIT_BYTES: usize = 25 * 1024 * 1024;

/// Multipart field the client uploads the photo under.
const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MonitorPipeline<Box<dyn Recognizer>>>,
    pub frontend_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/process", post(process_image))
        .route("/api/health", get(health))
        .fallback(spa::serve)
        // The axum default limit is replaced by the tower-http layer so the
        // multipart reader honors the configured upload bound.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(UPLOAD_LIMIT_BYTES))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Responses ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ProcessResponse {
    #[serde(flatten)]
    reading: Reading,
    timestamp: String,
    processed_image: String,
    status: &'static str,
}

/// Body for in-pipeline failures. These go out with HTTP 200; clients are
/// expected to inspect `status` rather than the transport code.
#[derive(Serialize)]
struct ProcessFailure {
    status: &'static str,
    message: String,
}

#[derive(Serialize)]
struct RejectDetail {
    detail: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    time: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", time: Utc::now().to_rfc3339() })
}

async fn process_image(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let data = match read_upload(&mut multipart).await {
        Ok(data) => data,
        Err(detail) => return reject(detail),
    };

    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.process_bytes(&data)).await;

    match result {
        Ok(Ok(output)) => {
            tracing::debug!(
                fragments = output.fragments.len(),
                aqi = %output.reading.aqi,
                "recognition complete"
            );
            Json(ProcessResponse {
                reading: output.reading,
                timestamp: Utc::now().to_rfc3339(),
                processed_image: format!(
                    "data:image/png;base64,{}",
                    STANDARD.encode(&output.processed_png)
                ),
                status: "success",
            })
            .into_response()
        }
        Ok(Err(PipelineError::Preprocess(PreprocessError::Load(e)))) => {
            tracing::warn!("Rejected upload, image decode failed: {e}");
            reject("Invalid image format".into())
        }
        Ok(Err(e)) => {
            tracing::error!("Error processing image: {e}");
            Json(ProcessFailure { status: "error", message: e.to_string() }).into_response()
        }
        Err(e) => {
            tracing::error!("Pipeline task failed: {e}");
            Json(ProcessFailure { status: "error", message: e.to_string() }).into_response()
        }
    }
}

/// Pull the uploaded image bytes out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Unreadable multipart body: {e}"))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            return field
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| format!("Failed to read upload: {e}"));
        }
    }
    Err(format!("Missing `{UPLOAD_FIELD}` field in multipart body"))
}

fn reject(detail: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(RejectDetail { detail })).into_response()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
