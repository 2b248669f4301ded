// ==============================================================================
// handlers.rs - API Request Handlers
// ==============================================================================
// Description: HTTP request handlers for the prediction API endpoints
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 1.1.0
// ==============================================================================

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use genetics_predictor::PredictionResponse;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    models::*,
    state::AppState,
    validator::{UploadError, UploadFormat},
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Multipart field carrying the batch file
const FILE_FIELD: &str = "file";

/// Root endpoint - API information
pub async fn root() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        status: "online",
        message: "Welcome to Genetic Disease Prediction API! Use POST /predict_csv to send files.",
        service: "Genetic Disease Prediction API",
        version: VERSION,
        endpoints: vec![
            "/predict_csv - Batch prediction from a CSV upload (POST, form field 'file')",
            "/health - Health check",
            "/ready - Readiness check",
        ],
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
        timestamp: Utc::now(),
        artifacts_loaded: state.service().is_ready(),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.service();

    let (status, response) = match service.bundle() {
        Ok(bundle) => (
            StatusCode::OK,
            ReadinessResponse {
                ready: true,
                bundle_version: Some(bundle.format_version()),
                error: None,
            },
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ReadinessResponse {
                ready: false,
                bundle_version: None,
                error: Some(e.to_string()),
            },
        ),
    };

    (status, Json(response))
}

/// Batch prediction endpoint (file upload)
///
/// Always answers 200; failures are reported in the `status`/`message` payload.
pub async fn predict_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict_csv", %request_id);

    run_prediction(state, multipart).instrument(span).await
}

async fn run_prediction(
    state: AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    info!("Received batch prediction request");

    // 1. Pull the file out of the form (a non-multipart body carries no file)
    let upload = match multipart {
        Ok(multipart) => read_file_field(multipart).await?,
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "Request is not a multipart upload");
            None
        }
    };

    // 2. Validate before parsing
    let (data, delimiter) = match upload {
        Some((filename, data)) => {
            let validated = state.validator().validate(&filename, &data)?;
            info!(
                file = %validated.safe_name,
                size = validated.size,
                sha256 = %validated.short_hash(),
                gzipped = validated.gzipped,
                tsv = validated.format == UploadFormat::Tsv,
                "Upload validated"
            );
            (Some(data), validated.format.delimiter())
        }
        None => (None, UploadFormat::Csv.delimiter()),
    };

    // 3. Run the batch to completion on the blocking pool
    let service = state.service();
    let span = tracing::Span::current();
    let response = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        service.respond(data.as_deref(), delimiter)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))?;

    Ok(Json(response))
}

/// Read the `file` field, skipping any other form fields
async fn read_file_field(mut multipart: Multipart) -> Result<Option<(String, Bytes)>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Read(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.csv").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| UploadError::Read(e.body_text()))?;

        return Ok(Some((filename, data)));
    }

    Ok(None)
}

/// Errors raised before the batch reaches the prediction service
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Upload(e) => warn!(error = %e, "Upload rejected"),
            ApiError::Internal(msg) => error!("Internal error: {}", msg),
        }

        // Same envelope and status as pipeline failures
        (StatusCode::OK, Json(PredictionResponse::error(self.to_string()))).into_response()
    }
}
