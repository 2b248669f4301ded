// ==============================================================================
// service.rs - Prediction Service
// ==============================================================================
// Description: Load-once model context and the pipeline error boundary
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// The service is created once at process start and shared (Arc) by every
// request. A failed bundle load does not stop the process: the failure is kept
// and every prediction answers with an "artifacts not loaded" error.
// ==============================================================================

use std::path::Path;
use tracing::{error, info, warn};

use crate::artifacts::ModelBundle;
use crate::encoder::UnseenCategoryPolicy;
use crate::models::{BatchResult, PredictionResponse};
use crate::pipeline::{self, PipelineError};
use crate::table::{Table, DEFAULT_MAX_INPUT_BYTES};

#[derive(Debug)]
enum ModelState {
    Loaded(ModelBundle),
    Failed(String),
}

/// Immutable prediction context shared by all requests
#[derive(Debug)]
pub struct PredictionService {
    state: ModelState,
    max_input_bytes: u64,
}

impl PredictionService {
    /// Load the model bundle; a load failure is recorded, not returned
    pub fn load(path: impl AsRef<Path>, policy: UnseenCategoryPolicy) -> Self {
        match ModelBundle::load(path.as_ref(), policy) {
            Ok(bundle) => {
                info!(
                    path = %path.as_ref().display(),
                    format_version = bundle.format_version(),
                    "Model loaded successfully"
                );
                Self::from_bundle(bundle)
            }
            Err(e) => {
                error!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "Error loading model, predictions will be rejected"
                );
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn from_bundle(bundle: ModelBundle) -> Self {
        Self {
            state: ModelState::Loaded(bundle),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ModelState::Failed(reason.into()),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }

    /// Cap on an upload's size after decompression
    pub fn with_max_input_bytes(mut self, max_input_bytes: u64) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    pub fn max_input_bytes(&self) -> u64 {
        self.max_input_bytes
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Loaded(_))
    }

    /// Reason the bundle failed to load, if it did
    pub fn load_error(&self) -> Option<&str> {
        match &self.state {
            ModelState::Loaded(_) => None,
            ModelState::Failed(reason) => Some(reason.as_str()),
        }
    }

    pub fn bundle(&self) -> Result<&ModelBundle, PipelineError> {
        match &self.state {
            ModelState::Loaded(bundle) => Ok(bundle),
            ModelState::Failed(reason) => Err(PipelineError::ArtifactsNotLoaded(reason.clone())),
        }
    }

    /// Parse and predict an uploaded file (`None` when nothing was uploaded)
    pub fn predict_upload(
        &self,
        upload: Option<&[u8]>,
        delimiter: u8,
    ) -> Result<BatchResult, PipelineError> {
        let bundle = self.bundle()?;
        let data = upload.ok_or(PipelineError::NoInput)?;
        let table = Table::from_bytes_limited(data, delimiter, self.max_input_bytes)?;

        info!(
            rows = table.row_count(),
            columns = table.headers().len(),
            "Batch parsed"
        );

        pipeline::predict_batch(bundle, &table)
    }

    /// Error boundary: every outcome becomes a uniform response payload
    pub fn respond(&self, upload: Option<&[u8]>, delimiter: u8) -> PredictionResponse {
        Self::into_response(self.predict_upload(upload, delimiter))
    }

    /// Convert a pipeline outcome into the response payload, logging failures
    pub fn into_response(outcome: Result<BatchResult, PipelineError>) -> PredictionResponse {
        match outcome {
            Ok(result) => {
                info!(total_rows = result.total_rows, "Batch prediction complete");
                PredictionResponse::Success(result)
            }
            Err(e) => {
                match &e {
                    PipelineError::Prediction(_) | PipelineError::ArtifactsNotLoaded(_) => {
                        error!(error = %e, "Batch prediction failed")
                    }
                    _ => warn!(error = %e, "Batch rejected"),
                }
                PredictionResponse::error(e.to_string())
            }
        }
    }
}
