// ==============================================================================
// lib.rs - Genetics Predictor Library
// ==============================================================================
// Description: Library interface for genetic disease/risk batch prediction
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

pub mod schema;
pub mod table;
pub mod encoder;
pub mod classifier;
pub mod decoder;
pub mod artifacts;
pub mod models;
pub mod pipeline;
pub mod service;

pub use artifacts::{ArtifactLoadError, ModelBundle};
pub use encoder::UnseenCategoryPolicy;
pub use models::{BatchResult, PredictionResponse, PredictionRow};
pub use pipeline::{predict_batch, PipelineError, PredictionError};
pub use service::PredictionService;
pub use table::{Cell, Table, TableError};
