// ==============================================================================
// pipeline.rs - Batch Inference Pipeline
// ==============================================================================
// Description: Schema check, encoding, dual prediction, decoding, assembly
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Steps:
//   1. Schema validation   - all 9 feature columns present, else SchemaError
//   2. Column projection   - feature columns in schema order, extras ignored
//   3. Encoding            - categorical columns via FeatureEncoders (never fails)
//   4. Prediction          - disease + risk classifiers on the same matrix
//   5. Decoding            - class ids → labels
//   6. Assembly            - one PredictionRow per input row, input order kept
// ==============================================================================

use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifacts::ModelBundle;
use crate::classifier::{Classifier, ClassifierError, FeatureMatrix};
use crate::decoder::DecodeError;
use crate::encoder::Encoding;
use crate::models::{BatchResult, PredictionRow};
use crate::schema::{self, CHILD_GENOTYPE, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::table::{Table, TableError};

/// Failures after the batch passed schema validation
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Column '{column}' row {row}: could not convert '{value}' to a number")]
    NonNumericFeature {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Child_Genotype row {row}: could not convert '{value}' to an integer")]
    InvalidGenotype { row: usize, value: String },

    #[error("{model} classifier failed: {source}")]
    Classifier {
        model: &'static str,
        #[source]
        source: ClassifierError,
    },

    #[error("{model} classifier returned {found} predictions for {expected} rows")]
    RowCountMismatch {
        model: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{model} classifier panicked")]
    Panicked { model: &'static str },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Every way a prediction request can fail
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Model artifacts not loaded: {0}")]
    ArtifactsNotLoaded(String),

    #[error("No file uploaded")]
    NoInput,

    #[error("Could not read CSV file: {0}")]
    Parse(#[from] TableError),

    #[error("Missing columns: {missing:?}")]
    Schema { missing: Vec<String> },

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// Run the full pipeline over one batch
pub fn predict_batch(bundle: &ModelBundle, table: &Table) -> Result<BatchResult, PipelineError> {
    // 1. Schema validation
    let missing = schema::missing_columns(table.headers());
    if !missing.is_empty() {
        warn!(missing = ?missing, "Batch rejected: required columns missing");
        return Err(PipelineError::Schema { missing });
    }

    // 2. Column projection
    let mut projection = [0usize; FEATURE_COUNT];
    for (slot, column) in projection.iter_mut().zip(FEATURE_COLUMNS) {
        // Presence was checked above
        *slot = table
            .column_index(column)
            .ok_or_else(|| PipelineError::Schema {
                missing: vec![column.to_string()],
            })?;
    }

    // 3. Encoding
    let features = encode_features(bundle, table, &projection)?;
    info!(rows = features.n_rows(), "Batch encoded");

    // 4. Prediction
    let (disease_ids, risk_ids) = run_classifiers(
        bundle.disease_model(),
        bundle.risk_model(),
        &features,
    )?;

    // 5. Decoding
    let disease_labels = bundle
        .disease_decoder()
        .decode_all(&disease_ids)
        .map_err(PredictionError::from)?;
    let risk_labels = bundle
        .risk_decoder()
        .decode_all(&risk_ids)
        .map_err(PredictionError::from)?;

    // 6. Assembly
    let genotype_column = table.column_index(CHILD_GENOTYPE);
    let mut predictions = Vec::with_capacity(table.row_count());

    for (row_index, (disease_prediction, risk_prediction)) in
        disease_labels.into_iter().zip(risk_labels).enumerate()
    {
        let child_genotype = match genotype_column.and_then(|col| table.cell(row_index, col)) {
            Some(cell) => cell
                .as_display_int()
                .ok_or_else(|| PredictionError::InvalidGenotype {
                    row: row_index,
                    value: cell.to_string(),
                })?,
            None => 0,
        };

        predictions.push(PredictionRow {
            row_index,
            disease_prediction,
            risk_prediction,
            child_genotype,
        });
    }

    Ok(BatchResult {
        total_rows: table.row_count(),
        predictions,
    })
}

/// Build the feature matrix, substituting fallback codes for unseen categories
fn encode_features(
    bundle: &ModelBundle,
    table: &Table,
    projection: &[usize; FEATURE_COUNT],
) -> Result<FeatureMatrix, PredictionError> {
    let encoders = bundle.encoders();
    let column_encoders: Vec<_> = FEATURE_COLUMNS.iter().map(|c| encoders.get(c)).collect();

    let mut matrix = FeatureMatrix::with_capacity(FEATURE_COUNT, table.row_count());
    let mut substitutions = [0usize; FEATURE_COUNT];
    let mut vector = [0.0f64; FEATURE_COUNT];

    for (row_idx, row) in table.rows().iter().enumerate() {
        for (pos, column) in FEATURE_COLUMNS.iter().enumerate() {
            let cell = &row[projection[pos]];

            vector[pos] = match column_encoders[pos] {
                Some(encoder) => {
                    let encoding = encoder.encode_cell(cell);
                    if encoding.is_substitution() {
                        substitutions[pos] += 1;
                        debug!(
                            column,
                            row = row_idx,
                            value = %cell,
                            code = encoding.code(),
                            malformed = matches!(encoding, Encoding::Malformed),
                            "Unseen category value replaced"
                        );
                    }
                    encoding.code() as f64
                }
                None => cell.as_f64().ok_or_else(|| PredictionError::NonNumericFeature {
                    column: column.to_string(),
                    row: row_idx,
                    value: cell.to_string(),
                })?,
            };
        }

        matrix
            .push_row(&vector)
            .map_err(|source| PredictionError::Classifier {
                model: "feature matrix",
                source,
            })?;
    }

    for (column, count) in FEATURE_COLUMNS.iter().zip(substitutions) {
        if count > 0 {
            warn!(
                column,
                count,
                policy = %encoders.policy(),
                "Unseen category values replaced with fallback code"
            );
        }
    }

    Ok(matrix)
}

/// Run both classifiers over the same matrix, each on its own scoped thread
fn run_classifiers(
    disease: &dyn Classifier,
    risk: &dyn Classifier,
    features: &FeatureMatrix,
) -> Result<(Vec<u32>, Vec<u32>), PredictionError> {
    let (disease_result, risk_result) = thread::scope(|scope| {
        let disease_handle = scope.spawn(|| disease.predict(features));
        let risk_handle = scope.spawn(|| risk.predict(features));
        (disease_handle.join(), risk_handle.join())
    });

    let disease_ids = classifier_output("disease", disease_result)?;
    let risk_ids = classifier_output("risk", risk_result)?;

    let expected = features.n_rows();
    for (model, ids) in [("disease", &disease_ids), ("risk", &risk_ids)] {
        if ids.len() != expected {
            return Err(PredictionError::RowCountMismatch {
                model,
                expected,
                found: ids.len(),
            });
        }
    }

    Ok((disease_ids, risk_ids))
}

/// Unwrap one classifier thread's outcome, turning a panic into an error
fn classifier_output(
    model: &'static str,
    joined: thread::Result<Result<Vec<u32>, ClassifierError>>,
) -> Result<Vec<u32>, PredictionError> {
    joined
        .map_err(|_| PredictionError::Panicked { model })?
        .map_err(|source| PredictionError::Classifier { model, source })
}
