// ==============================================================================
// models.rs - Prediction Data Models
// ==============================================================================
// Description: Result records and response payloads for batch prediction
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};

/// Prediction for one input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    /// Zero-based position in the uploaded batch
    pub row_index: usize,

    /// Decoded disease label
    pub disease_prediction: String,

    /// Decoded risk label
    pub risk_prediction: String,

    /// Original (unencoded) child genotype
    pub child_genotype: i64,
}

/// Successful batch outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total_rows: usize,
    pub predictions: Vec<PredictionRow>,
}

/// Uniform response payload, tagged by `status`
///
/// ```json
/// {"status": "success", "total_rows": 1, "predictions": [...]}
/// {"status": "error", "message": "Missing columns: [\"Father_Gene\"]"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PredictionResponse {
    Success(BatchResult),
    Error { message: String },
}

impl PredictionResponse {
    pub fn error(message: impl Into<String>) -> Self {
        PredictionResponse::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResponse::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let response = PredictionResponse::Success(BatchResult {
            total_rows: 1,
            predictions: vec![PredictionRow {
                row_index: 0,
                disease_prediction: "Breast Cancer".to_string(),
                risk_prediction: "Medium".to_string(),
                child_genotype: 1,
            }],
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "total_rows": 1,
                "predictions": [{
                    "row_index": 0,
                    "disease_prediction": "Breast Cancer",
                    "risk_prediction": "Medium",
                    "child_genotype": 1
                }]
            })
        );
    }

    #[test]
    fn test_error_shape() {
        let json = serde_json::to_value(PredictionResponse::error("No file uploaded")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "No file uploaded"})
        );
    }

    #[test]
    fn test_round_trip_error() {
        let parsed: PredictionResponse =
            serde_json::from_str(r#"{"status":"error","message":"boom"}"#).unwrap();
        assert!(!parsed.is_success());
        assert_eq!(parsed, PredictionResponse::error("boom"));
    }
}
