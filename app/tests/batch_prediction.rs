// ==============================================================================
// batch_prediction.rs - End-to-End Batch Prediction Tests
// ==============================================================================
// Description: CSV upload → JSON payload through the public library API
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use genetics_predictor::{ModelBundle, PredictionResponse, PredictionService, UnseenCategoryPolicy};
use serde_json::json;

const FIXTURE: &str = include_str!("fixtures/model_bundle.json");

const HEADER: &str = "Father_Gene,Father_Variant,Father_Pathogenicity,Father_Inheritance,\
Mother_Gene,Mother_Variant,Mother_Pathogenicity,Mother_Inheritance,Child_Genotype";

fn service() -> PredictionService {
    let bundle = ModelBundle::from_json_slice(FIXTURE.as_bytes(), UnseenCategoryPolicy::FirstCategory)
        .expect("fixture bundle should load");
    PredictionService::from_bundle(bundle)
}

fn predict(csv: &str) -> serde_json::Value {
    let response = service().respond(Some(csv.as_bytes()), b',');
    serde_json::to_value(response).unwrap()
}

#[test]
fn test_known_row_scenario() {
    let csv = format!(
        "{}\nBRCA1,c.68_69delAG,Pathogenic,Autosomal Dominant,BRCA1,none,Benign,Autosomal Dominant,1\n",
        HEADER
    );

    assert_eq!(
        predict(&csv),
        json!({
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
fn test_unseen_gene_scenario() {
    let csv = format!(
        "{}\nUNKNOWN_GENE_XYZ,c.68_69delAG,Pathogenic,Autosomal Dominant,BRCA1,none,Benign,Autosomal Dominant,1\n",
        HEADER
    );

    let value = predict(&csv);
    assert_eq!(value["status"], "success");
    assert_eq!(value["total_rows"], 1);
    assert_eq!(value["predictions"].as_array().unwrap().len(), 1);
    assert!(value["predictions"][0]["disease_prediction"].is_string());
    assert!(value["predictions"][0]["risk_prediction"].is_string());
}

#[test]
fn test_row_indices_follow_input_order() {
    let mut csv = format!("{},Notes\n", HEADER);
    for genotype in [0, 1, 2, 1, 0] {
        csv.push_str(&format!(
            "CFTR,F508del,Pathogenic,Autosomal Recessive,CFTR,F508del,Pathogenic,Autosomal Recessive,{},sample\n",
            genotype
        ));
    }

    let value = predict(&csv);
    let predictions = value["predictions"].as_array().unwrap();

    assert_eq!(value["total_rows"], 5);
    assert_eq!(predictions.len(), 5);
    for (i, prediction) in predictions.iter().enumerate() {
        assert_eq!(prediction["row_index"], i);
    }
    let genotypes: Vec<i64> = predictions
        .iter()
        .map(|p| p["child_genotype"].as_i64().unwrap())
        .collect();
    assert_eq!(genotypes, vec![0, 1, 2, 1, 0]);
}

#[test]
fn test_missing_columns_error_payload() {
    let value = predict("Father_Gene,Mother_Gene,Child_Genotype\nBRCA1,BRCA1,1\n");

    assert_eq!(value["status"], "error");
    let message = value["message"].as_str().unwrap();
    assert!(message.starts_with("Missing columns:"));
    assert!(message.contains("Father_Variant"));
    assert!(value.get("predictions").is_none());
}

#[test]
fn test_empty_batch_payload() {
    assert_eq!(
        predict(&format!("{}\n", HEADER)),
        json!({"status": "success", "total_rows": 0, "predictions": []})
    );
}

#[test]
fn test_bad_genotype_returns_error_without_partial_results() {
    let csv = format!(
        "{}\nBRCA1,none,Benign,X-linked,BRCA1,none,Benign,X-linked,1\nBRCA1,none,Benign,X-linked,BRCA1,none,Benign,X-linked,AA\n",
        HEADER
    );

    let response = service().respond(Some(csv.as_bytes()), b',');
    match response {
        PredictionResponse::Error { message } => {
            assert!(message.contains("Child_Genotype"));
            assert!(message.contains("'AA'"));
        }
        other => panic!("Expected error response, got {:?}", other),
    }
}
