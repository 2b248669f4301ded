// ==============================================================================
// models.rs - API Data Models
// ==============================================================================
// Description: Response models for the service endpoints
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 1.1.0
// ==============================================================================
// Prediction payloads (success / error) live in genetics_predictor::models so
// the CLI and the HTTP server emit identical JSON.
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Landing page response
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub artifacts_loaded: bool,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
