// ==============================================================================
// state.rs - Application State Management
// ==============================================================================
// Description: Shared application state for the prediction API
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 1.1.0
// ==============================================================================

use genetics_predictor::PredictionService;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::validator::UploadValidator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Loaded model bundle (or the reason it failed to load)
    service: Arc<PredictionService>,

    /// Upload size checks and digests
    validator: UploadValidator,

    config: ServerConfig,
}

impl AppState {
    /// Create application state, loading the model bundle named in the config
    pub fn new(config: ServerConfig) -> Self {
        let service = PredictionService::load(&config.model_bundle, config.unseen_policy);
        Self::with_service(config, service)
    }

    pub fn with_service(config: ServerConfig, service: PredictionService) -> Self {
        let validator = UploadValidator::new(config.max_upload_bytes());
        let service = service.with_max_input_bytes(config.max_decompressed_bytes());
        Self {
            inner: Arc::new(AppStateInner {
                service: Arc::new(service),
                validator,
                config,
            }),
        }
    }

    /// Get the prediction service (cloned handle for blocking tasks)
    pub fn service(&self) -> Arc<PredictionService> {
        Arc::clone(&self.inner.service)
    }

    /// Get upload validator
    pub fn validator(&self) -> &UploadValidator {
        &self.inner.validator
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }
}
