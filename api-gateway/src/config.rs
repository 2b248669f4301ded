// ==============================================================================
// config.rs - Server Configuration
// ==============================================================================
// Description: Command-line / environment configuration for the prediction API
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.1.0
// ==============================================================================

use axum::http::HeaderValue;
use clap::Parser;
use genetics_predictor::UnseenCategoryPolicy;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Genetic disease prediction API", long_about = None)]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Model bundle (JSON) loaded at startup
    #[arg(long, env = "MODEL_BUNDLE_PATH", default_value = "model_data.json")]
    pub model_bundle: PathBuf,

    /// Replacement for category values unseen during training (first, most-frequent)
    #[arg(long, env = "UNSEEN_CATEGORY_POLICY", default_value = "first")]
    pub unseen_policy: UnseenCategoryPolicy,

    /// Maximum accepted upload size in megabytes
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 25)]
    pub max_upload_mb: usize,

    /// Maximum batch size in megabytes after gzip decompression
    #[arg(long, env = "MAX_DECOMPRESSED_MB", default_value_t = 256)]
    pub max_decompressed_mb: u64,

    /// Comma-separated list of allowed CORS origins
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", default_value = "http://localhost:3000")]
    pub cors_allowed_origins: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn max_decompressed_bytes(&self) -> u64 {
        self.max_decompressed_mb.saturating_mul(1024 * 1024)
    }

    /// Parsed CORS origins; entries that are not valid header values are skipped
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 10000,
            model_bundle: PathBuf::from("model_data.json"),
            unseen_policy: UnseenCategoryPolicy::default(),
            max_upload_mb: 25,
            max_decompressed_mb: 256,
            cors_allowed_origins: "http://localhost:3000".to_string(),
            log_json: false,
        }
    }
}
