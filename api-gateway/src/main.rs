// ==============================================================================
// main.rs - Genetic Disease Prediction API Entry Point
// ==============================================================================
// Description: Axum web server for batch genetic disease/risk prediction
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 1.1.0
// ==============================================================================

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod models;
mod state;
mod validator;

use config::ServerConfig;
use state::AppState;

/// Headroom for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables (before clap reads its env fallbacks)
    dotenvy::dotenv().ok();

    let config = ServerConfig::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    info!(
        "Starting Genetic Disease Prediction API v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load the model bundle once; a failure leaves the server up but not ready
    let addr = config.bind_addr();
    let state = AppState::new(config);

    // Build router with all endpoints
    let app = build_router(state);

    // Bind server
    info!("Prediction API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    // Origins are configured via CORS_ALLOWED_ORIGINS (comma-separated)
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(state.config().cors_origins()))
        .allow_credentials(false)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let body_limit = state
        .config()
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(handlers::root))
        .route("/predict_csv", post(handlers::predict_csv))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .layer(
            ServiceBuilder::new()
                // Request tracing
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                // Request body size limit (exact file limit is checked by the validator)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received (Ctrl-C)"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
