//! Dossier Server Library
//!
//! HTTP front end for the dossier workflow engine.
//!
//! - **API Endpoints**: one endpoint per orchestrator operation under `/api/v1/workflows`
//! - **Configuration**: environment-based server and CORS settings
//! - **Middleware**: CORS, request tracing and response compression
//!
//! # Example
//!
//! ```no_run
//! use dossier_engine::{catalog, EngineConfig};
//! use dossier_server::{config::Config, create_router, features::FeatureState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let orchestrator = catalog::default_orchestrator(&EngineConfig::load()?)?;
//!     let app = create_router(FeatureState::new(orchestrator), &config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::compression::CompressionLayer;

pub use error::{ApiResult, AppError};

use config::Config;
use features::FeatureState;

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state.clone())
        .nest("/api/v1", features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler
async fn health_check(State(state): State<FeatureState>) -> impl IntoResponse {
    // registry size only; never waits on a running workflow
    Json(json!({
        "status": "healthy",
        "workflows": state.orchestrator.len()
    }))
}
