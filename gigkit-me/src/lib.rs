//! gigkit-me library interface
//!
//! Exposes the application state, router construction and the enrichment
//! pipeline for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::http::{header, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::services::Enricher;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Enrichment pipeline; `None` while upstream credentials are missing
    pub enricher: Option<Arc<Enricher>>,
    /// Why the pipeline is unavailable, for /health and /enrich diagnostics
    pub config_error: Option<String>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(enricher: Option<Arc<Enricher>>, config_error: Option<String>) -> Self {
        Self {
            enricher,
            config_error,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::enrich_routes())
        .merge(api::health_routes())
        .layer(cors_layer())
        .with_state(state)
}

/// CORS policy: any origin, POST + preflight, JSON and auth headers
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
