//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok" or "degraded")
    pub status: String,
    /// Module name ("gigkit-me")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Diagnostic message when degraded (e.g. missing configuration)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// GET /health
///
/// Reports "degraded" with a diagnostic while the enrichment upstreams are
/// not configured; the service stays up so the operator can see why.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let (status, diagnostic) = match &state.config_error {
        Some(reason) => ("degraded", Some(reason.clone())),
        None => ("ok", None),
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "gigkit-me".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        diagnostic,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
