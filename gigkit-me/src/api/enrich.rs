//! Enrichment API handler
//!
//! POST /enrich resolves a song title + artist into an enriched record.
//! Partial upstream failures still answer 200 with whatever resolved; only
//! invalid input (400) and missing configuration (500) are error responses.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{EnrichedSong, SongQuery};
use crate::AppState;

/// POST /enrich request
///
/// The legacy web client sends Portuguese field names; both spellings are
/// accepted. Missing fields deserialize to empty strings and fail the same
/// validation as explicit empties (400, not 422).
#[derive(Debug, Deserialize)]
pub struct EnrichRequest {
    #[serde(default, alias = "nomeMusica")]
    pub title: String,
    #[serde(default, alias = "nomeArtista")]
    pub artist: String,
}

/// POST /enrich
pub async fn enrich_song(
    State(state): State<AppState>,
    Json(request): Json<EnrichRequest>,
) -> ApiResult<Json<EnrichedSong>> {
    let query = SongQuery::new(&request.title, &request.artist)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let Some(enricher) = state.enricher.as_ref() else {
        let reason = state
            .config_error
            .clone()
            .unwrap_or_else(|| "Enrichment upstreams not configured".to_string());
        return Err(ApiError::Configuration(reason));
    };

    tracing::info!(title = %query.title, artist = %query.artist, "Enriching song");

    Ok(Json(enricher.enrich(&query).await))
}

/// OPTIONS /enrich
///
/// Plain 200 for preflight; the CORS layer adds the access-control headers.
pub async fn enrich_preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on /enrich
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Use POST /enrich".to_string())
}

/// Build enrichment routes
pub fn enrich_routes() -> Router<AppState> {
    Router::new().route(
        "/enrich",
        post(enrich_song)
            .options(enrich_preflight)
            .fallback(method_not_allowed),
    )
}
