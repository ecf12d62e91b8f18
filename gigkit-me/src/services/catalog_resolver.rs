//! Catalog API client
//!
//! Resolves a song query against the music catalog: free-text track search,
//! popularity ranking of the candidates, then an audio-features lookup for
//! the winner's tempo. Free-text search is deliberate; field-qualified
//! queries are brittle against alternate romanizations and typos and return
//! zero results far more often.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{SongQuery, TrackMetadata};
use crate::services::catalog_auth::{AuthError, CatalogAuthBroker};

const CATALOG_API_BASE_URL: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = "GigKit/0.1.0 (https://github.com/gigkit/gigkit)";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of search candidates considered for ranking
const SEARCH_CANDIDATE_LIMIT: u32 = 5;

/// Catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Credential broker failed; fails the catalog branch only
    #[error("Catalog auth failed: {0}")]
    Auth(#[from] AuthError),

    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Catalog API returned an error response
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Failed to parse API response JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Track search response envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    items: Vec<CatalogCandidate>,
}

/// One search hit prior to ranking; exists only during candidate selection
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogCandidate {
    pub id: String,
    /// Track title as spelled by the catalog
    pub name: String,
    /// Track duration in milliseconds
    pub duration_ms: u64,
    /// Catalog popularity score (0-100)
    pub popularity: u32,
    pub artists: Vec<CandidateArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateArtist {
    pub name: String,
}

impl CatalogCandidate {
    /// Credited artists joined for display ("A, B")
    fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Audio-features response (tempo only; the rest is irrelevant here)
#[derive(Debug, Deserialize)]
struct AudioFeatures {
    tempo: Option<f64>,
}

/// Catalog resolver: search, rank, fetch tempo
pub struct CatalogResolver {
    http_client: reqwest::Client,
    base_url: String,
    auth: CatalogAuthBroker,
}

impl CatalogResolver {
    pub fn new(auth: CatalogAuthBroker) -> Result<Self, CatalogError> {
        Self::with_base_url(auth, CATALOG_API_BASE_URL)
    }

    pub fn with_base_url(
        auth: CatalogAuthBroker,
        base_url: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            auth,
        })
    }

    /// Resolve the best catalog match for a query
    ///
    /// Returns `Ok(None)` when the catalog has no candidates at all; that is
    /// an expected outcome, not an error.
    pub async fn resolve(&self, query: &SongQuery) -> Result<Option<TrackMetadata>, CatalogError> {
        let token = self.auth.get_access_token().await?;

        let free_text = format!("{} {}", query.title, query.artist);
        let url = format!("{}/search", self.base_url);

        tracing::debug!(q = %free_text, "Querying catalog search");

        let limit = SEARCH_CANDIDATE_LIMIT.to_string();
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("q", free_text.as_str()),
                ("type", "track"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), error_text));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        let Some(best) = best_candidate(search.tracks.items) else {
            tracing::debug!(q = %free_text, "Catalog search returned no candidates");
            return Ok(None);
        };

        tracing::info!(
            id = %best.id,
            title = %best.name,
            popularity = best.popularity,
            "Selected catalog candidate"
        );

        let bpm = self.fetch_tempo(&best.id, &token).await?;

        Ok(Some(TrackMetadata {
            corrected_title: best.name.clone(),
            corrected_artist: best.artist_names(),
            duration_seconds: duration_ms_to_seconds(best.duration_ms),
            bpm,
        }))
    }

    /// Fetch the tempo analysis for a track
    ///
    /// A 404 means the catalog never analyzed this track; like a missing
    /// tempo field it yields `None` rather than an error.
    async fn fetch_tempo(&self, track_id: &str, token: &str) -> Result<Option<u32>, CatalogError> {
        let url = format!("{}/audio-features/{}", self.base_url, track_id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            tracing::debug!(id = %track_id, "No tempo analysis for track");
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), error_text));
        }

        let features: AudioFeatures = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        Ok(features.tempo.map(|tempo| tempo.round() as u32))
    }
}

/// Pick the top candidate by popularity
///
/// The sort is stable, so equal scores keep catalog result order and the
/// earliest-returned candidate wins ties.
fn best_candidate(mut candidates: Vec<CatalogCandidate>) -> Option<CatalogCandidate> {
    candidates.sort_by(|a, b| b.popularity.cmp(&a.popularity));
    candidates.into_iter().next()
}

/// Convert milliseconds to whole seconds, rounding half-up
fn duration_ms_to_seconds(duration_ms: u64) -> u32 {
    ((duration_ms + 500) / 1000) as u32
}
