//! Enrichment orchestrator
//!
//! Runs the two independent sub-pipelines concurrently: the catalog branch
//! (token, search, audio features) and the chord branch (link search, page
//! scrape). Each branch catches its own upstream failures at the branch
//! boundary and resolves to absence, so `enrich` itself cannot fail; total
//! upstream outage still produces a well-formed record.

use crate::config::EnrichmentConfig;
use crate::models::{ChordSheet, EnrichedSong, SongQuery, TrackMetadata};
use crate::services::catalog_auth::{CatalogAuthBroker, TokenCache};
use crate::services::catalog_resolver::CatalogResolver;
use crate::services::sheet_scraper::SheetScraper;
use crate::services::sheet_search::SheetSearchClient;

/// Multi-source enrichment pipeline
pub struct Enricher {
    catalog: CatalogResolver,
    sheet_search: SheetSearchClient,
    sheet_scraper: SheetScraper,
}

impl Enricher {
    /// Build the pipeline against the production upstream endpoints
    pub fn new(config: &EnrichmentConfig) -> anyhow::Result<Self> {
        let auth = CatalogAuthBroker::new(
            config.catalog_client_id.clone(),
            config.catalog_client_secret.clone(),
            TokenCache::new(),
        )?;

        Ok(Self {
            catalog: CatalogResolver::new(auth)?,
            sheet_search: SheetSearchClient::new(
                config.search_api_key.clone(),
                config.search_engine_id.clone(),
            )?,
            sheet_scraper: SheetScraper::new()?,
        })
    }

    /// Assemble a pipeline from pre-built components (test substitution point)
    pub fn from_parts(
        catalog: CatalogResolver,
        sheet_search: SheetSearchClient,
        sheet_scraper: SheetScraper,
    ) -> Self {
        Self {
            catalog,
            sheet_search,
            sheet_scraper,
        }
    }

    /// Enrich a validated query from all sources, merging whatever resolved
    ///
    /// The chord branch first searches with the caller's own naming so both
    /// branches run concurrently; if that finds nothing and the catalog
    /// corrected the naming, one more pass runs with the corrected names.
    pub async fn enrich(&self, query: &SongQuery) -> EnrichedSong {
        let (track, mut sheet) = tokio::join!(
            self.catalog_branch(query),
            self.chord_branch(&query.title, &query.artist),
        );

        if sheet.is_none() {
            if let Some(track) = &track {
                if corrected_differs(track, query) {
                    tracing::debug!(
                        title = %track.corrected_title,
                        artist = %track.corrected_artist,
                        "Retrying chord sheet lookup with catalog-corrected naming"
                    );
                    sheet = self
                        .chord_branch(&track.corrected_title, &track.corrected_artist)
                        .await;
                }
            }
        }

        EnrichedSong::merge(query, track, sheet)
    }

    /// Catalog branch: any failure degrades to absence, never to an error
    async fn catalog_branch(&self, query: &SongQuery) -> Option<TrackMetadata> {
        match self.catalog.resolve(query).await {
            Ok(Some(track)) => Some(track),
            Ok(None) => {
                tracing::debug!(title = %query.title, artist = %query.artist, "No catalog match");
                None
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Catalog lookup unavailable, continuing without track metadata"
                );
                None
            }
        }
    }

    /// Chord branch: link search then page scrape, sequential by necessity
    async fn chord_branch(&self, title: &str, artist: &str) -> Option<ChordSheet> {
        let link = match self.sheet_search.find_sheet_link(title, artist).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                tracing::debug!(title, artist, "No admissible chord sheet link");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chord sheet search unavailable");
                return None;
            }
        };

        match self.sheet_scraper.fetch_sheet(&link).await {
            Ok(Some(sheet)) => Some(sheet),
            Ok(None) => {
                tracing::debug!(url = %link, "Page had no extractable chord sheet");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %link, "Chord sheet fetch failed");
                None
            }
        }
    }
}

/// True when the catalog spelled the song differently than the caller did
fn corrected_differs(track: &TrackMetadata, query: &SongQuery) -> bool {
    track.corrected_title.to_lowercase() != query.title.to_lowercase()
        || track.corrected_artist.to_lowercase() != query.artist.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, artist: &str) -> TrackMetadata {
        TrackMetadata {
            corrected_title: title.to_string(),
            corrected_artist: artist.to_string(),
            duration_seconds: 258,
            bpm: Some(87),
        }
    }

    #[test]
    fn test_corrected_differs_ignores_case() {
        let query = SongQuery::new("wonderwall", "OASIS").unwrap();
        assert!(!corrected_differs(&track("Wonderwall", "Oasis"), &query));
    }

    #[test]
    fn test_corrected_differs_on_respelling() {
        let query = SongQuery::new("wonderwal", "Oasis").unwrap();
        assert!(corrected_differs(&track("Wonderwall", "Oasis"), &query));
    }
}
