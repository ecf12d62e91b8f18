//! gigkit-me - Metadata Enrichment Microservice
//!
//! Resolves song title + artist queries into enriched repertoire records by
//! combining the music catalog API (corrected naming, duration, tempo) with
//! a scraped chord sheet (key, chord/lyric text). Integrates with the GigKit
//! web client via HTTP REST.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gigkit_me::services::Enricher;
use gigkit_me::{config, AppState};

const DEFAULT_PORT: u16 = 5731;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting gigkit-me (Metadata Enrichment) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve upstream credentials (ENV -> TOML). The server starts either
    // way; without them /enrich answers 500 and /health reports degraded.
    let toml_config = config::load_toml_config();
    let (enricher, config_error) = match config::resolve_enrichment_config(&toml_config) {
        Ok(enrichment_config) => {
            let enricher = Enricher::new(&enrichment_config)?;
            info!("Enrichment pipeline configured");
            (Some(Arc::new(enricher)), None)
        }
        Err(e) => {
            warn!("Enrichment upstreams not configured: {}", e);
            (None, Some(e.to_string()))
        }
    };

    let state = AppState::new(enricher, config_error);
    let app = gigkit_me::build_router(state);

    let port = std::env::var("GIGKIT_ME_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
