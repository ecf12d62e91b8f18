//! End-to-end enrichment pipeline tests against in-process fake upstreams
//!
//! Each test binds a loopback axum server playing the catalog API, the web
//! search API and the chord sheet site, then drives the real pipeline
//! against it.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gigkit_me::models::{SongQuery, SHEET_NOT_FOUND_NOTE};
use gigkit_me::services::{
    CatalogAuthBroker, CatalogResolver, Enricher, SheetScraper, SheetSearchClient, TokenCache,
};

const SHEET_PAGE: &str = concat!(
    "<html><body>",
    "<span id=\"cifra_tom\"><a href=\"#\">Gsus4</a></span>",
    "<pre><b>Em7</b>  G  <b>Dsus4</b>  <b>A7sus4</b><br>",
    "Today is gonna be the day<br>",
    "that they're gonna throw it back to you</pre>",
    "</body></html>",
);

const SHEET_BODY: &str = "Em7  G  Dsus4  A7sus4\n\
                          Today is gonna be the day\n\
                          that they're gonna throw it back to you";

/// Bind a fake upstream on an ephemeral port; the builder gets the bound
/// address so response bodies can link back to the same server.
async fn spawn_upstream<F>(build: F) -> SocketAddr
where
    F: FnOnce(SocketAddr) -> Router,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build(addr);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

/// Build the real pipeline pointed at a fake upstream
fn enricher_against(addr: SocketAddr) -> Enricher {
    let base = format!("http://{}", addr);

    let auth = CatalogAuthBroker::with_token_url(
        "client-id".to_string(),
        "client-secret".to_string(),
        TokenCache::new(),
        format!("{}/token", base),
    )
    .unwrap();

    Enricher::from_parts(
        CatalogResolver::with_base_url(auth, base.clone()).unwrap(),
        SheetSearchClient::with_base_url(
            "search-key".to_string(),
            "engine-id".to_string(),
            format!("{}/customsearch", base),
            "127.0.0.1",
        )
        .unwrap(),
        SheetScraper::new().unwrap(),
    )
}

fn token_response() -> Json<serde_json::Value> {
    Json(json!({
        "access_token": "test-token",
        "token_type": "Bearer",
        "expires_in": 3600
    }))
}

fn wonderwall_search_response() -> Json<serde_json::Value> {
    Json(json!({
        "tracks": {
            "items": [
                {
                    "id": "track-1",
                    "name": "Wonderwall",
                    "duration_ms": 258000,
                    "popularity": 83,
                    "artists": [{"name": "Oasis"}]
                }
            ]
        }
    }))
}

/// Fully healthy upstream: catalog, search and sheet page all answer
fn healthy_upstream(addr: SocketAddr) -> Router {
    let sheet_url = format!("http://{}/oasis/wonderwall/", addr);

    Router::new()
        .route("/token", post(|| async { token_response() }))
        .route("/search", get(|| async { wonderwall_search_response() }))
        .route(
            "/audio-features/:id",
            get(|| async { Json(json!({"tempo": 87.0})) }),
        )
        .route(
            "/customsearch",
            get(move || async move { Json(json!({"items": [{"link": sheet_url}]})) }),
        )
        .route("/oasis/wonderwall/", get(|| async { Html(SHEET_PAGE) }))
}

#[tokio::test]
async fn test_enrich_end_to_end() {
    let addr = spawn_upstream(healthy_upstream).await;
    let enricher = enricher_against(addr);

    let query = SongQuery::new("Wonderwall", "Oasis").unwrap();
    let record = enricher.enrich(&query).await;

    assert_eq!(record.name, "Wonderwall");
    assert_eq!(record.artist, "Oasis");
    assert_eq!(record.key, "Gsus4");
    assert_eq!(record.notes, SHEET_BODY);
    assert_eq!(record.bpm, Some(87));
    assert_eq!(record.duration_seconds, Some(258));
}

#[tokio::test]
async fn test_catalog_absent_still_yields_sheet() {
    let addr = spawn_upstream(|addr| {
        let sheet_url = format!("http://{}/oasis/wonderwall/", addr);
        Router::new()
            .route("/token", post(|| async { token_response() }))
            .route(
                "/search",
                get(|| async { Json(json!({"tracks": {"items": []}})) }),
            )
            .route(
                "/customsearch",
                get(move || async move { Json(json!({"items": [{"link": sheet_url}]})) }),
            )
            .route("/oasis/wonderwall/", get(|| async { Html(SHEET_PAGE) }))
    })
    .await;
    let enricher = enricher_against(addr);

    let query = SongQuery::new("Wonderwall", "Oasis").unwrap();
    let record = enricher.enrich(&query).await;

    // Naming falls back to the query, catalog fields to null
    assert_eq!(record.name, "Wonderwall");
    assert_eq!(record.bpm, None);
    assert_eq!(record.duration_seconds, None);
    // Chord branch is unaffected
    assert_eq!(record.key, "Gsus4");
    assert_eq!(record.notes, SHEET_BODY);
}

#[tokio::test]
async fn test_auth_rejection_fails_only_catalog_branch() {
    let addr = spawn_upstream(|addr| {
        let sheet_url = format!("http://{}/oasis/wonderwall/", addr);
        Router::new()
            .route(
                "/token",
                post(|| async { (StatusCode::UNAUTHORIZED, "invalid_client") }),
            )
            .route(
                "/customsearch",
                get(move || async move { Json(json!({"items": [{"link": sheet_url}]})) }),
            )
            .route("/oasis/wonderwall/", get(|| async { Html(SHEET_PAGE) }))
    })
    .await;
    let enricher = enricher_against(addr);

    let query = SongQuery::new("Wonderwall", "Oasis").unwrap();
    let record = enricher.enrich(&query).await;

    assert_eq!(record.bpm, None);
    assert_eq!(record.duration_seconds, None);
    assert_eq!(record.key, "Gsus4");
    assert_eq!(record.notes, SHEET_BODY);
}

#[tokio::test]
async fn test_missing_tempo_analysis_yields_null_bpm() {
    let addr = spawn_upstream(|addr| {
        let sheet_url = format!("http://{}/oasis/wonderwall/", addr);
        Router::new()
            .route("/token", post(|| async { token_response() }))
            .route("/search", get(|| async { wonderwall_search_response() }))
            .route(
                "/audio-features/:id",
                get(|| async { StatusCode::NOT_FOUND }),
            )
            .route(
                "/customsearch",
                get(move || async move { Json(json!({"items": [{"link": sheet_url}]})) }),
            )
            .route("/oasis/wonderwall/", get(|| async { Html(SHEET_PAGE) }))
    })
    .await;
    let enricher = enricher_against(addr);

    let query = SongQuery::new("Wonderwall", "Oasis").unwrap();
    let record = enricher.enrich(&query).await;

    assert_eq!(record.bpm, None);
    // The rest of the catalog branch still resolved
    assert_eq!(record.duration_seconds, Some(258));
    assert_eq!(record.name, "Wonderwall");
}

#[tokio::test]
async fn test_token_fetched_once_per_validity_window() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let counter = token_calls.clone();

    let addr = spawn_upstream(move |addr| {
        let sheet_url = format!("http://{}/oasis/wonderwall/", addr);
        Router::new()
            .route(
                "/token",
                post(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { token_response() }
                }),
            )
            .route("/search", get(|| async { wonderwall_search_response() }))
            .route(
                "/audio-features/:id",
                get(|| async { Json(json!({"tempo": 87.0})) }),
            )
            .route(
                "/customsearch",
                get(move || async move { Json(json!({"items": [{"link": sheet_url}]})) }),
            )
            .route("/oasis/wonderwall/", get(|| async { Html(SHEET_PAGE) }))
    })
    .await;
    let enricher = enricher_against(addr);

    let query = SongQuery::new("Wonderwall", "Oasis").unwrap();
    enricher.enrich(&query).await;
    enricher.enrich(&query).await;

    assert_eq!(token_calls.load(Ordering::SeqCst), 1);
}

/// The chord search retries once with catalog-corrected naming when the raw
/// query finds nothing
#[tokio::test]
async fn test_second_pass_uses_corrected_naming() {
    async fn search_by_query(
        addr: SocketAddr,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        let q = params.get("q").cloned().unwrap_or_default();
        if q.contains("Wonderwall") {
            let sheet_url = format!("http://{}/oasis/wonderwall/", addr);
            Json(json!({"items": [{"link": sheet_url}]})).into_response()
        } else {
            Json(json!({})).into_response()
        }
    }

    let addr = spawn_upstream(|addr| {
        Router::new()
            .route("/token", post(|| async { token_response() }))
            .route("/search", get(|| async { wonderwall_search_response() }))
            .route(
                "/audio-features/:id",
                get(|| async { Json(json!({"tempo": 87.0})) }),
            )
            .route(
                "/customsearch",
                get(move |params| search_by_query(addr, params)),
            )
            .route("/oasis/wonderwall/", get(|| async { Html(SHEET_PAGE) }))
    })
    .await;
    let enricher = enricher_against(addr);

    // Misspelled title: the raw-query search pass finds no sheet
    let query = SongQuery::new("wonderwal", "Oasis").unwrap();
    let record = enricher.enrich(&query).await;

    assert_eq!(record.name, "Wonderwall");
    assert_eq!(record.key, "Gsus4");
    assert_eq!(record.notes, SHEET_BODY);
}

#[tokio::test]
async fn test_all_upstreams_erroring_still_merges() {
    let addr = spawn_upstream(|_| {
        Router::new()
            .route(
                "/token",
                post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/customsearch",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
    })
    .await;
    let enricher = enricher_against(addr);

    let query = SongQuery::new("Wonderwall", "Oasis").unwrap();
    let record = enricher.enrich(&query).await;

    assert_eq!(record.name, "Wonderwall");
    assert_eq!(record.artist, "Oasis");
    assert_eq!(record.key, "");
    assert_eq!(record.notes, SHEET_NOT_FOUND_NOTE);
    assert_eq!(record.bpm, None);
    assert_eq!(record.duration_seconds, None);
}
