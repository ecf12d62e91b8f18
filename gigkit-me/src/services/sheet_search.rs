//! Reference search client for chord sheet pages
//!
//! Issues a keyed, engine-scoped web search for `"<artist> <title> <site
//! keyword>"` and scans the top results in rank order for the first link that
//! is actually a chord sheet page: it must live on the sheet site's domain
//! and must not be a video-lesson subpage (those carry no extractable text).

use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const SEARCH_API_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const USER_AGENT: &str = "GigKit/0.1.0 (https://github.com/gigkit/gigkit)";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Keyword appended to the query to steer results toward chord sheets
const SHEET_SITE_KEYWORD: &str = "cifra";

/// Domain the admissible links must belong to
const SHEET_DOMAIN: &str = "cifraclub.com.br";

/// Path fragments that mark video-lesson subpages (no text sheet on them)
const EXCLUDED_PATH_PATTERNS: &[&str] = &["videoaulas", "video-aula"];

/// Results scanned in rank order before giving up
const RESULT_SCAN_LIMIT: usize = 5;

/// Search client errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Search API returned an error response
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Failed to parse API response JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Search response envelope; `items` is absent when there are no results
#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

/// Keyed web-search client restricted to one engine scope
pub struct SheetSearchClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
    sheet_domain: String,
}

impl SheetSearchClient {
    pub fn new(api_key: String, engine_id: String) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, engine_id, SEARCH_API_BASE_URL, SHEET_DOMAIN)
    }

    pub fn with_base_url(
        api_key: String,
        engine_id: String,
        base_url: impl Into<String>,
        sheet_domain: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key,
            engine_id,
            sheet_domain: sheet_domain.into(),
        })
    }

    /// Find the first admissible chord sheet link for a song
    ///
    /// `Ok(None)` means no result passed the filters; expected, not an error.
    pub async fn find_sheet_link(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<Url>, SearchError> {
        let query = format!("{} {} {}", artist, title, SHEET_SITE_KEYWORD);

        tracing::debug!(q = %query, "Querying sheet link search");

        let limit = RESULT_SCAN_LIMIT.to_string();
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query.as_str()),
                ("num", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::Api(status.as_u16(), error_text));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let items = search.items.unwrap_or_default();
        let link = first_admissible_link(&items, &self.sheet_domain);

        if let Some(link) = &link {
            tracing::info!(url = %link, "Found chord sheet link");
        }

        Ok(link)
    }
}

/// Scan results in rank order and return the first admissible link
fn first_admissible_link(items: &[SearchItem], sheet_domain: &str) -> Option<Url> {
    items.iter().take(RESULT_SCAN_LIMIT).find_map(|item| {
        let url = Url::parse(&item.link).ok()?;
        is_admissible(&url, sheet_domain).then_some(url)
    })
}

/// A link is admissible when it is on the sheet domain and not excluded
fn is_admissible(url: &Url, sheet_domain: &str) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };

    let on_domain = host == sheet_domain || host.ends_with(&format!(".{}", sheet_domain));
    let path = url.path();
    let excluded = EXCLUDED_PATH_PATTERNS
        .iter()
        .any(|pattern| path.contains(pattern));

    on_domain && !excluded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(link: &str) -> SearchItem {
        SearchItem {
            link: link.to_string(),
        }
    }

    #[test]
    fn test_admissible_requires_sheet_domain() {
        let url = Url::parse("https://www.cifraclub.com.br/oasis/wonderwall/").unwrap();
        assert!(is_admissible(&url, SHEET_DOMAIN));

        let url = Url::parse("https://www.letras.mus.br/oasis/wonderwall/").unwrap();
        assert!(!is_admissible(&url, SHEET_DOMAIN));
    }

    #[test]
    fn test_admissible_rejects_lookalike_domain_suffix() {
        // Same characters, but not a subdomain boundary
        let url = Url::parse("https://fakecifraclub.com.br/oasis/wonderwall/").unwrap();
        assert!(!is_admissible(&url, SHEET_DOMAIN));
    }

    #[test]
    fn test_admissible_rejects_video_lesson_paths() {
        let url =
            Url::parse("https://www.cifraclub.com.br/oasis/wonderwall/videoaulas/").unwrap();
        assert!(!is_admissible(&url, SHEET_DOMAIN));
    }

    #[test]
    fn test_first_admissible_link_skips_filtered_results() {
        let items = vec![
            item("https://www.cifraclub.com.br/oasis/wonderwall/videoaulas/"),
            item("https://www.letras.mus.br/oasis/wonderwall/"),
            item("https://www.cifraclub.com.br/oasis/wonderwall/"),
            item("https://www.cifraclub.com.br/oasis/supersonic/"),
        ];

        let link = first_admissible_link(&items, SHEET_DOMAIN).unwrap();

        assert_eq!(
            link.as_str(),
            "https://www.cifraclub.com.br/oasis/wonderwall/"
        );
    }

    #[test]
    fn test_first_admissible_link_ignores_unparseable_urls() {
        let items = vec![
            item("not a url"),
            item("https://www.cifraclub.com.br/oasis/wonderwall/"),
        ];

        assert!(first_admissible_link(&items, SHEET_DOMAIN).is_some());
    }

    #[test]
    fn test_no_admissible_link_is_none() {
        let items = vec![item("https://www.letras.mus.br/oasis/wonderwall/")];
        assert!(first_admissible_link(&items, SHEET_DOMAIN).is_none());
    }
}
