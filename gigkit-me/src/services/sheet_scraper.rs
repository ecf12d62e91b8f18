//! Chord sheet page scraper
//!
//! Fetches a chord sheet page and extracts the pre-formatted chord/lyric
//! block plus the song key label. The markup assumptions (a `<pre>` block
//! for the sheet, a `#cifra_tom` element for the key) are the whole contract
//! with the sheet site and live only in this module, so a site redesign is
//! contained here.

use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

use crate::models::ChordSheet;

/// Some sheet sites block default client identifiers, so the scraper
/// presents a realistic browser User-Agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 10;

const SHEET_BLOCK_SELECTOR: &str = "pre";
const KEY_LABEL_SELECTOR: &str = "#cifra_tom";

/// Scraper errors
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Sheet page returned an error response
    #[error("HTTP error {0}: {1}")]
    Http(u16, String),
}

/// Chord sheet page scraper
pub struct SheetScraper {
    http_client: reqwest::Client,
}

impl SheetScraper {
    pub fn new() -> Result<Self, ScrapeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }

    /// Fetch a sheet page and extract its chord sheet
    ///
    /// `Ok(None)` means the page had no extractable sheet content; that is a
    /// legitimate terminal state, not an error.
    pub async fn fetch_sheet(&self, url: &Url) -> Result<Option<ChordSheet>, ScrapeError> {
        tracing::debug!(url = %url, "Fetching chord sheet page");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Http(status.as_u16(), error_text));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        Ok(extract_sheet(&html))
    }
}

/// Extract the chord sheet from page HTML
///
/// Line-break markup inside the sheet block is converted to newlines BEFORE
/// the remaining tags are stripped; stripping first would fuse adjacent
/// lines into one.
pub(crate) fn extract_sheet(html: &str) -> Option<ChordSheet> {
    let document = Html::parse_document(html);

    let sheet_selector = Selector::parse(SHEET_BLOCK_SELECTOR).ok()?;
    let key_selector = Selector::parse(KEY_LABEL_SELECTOR).ok()?;

    let block = document.select(&sheet_selector).next()?;

    let mut raw = block.inner_html();
    for line_break in ["<br>", "<br/>", "<br />"] {
        raw = raw.replace(line_break, "\n");
    }

    let body = strip_markup(&raw).replace("\r\n", "\n");
    let body = body.trim().to_string();

    if body.is_empty() {
        return None;
    }

    let key = document
        .select(&key_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    Some(ChordSheet { key, body })
}

/// Strip any markup left in a fragment, keeping text content
fn strip_markup(fragment: &str) -> String {
    Html::parse_fragment(fragment).root_element().text().collect()
}
