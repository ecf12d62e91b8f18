//! Catalog API credential broker
//!
//! Obtains short-lived bearer tokens via the OAuth client-credentials grant
//! and caches them process-wide for their validity window. The cache is an
//! injected [`TokenCache`] so tests can seed expired or fake tokens without
//! process-wide side effects. Authentication failures are not retried; the
//! orchestrator downgrades them to an absent catalog branch.

use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const CATALOG_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const USER_AGENT: &str = "GigKit/0.1.0 (https://github.com/gigkit/gigkit)";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Tokens within this margin of expiry are refreshed early so a token is not
/// handed out mid-request with almost no lifetime left.
const EXPIRY_SAFETY_MARGIN_SECS: u64 = 30;

/// Credential broker errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Token endpoint rejected the client credentials
    #[error("Token endpoint rejected credentials: HTTP {0}: {1}")]
    Rejected(u16, String),

    /// Failed to parse token endpoint response
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// A cached bearer token with its expiry instant
#[derive(Debug, Clone)]
pub struct CatalogCredential {
    pub access_token: String,
    pub expires_at: Instant,
}

impl CatalogCredential {
    pub fn new(access_token: String, valid_for: Duration) -> Self {
        Self {
            access_token,
            expires_at: Instant::now() + valid_for,
        }
    }

    /// True once the token is past (or within the safety margin of) expiry
    pub fn is_expired(&self) -> bool {
        Instant::now() + Duration::from_secs(EXPIRY_SAFETY_MARGIN_SECS) >= self.expires_at
    }
}

/// Process-wide token cache with get-or-refresh discipline
///
/// Two concurrent refreshes racing is acceptable and self-correcting; the
/// lock only serializes refreshes through a single broker instance.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CatalogCredential>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache seeded with an existing credential (test substitution point)
    pub fn preloaded(credential: CatalogCredential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

/// Client-credentials broker for the catalog API
pub struct CatalogAuthBroker {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cache: TokenCache,
}

impl CatalogAuthBroker {
    pub fn new(
        client_id: String,
        client_secret: String,
        cache: TokenCache,
    ) -> Result<Self, AuthError> {
        Self::with_token_url(client_id, client_secret, cache, CATALOG_TOKEN_URL)
    }

    pub fn with_token_url(
        client_id: String,
        client_secret: String,
        cache: TokenCache,
        token_url: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            token_url: token_url.into(),
            client_id,
            client_secret,
            cache,
        })
    }

    /// Return a valid bearer token, refreshing the cached one if needed
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        let mut slot = self.cache.slot.lock().await;

        if let Some(credential) = slot.as_ref() {
            if !credential.is_expired() {
                return Ok(credential.access_token.clone());
            }
            tracing::debug!("Cached catalog token expired, refreshing");
        }

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(status.as_u16(), error_text));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        tracing::info!(expires_in = token.expires_in, "Obtained catalog access token");

        let credential =
            CatalogCredential::new(token.access_token, Duration::from_secs(token.expires_in));
        let access_token = credential.access_token.clone();
        *slot = Some(credential);

        Ok(access_token)
    }
}
