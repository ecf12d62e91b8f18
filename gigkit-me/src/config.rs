//! Configuration resolution for gigkit-me
//!
//! Provides two-tier configuration resolution with ENV -> TOML priority.
//! All four upstream credentials must resolve before the enrichment pipeline
//! can be constructed; the HTTP server still starts without them so that
//! `/health` can report the degraded state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

pub const CATALOG_CLIENT_ID_ENV: &str = "GIGKIT_CATALOG_CLIENT_ID";
pub const CATALOG_CLIENT_SECRET_ENV: &str = "GIGKIT_CATALOG_CLIENT_SECRET";
pub const SEARCH_API_KEY_ENV: &str = "GIGKIT_SEARCH_API_KEY";
pub const SEARCH_ENGINE_ID_ENV: &str = "GIGKIT_SEARCH_ENGINE_ID";

/// Configuration error (missing or unreadable settings)
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

/// TOML config file contents (`~/.config/gigkit/gigkit-me.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub catalog_client_id: Option<String>,
    pub catalog_client_secret: Option<String>,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
}

/// Fully resolved upstream credentials
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Catalog API OAuth client id
    pub catalog_client_id: String,
    /// Catalog API OAuth client secret
    pub catalog_client_secret: String,
    /// Web search API key
    pub search_api_key: String,
    /// Web search engine/scope identifier
    pub search_engine_id: String,
}

/// Path of the TOML config file, if a user config directory exists
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gigkit").join("gigkit-me.toml"))
}

/// Load the TOML config file, falling back to defaults when absent or broken
///
/// A malformed file is reported and treated as empty rather than refusing to
/// start; ENV values remain usable either way.
pub fn load_toml_config() -> TomlConfig {
    let Some(path) = config_file_path() else {
        return TomlConfig::default();
    };

    if !path.exists() {
        return TomlConfig::default();
    }

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read TOML config {}: {}", path.display(), e);
            return TomlConfig::default();
        }
    };

    match toml::from_str(&content) {
        Ok(config) => {
            info!("Loaded TOML config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to parse TOML config {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Resolve all upstream credentials from ENV -> TOML
pub fn resolve_enrichment_config(toml_config: &TomlConfig) -> Result<EnrichmentConfig, ConfigError> {
    Ok(EnrichmentConfig {
        catalog_client_id: resolve_key(
            "Catalog client id",
            CATALOG_CLIENT_ID_ENV,
            "catalog_client_id",
            toml_config.catalog_client_id.as_deref(),
        )?,
        catalog_client_secret: resolve_key(
            "Catalog client secret",
            CATALOG_CLIENT_SECRET_ENV,
            "catalog_client_secret",
            toml_config.catalog_client_secret.as_deref(),
        )?,
        search_api_key: resolve_key(
            "Search API key",
            SEARCH_API_KEY_ENV,
            "search_api_key",
            toml_config.search_api_key.as_deref(),
        )?,
        search_engine_id: resolve_key(
            "Search engine id",
            SEARCH_ENGINE_ID_ENV,
            "search_engine_id",
            toml_config.search_engine_id.as_deref(),
        )?,
    })
}

/// Resolve a single key with ENV -> TOML priority
fn resolve_key(
    label: &str,
    env_name: &str,
    toml_name: &str,
    toml_value: Option<&str>,
) -> Result<String, ConfigError> {
    let env_value = std::env::var(env_name).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    // Warn if multiple sources (potential misconfiguration)
    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment (highest priority).",
            label
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", label);
        return Ok(value.trim().to_string());
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", label);
        return Ok(value.trim().to_string());
    }

    Err(ConfigError(format!(
        "{} not configured. Please configure using one of:\n\
         1. Environment: {}=your-value-here\n\
         2. TOML config: ~/.config/gigkit/gigkit-me.toml ({} = \"your-value\")",
        label, env_name, toml_name
    )))
}

/// Validate a key value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
