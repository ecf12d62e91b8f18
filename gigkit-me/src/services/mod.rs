//! Enrichment pipeline services
//!
//! One module per upstream collaborator plus the orchestrator that composes
//! them into the two-branch pipeline.

pub mod catalog_auth;
pub mod catalog_resolver;
pub mod enrichment;
pub mod sheet_scraper;
pub mod sheet_search;

pub use catalog_auth::{CatalogAuthBroker, CatalogCredential, TokenCache};
pub use catalog_resolver::CatalogResolver;
pub use enrichment::Enricher;
pub use sheet_scraper::SheetScraper;
pub use sheet_search::SheetSearchClient;
