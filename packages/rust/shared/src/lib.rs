//! Shared types, error model, and configuration for pcfharvest.
//!
//! This crate is the foundation depended on by all other pcfharvest crates.
//! It provides:
//! - [`HarvestError`] — the unified error type
//! - Domain types ([`CandidateLink`], [`Provenance`], [`DiscoveryResult`])
//! - The product-type token expander ([`ProductTokenSet`])
//! - Configuration ([`AppConfig`], [`CrawlLimits`], config loading)

pub mod config;
pub mod error;
pub mod tokens;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlLimits, DefaultsConfig, HttpConfig, HubConfig, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{HarvestError, Result};
pub use tokens::ProductTokenSet;
pub use types::{
    CandidateLink, DiscoveryCounters, DiscoveryResult, Provenance, is_pdf_url, normalize_url,
    registrable_domain, same_registrable_domain,
};
