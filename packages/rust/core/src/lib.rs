//! Discovery orchestration for pcfharvest.
//!
//! Ties hub navigation, the site crawl, and the search fallback into one
//! end-to-end discovery run producing a [`pcfharvest_shared::DiscoveryResult`].

pub mod pipeline;

// Re-exported because `DiscoverConfig` embeds it.
pub use pcfharvest_discovery::HubRubric;
pub use pipeline::{DiscoverConfig, discover};
