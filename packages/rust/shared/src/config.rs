//! Application configuration for pcfharvest.
//!
//! User config lives at `~/.pcfharvest/pcfharvest.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pcfharvest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pcfharvest";

// ---------------------------------------------------------------------------
// Config structs (matching pcfharvest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP fetch settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// External search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Hub selection settings.
    #[serde(default)]
    pub hub: HubConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory downloaded documents are stored under.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum crawl depth from the start page.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum pages fetched per crawl.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum PDFs accepted per crawl.
    #[serde(default = "default_max_pdfs")]
    pub max_pdfs: usize,

    /// Search fallback triggers when the crawl yields fewer than this.
    #[serde(default = "default_target_count")]
    pub target_count: usize,

    /// Hard cap on the merged result set.
    #[serde(default = "default_max_total")]
    pub max_total: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            max_pdfs: default_max_pdfs(),
            target_count: default_target_count(),
            max_total: default_max_total(),
        }
    }
}

fn default_output_dir() -> String {
    "~/pcfharvest-data".into()
}
fn default_max_depth() -> u32 {
    2
}
fn default_max_pages() -> usize {
    60
}
fn default_max_pdfs() -> usize {
    40
}
fn default_target_count() -> usize {
    20
}
fn default_max_total() -> usize {
    60
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures (connect errors, 429, 5xx).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in ms; doubles per attempt.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Minimum ms between requests (politeness throttle).
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            rate_limit_ms: default_rate_limit(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    5
}
fn default_backoff_base_ms() -> u64 {
    800
}
fn default_rate_limit() -> u64 {
    400
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search API endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Results requested per query.
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// Maximum query variants per fallback invocation.
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_api_key_env(),
            results_per_query: default_results_per_query(),
            max_queries: default_max_queries(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.exa.ai/search".into()
}
fn default_api_key_env() -> String {
    "EXA_API_KEY".into()
}
fn default_results_per_query() -> usize {
    30
}
fn default_max_queries() -> usize {
    4
}

/// `[hub]` section. Scoring weights are tunable parameters, not contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Minimum score an outbound link needs to be followed as the hub.
    #[serde(default = "default_hub_min_score")]
    pub min_score: i32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            min_score: default_hub_min_score(),
        }
    }
}

fn default_hub_min_score() -> i32 {
    8
}

// ---------------------------------------------------------------------------
// Crawl limits (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl budget — merged from config file + CLI flags. The three caps
/// are enforced independently by the crawler.
#[derive(Debug, Clone, Copy)]
pub struct CrawlLimits {
    /// Maximum depth from the start URL.
    pub max_depth: u32,
    /// Maximum pages fetched.
    pub max_pages: usize,
    /// Maximum PDFs accepted.
    pub max_pdfs: usize,
}

impl From<&AppConfig> for CrawlLimits {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_depth: config.defaults.max_depth,
            max_pages: config.defaults.max_pages,
            max_pdfs: config.defaults.max_pdfs,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pcfharvest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HarvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pcfharvest/pcfharvest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HarvestError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| HarvestError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HarvestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HarvestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("EXA_API_KEY"));
        assert!(toml_str.contains("min_score"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_depth, 2);
        assert_eq!(parsed.defaults.target_count, 20);
        assert_eq!(parsed.search.api_key_env, "EXA_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
max_pdfs = 10

[http]
rate_limit_ms = 0
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.max_pdfs, 10);
        assert_eq!(config.defaults.max_depth, 2);
        assert_eq!(config.http.rate_limit_ms, 0);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.hub.min_score, 8);
    }

    #[test]
    fn crawl_limits_from_app_config() {
        let app = AppConfig::default();
        let limits = CrawlLimits::from(&app);
        assert_eq!(limits.max_depth, 2);
        assert_eq!(limits.max_pages, 60);
        assert_eq!(limits.max_pdfs, 40);
    }
}
