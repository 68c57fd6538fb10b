//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use pcfharvest_core::{DiscoverConfig, HubRubric, discover};
use pcfharvest_fetch::HttpFetcher;
use pcfharvest_search::ExaClient;
use pcfharvest_shared::{
    AppConfig, CrawlLimits, DiscoveryResult, config_file_path, init_config, load_config,
};
use pcfharvest_storage::DocumentStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pcfharvest — collect Product Carbon Footprint reports.
#[derive(Parser)]
#[command(
    name = "pcfharvest",
    version,
    about = "Discover and download Product Carbon Footprint PDFs from brand websites.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Discover and download PCF reports for a brand and product type.
    Harvest {
        /// Brand name (used for the output directory and the summary).
        brand: String,

        /// Product type (e.g., "laptop").
        product_type: String,

        /// The brand's PCF landing page URL.
        landing_url: String,

        /// The landing page already lists the reports; skip hub navigation.
        #[arg(long)]
        listing_page: bool,

        /// Output directory (defaults to the configured one).
        #[arg(short, long)]
        out: Option<String>,

        /// Trigger the search fallback below this many PDFs.
        #[arg(long)]
        min_expected: Option<usize>,

        /// Never query the external search index.
        #[arg(long)]
        no_fallback: bool,
    },

    /// Discovery only: print the PDF URLs that would be downloaded.
    Discover {
        /// Product type (e.g., "laptop").
        product_type: String,

        /// The brand's PCF landing page URL.
        landing_url: String,

        /// The landing page already lists the reports; skip hub navigation.
        #[arg(long)]
        listing_page: bool,

        /// Trigger the search fallback below this many PDFs.
        #[arg(long)]
        min_expected: Option<usize>,

        /// Never query the external search index.
        #[arg(long)]
        no_fallback: bool,

        /// Emit the full discovery result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pcfharvest=info",
        1 => "pcfharvest=debug",
        _ => "pcfharvest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Harvest {
            brand,
            product_type,
            landing_url,
            listing_page,
            out,
            min_expected,
            no_fallback,
        } => {
            cmd_harvest(
                &brand,
                &product_type,
                &landing_url,
                listing_page,
                out.as_deref(),
                min_expected,
                no_fallback,
            )
            .await
        }
        Command::Discover {
            product_type,
            landing_url,
            listing_page,
            min_expected,
            no_fallback,
            json,
        } => {
            cmd_discover(
                &product_type,
                &landing_url,
                listing_page,
                min_expected,
                no_fallback,
                json,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Harvest
// ---------------------------------------------------------------------------

async fn cmd_harvest(
    brand: &str,
    product_type: &str,
    landing_url: &str,
    listing_page: bool,
    out: Option<&str>,
    min_expected: Option<usize>,
    no_fallback: bool,
) -> Result<()> {
    let config = load_config()?;
    let fetcher = HttpFetcher::new(&config.http)?;

    let result = run_discovery(
        &config,
        &fetcher,
        product_type,
        landing_url,
        listing_page,
        min_expected,
        no_fallback,
    )
    .await?;

    // --- Download phase ---
    let output_dir = expand_path(out.unwrap_or(&config.defaults.output_dir));
    let store = DocumentStore::new(&output_dir);

    let bar = ProgressBar::new(result.pdf_links.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/dim} {pos}/{len} {msg}")
            .expect("progress template"),
    );

    let mut saved = Vec::new();
    for link in &result.pdf_links {
        bar.set_message(link.url.to_string());
        match store.download(&fetcher, link, brand).await {
            Ok(Some(doc)) => saved.push(doc),
            Ok(None) => {}
            Err(e) => warn!(url = %link.url, error = %e, "download failed"),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let manifest = store.write_manifest(brand, &saved)?;
    info!(manifest = %manifest.display(), "manifest written");

    // --- Summary ---
    println!();
    println!("  Summary");
    println!("  -------");
    println!("  Brand / Type:  {brand} / {product_type}");
    println!("  Landing URL:   {}", result.landing_url);
    println!(
        "  PCF hub:       {}",
        result
            .hub_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "(landing page)".into())
    );
    if let Some(section) = &result.section {
        println!("  Section:       #{section}");
    }
    println!("  Pages visited: {}", result.counters.pages_visited);
    println!(
        "  PDFs found:    {} ({} seen, {} search queries)",
        result.counters.candidates_accepted,
        result.counters.candidates_seen,
        result.counters.search_queries
    );
    println!("  Downloaded:    {}", saved.len());
    println!("  Output:        {}", store.brand_dir(brand).display());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Discover
// ---------------------------------------------------------------------------

async fn cmd_discover(
    product_type: &str,
    landing_url: &str,
    listing_page: bool,
    min_expected: Option<usize>,
    no_fallback: bool,
    json: bool,
) -> Result<()> {
    let config = load_config()?;
    let fetcher = HttpFetcher::new(&config.http)?;

    let result = run_discovery(
        &config,
        &fetcher,
        product_type,
        landing_url,
        listing_page,
        min_expected,
        no_fallback,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for link in &result.pdf_links {
        println!("{:<16} {}", format!("[{}]", link.provenance), link.url);
    }
    println!();
    println!(
        "  {} PDFs from {} pages ({} candidates seen)",
        result.counters.candidates_accepted,
        result.counters.pages_visited,
        result.counters.candidates_seen
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Shared discovery runner
// ---------------------------------------------------------------------------

async fn run_discovery(
    config: &AppConfig,
    fetcher: &HttpFetcher,
    product_type: &str,
    landing_url: &str,
    listing_page: bool,
    min_expected: Option<usize>,
    no_fallback: bool,
) -> Result<DiscoveryResult> {
    let landing = Url::parse(landing_url)
        .map_err(|e| eyre!("invalid landing URL '{landing_url}': {e}"))?;

    let discover_config = DiscoverConfig {
        product_type: product_type.to_string(),
        landing_url: landing,
        limits: CrawlLimits::from(config),
        target_count: min_expected.unwrap_or(config.defaults.target_count),
        max_total: config.defaults.max_total,
        max_queries: config.search.max_queries,
        hub_rubric: HubRubric::default().with_min_score(config.hub.min_score),
        listing_page,
    };

    // The search fallback is optional: without a key, discovery still runs.
    let provider = if no_fallback {
        None
    } else {
        match ExaClient::from_config(&config.search) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "search fallback disabled");
                None
            }
        }
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("spinner template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(format!("Discovering {product_type} PCFs"));

    let result = discover(&discover_config, fetcher, provider.as_ref()).await;

    spinner.finish_and_clear();
    Ok(result)
}

/// Expand a leading `~/` to the user's home directory.
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config file created at {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;
    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
