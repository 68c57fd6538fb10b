//! End-to-end discovery pipeline: landing page → hub → crawl → fallback →
//! `DiscoveryResult`.
//!
//! No stage is fatal: a stage that fails to produce a usable page contributes
//! zero candidates and the pipeline always returns a result, possibly empty.
//! "Did we find enough" is the caller's judgment.

use tracing::{debug, info, instrument, warn};
use url::Url;

use pcfharvest_crawler::Crawler;
use pcfharvest_discovery::{HubRubric, find_hub, find_section};
use pcfharvest_fetch::{FetchedPage, PageFetcher};
use pcfharvest_search::{SearchProvider, fallback_search};
use pcfharvest_shared::{
    CandidateLink, CrawlLimits, DiscoveryCounters, DiscoveryResult, ProductTokenSet, Provenance,
    is_pdf_url, registrable_domain,
};

// ---------------------------------------------------------------------------
// DiscoverConfig
// ---------------------------------------------------------------------------

/// Everything one discovery run needs, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct DiscoverConfig {
    /// Product type to harvest (e.g., "laptop").
    pub product_type: String,
    /// Brand's PCF landing page.
    pub landing_url: Url,
    /// Crawl budget.
    pub limits: CrawlLimits,
    /// Search fallback triggers below this count.
    pub target_count: usize,
    /// Hard cap on the merged result set.
    pub max_total: usize,
    /// Maximum search-query variants per run.
    pub max_queries: usize,
    /// Hub scoring rubric.
    pub hub_rubric: HubRubric,
    /// Caller asserts the landing page itself lists the reports: skip hub
    /// navigation and extract from the landing page only.
    pub listing_page: bool,
}

// ---------------------------------------------------------------------------
// discover
// ---------------------------------------------------------------------------

/// Run one discovery: hub navigation, bounded crawl, then the search
/// fallback when the crawl under-delivers.
#[instrument(skip_all, fields(landing = %config.landing_url, product_type = %config.product_type))]
pub async fn discover<F, P>(
    config: &DiscoverConfig,
    fetcher: &F,
    provider: Option<&P>,
) -> DiscoveryResult
where
    F: PageFetcher,
    P: SearchProvider,
{
    let tokens = ProductTokenSet::expand(&config.product_type);
    let mut counters = DiscoveryCounters::default();

    // A start URL that is itself a PDF needs no discovery at all.
    if is_pdf_url(&config.landing_url) {
        info!("landing URL is a direct PDF, skipping discovery");
        let name = config
            .landing_url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or_default()
            .to_string();
        counters.candidates_seen = 1;
        counters.candidates_accepted = 1;
        return DiscoveryResult {
            landing_url: config.landing_url.clone(),
            hub_url: None,
            section: None,
            pdf_links: vec![CandidateLink {
                url: config.landing_url.clone(),
                text: name,
                source_attr: None,
                provenance: Provenance::AnchorTag,
            }],
            counters,
        };
    }

    // --- Phase 1: hub navigation ---
    let mut hub_url: Option<Url> = None;
    let mut section: Option<String> = None;
    let mut start_url = config.landing_url.clone();
    let mut start_page: Option<FetchedPage> = None;
    let mut crawled_before_start: Vec<Url> = Vec::new();
    let mut limits = config.limits;

    if config.listing_page {
        // Caller knows the landing page is the listing: stay on it.
        info!("caller marked landing as the listing page, skipping hub navigation");
        limits.max_depth = 0;
    } else {
        match fetcher.fetch(&config.landing_url).await {
            Ok(landing_page) => {
                let hub =
                    find_hub(&landing_page.final_url, &landing_page.html, &config.hub_rubric);

                match hub {
                    Some(scored) if !same_page(&scored.link.url, &landing_page.final_url) => {
                        hub_url = Some(scored.link.url.clone());
                        counters.pages_visited += 1;

                        match fetcher.fetch(&scored.link.url).await {
                            Ok(hub_page) => {
                                section = find_section(&hub_page.html, &tokens);
                                start_url = hub_page.final_url.clone();
                                crawled_before_start.push(landing_page.final_url.clone());
                                start_page = Some(hub_page);
                            }
                            Err(e) => {
                                warn!(hub = %scored.link.url, error = %e, "hub fetch failed, crawling from it anyway");
                                start_url = scored.link.url.clone();
                                crawled_before_start.push(landing_page.final_url.clone());
                            }
                        }
                    }
                    _ => {
                        // No hub cleared the threshold (or it is this page):
                        // the landing page is the hub.
                        section = find_section(&landing_page.html, &tokens);
                        start_url = landing_page.final_url.clone();
                        start_page = Some(landing_page);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "landing fetch failed, crawl starts cold");
            }
        }
    }

    // --- Phase 2: bounded crawl ---
    let crawler = Crawler::new(limits);
    let outcome = crawler
        .crawl_from(
            fetcher,
            &start_url,
            start_page.as_ref().map(|p| p.html.as_str()),
            &tokens,
            &crawled_before_start,
        )
        .await;

    counters.pages_visited += outcome.pages_visited;
    counters.candidates_seen += outcome.candidates_seen;
    counters.parse_warnings += outcome.parse_warnings;

    let mut accepted = outcome.accepted;

    // --- Phase 3: search fallback ---
    if accepted.len() < config.target_count {
        if let Some(provider) = provider {
            let brand_domain = config
                .landing_url
                .host_str()
                .map(registrable_domain)
                .unwrap_or_default();

            let fallback = fallback_search(
                provider,
                &brand_domain,
                &tokens,
                &accepted,
                config.target_count,
                config.max_queries,
            )
            .await;

            counters.search_queries = fallback.queries_issued;
            counters.candidates_seen += fallback.links.len();
            accepted.extend(fallback.links);
        } else {
            debug!(
                found = accepted.len(),
                target_count = config.target_count,
                "yield below target but no search provider configured"
            );
        }
    }

    // --- Phase 4: cap and assemble ---
    if accepted.len() > config.max_total {
        accepted.truncate(config.max_total);
    }
    counters.candidates_accepted = accepted.len();

    info!(
        accepted = accepted.len(),
        pages_visited = counters.pages_visited,
        hub = hub_url.as_ref().map(|u| u.as_str()).unwrap_or("-"),
        "discovery complete"
    );

    DiscoveryResult {
        landing_url: config.landing_url.clone(),
        hub_url,
        section,
        pdf_links: accepted,
        counters,
    }
}

/// Hub links sometimes point back at the landing page (same-page tabs);
/// following them would fetch the same document twice.
fn same_page(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}
