//! Breadth-first, budget-bounded site traversal.
//!
//! The crawler walks a brand's site from a start page, runs the PDF link
//! extractor on every page, and keeps only candidates relevant to the
//! requested product tokens. Traversal is sequential (one fetch in flight at
//! a time; politeness lives in the fetch capability) and bounded three ways:
//! depth, pages fetched, and PDFs accepted. Each cap is enforced
//! independently and never discards already-collected results.

use std::collections::{HashSet, VecDeque};

use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};
use url::Url;

use pcfharvest_extract::Extractor;
use pcfharvest_fetch::PageFetcher;
use pcfharvest_shared::{
    CandidateLink, CrawlLimits, ProductTokenSet, is_pdf_url, normalize_url,
    same_registrable_domain,
};

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

// ---------------------------------------------------------------------------
// CrawlOutcome
// ---------------------------------------------------------------------------

/// What one crawl produced.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Accepted candidates, in discovery order, capped at `max_pdfs`.
    pub accepted: Vec<CandidateLink>,
    /// Pages fetched (or attempted).
    pub pages_visited: usize,
    /// Candidates seen before relevance filtering.
    pub candidates_seen: usize,
    /// Malformed fragments skipped during extraction.
    pub parse_warnings: usize,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Same-domain BFS crawler. One instance per discovery run.
pub struct Crawler {
    limits: CrawlLimits,
    extractor: Extractor,
}

impl Crawler {
    /// Create a crawler with the given budget.
    pub fn new(limits: CrawlLimits) -> Self {
        Self {
            limits,
            extractor: Extractor::new(),
        }
    }

    /// Crawl from `start_url`, accepting PDFs relevant to `tokens`.
    ///
    /// Fetch failures degrade to "no links from this page"; the crawl always
    /// completes. The visited set is keyed by normalized URL and checked at
    /// enqueue time, so no URL is ever fetched twice even when the link graph
    /// has cycles.
    pub async fn crawl<F: PageFetcher>(
        &self,
        fetcher: &F,
        start_url: &Url,
        tokens: &ProductTokenSet,
    ) -> CrawlOutcome {
        self.crawl_from(fetcher, start_url, None, tokens, &[]).await
    }

    /// [`Crawler::crawl`], with the start page's HTML supplied by the caller
    /// (when the orchestrator already fetched it) and a set of URLs the
    /// caller already visited, which the crawl must not fetch again.
    #[instrument(skip_all, fields(start_url = %start_url))]
    pub async fn crawl_from<F: PageFetcher>(
        &self,
        fetcher: &F,
        start_url: &Url,
        start_html: Option<&str>,
        tokens: &ProductTokenSet,
        already_visited: &[Url],
    ) -> CrawlOutcome {
        let mut frontier: VecDeque<(Url, u32)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut accepted_keys: HashSet<String> = HashSet::new();
        let mut outcome = CrawlOutcome::default();
        let mut prefetched = start_html.map(str::to_string);

        for url in already_visited {
            visited.insert(normalize_url(url));
        }
        visited.insert(normalize_url(start_url));
        frontier.push_back((start_url.clone(), 0));

        info!(
            max_depth = self.limits.max_depth,
            max_pages = self.limits.max_pages,
            max_pdfs = self.limits.max_pdfs,
            "starting crawl"
        );

        'frontier: while let Some((url, depth)) = frontier.pop_front() {
            if outcome.pages_visited >= self.limits.max_pages {
                debug!("max_pages reached, stopping crawl");
                break;
            }
            if outcome.accepted.len() >= self.limits.max_pdfs {
                break;
            }

            outcome.pages_visited += 1;

            let (page_url, html) = if depth == 0 && prefetched.is_some() {
                (url.clone(), prefetched.take().expect("prefetched html"))
            } else {
                match fetcher.fetch(&url).await {
                    Ok(page) => (page.final_url, page.html),
                    Err(e) => {
                        warn!(%url, error = %e, "fetch failed, skipping page");
                        continue;
                    }
                }
            };

            let extraction = self.extractor.extract(&page_url, &html);
            outcome.parse_warnings += extraction.warnings;
            outcome.candidates_seen += extraction.links.len();

            for link in extraction.links {
                if !same_registrable_domain(start_url, &link.url) {
                    continue;
                }
                if !is_relevant(&link, tokens) {
                    debug!(url = %link.url, "candidate filtered by tokens");
                    continue;
                }
                if !accepted_keys.insert(link.dedup_key()) {
                    continue;
                }
                outcome.accepted.push(link);
                if outcome.accepted.len() >= self.limits.max_pdfs {
                    debug!("max_pdfs reached, stopping crawl");
                    break 'frontier;
                }
            }

            if depth >= self.limits.max_depth {
                continue;
            }

            for next in outbound_links(&page_url, &html) {
                if !same_registrable_domain(start_url, &next) {
                    continue;
                }
                // PDFs are documents, not pages to crawl.
                if is_pdf_url(&next) {
                    continue;
                }
                if visited.insert(normalize_url(&next)) {
                    frontier.push_back((next, depth + 1));
                }
            }
        }

        info!(
            pages_visited = outcome.pages_visited,
            candidates_seen = outcome.candidates_seen,
            accepted = outcome.accepted.len(),
            "crawl completed"
        );

        outcome
    }
}

/// A candidate survives when its URL path or context text matches a token.
fn is_relevant(link: &CandidateLink, tokens: &ProductTokenSet) -> bool {
    tokens.matches(link.url.path()) || tokens.matches(&link.text)
}

/// All followable links on a page, resolved against the page URL.
fn outbound_links(base: &Url, html: &str) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let mut links = Vec::new();

    for el in doc.select(&ANCHOR_SEL) {
        let href = el.value().attr("href").unwrap_or_default().trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
        {
            continue;
        }
        if let Ok(mut resolved) = base.join(href) {
            if resolved.scheme() == "http" || resolved.scheme() == "https" {
                resolved.set_fragment(None);
                links.push(resolved);
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcfharvest_fetch::HttpFetcher;
    use pcfharvest_shared::HttpConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&HttpConfig {
            timeout_secs: 5,
            max_retries: 0,
            backoff_base_ms: 1,
            rate_limit_ms: 0,
        })
        .unwrap()
    }

    fn limits(max_depth: u32, max_pages: usize, max_pdfs: usize) -> CrawlLimits {
        CrawlLimits {
            max_depth,
            max_pages,
            max_pdfs,
        }
    }

    async fn mount(server: &MockServer, route: &str, body: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn stays_on_domain_and_never_revisits() {
        let server = MockServer::start().await;

        // Cyclic 3-page site; /a links back to the root and /b links to /a.
        let root = r#"<a href="/a">Laptops</a> <a href="/b">More</a>
                      <a href="https://elsewhere.example/pcf">External</a>"#;
        let a = r#"<a href="/">Home</a> <a href="/b">B</a> <a href="/pcf/laptop-1.pdf">Laptop 1 PCF</a>"#;
        let b = r#"<a href="/a">A</a> <a href="/pcf/laptop-2.pdf">Laptop 2 PCF</a>"#;

        mount(&server, "/", root, 1).await;
        mount(&server, "/a", a, 1).await;
        mount(&server, "/b", b, 1).await;

        let start = Url::parse(&server.uri()).unwrap();
        let tokens = ProductTokenSet::expand("laptop");
        let outcome = Crawler::new(limits(2, 10, 10))
            .crawl(&fetcher(), &start, &tokens)
            .await;

        // expect(1) on each mock verifies no page was fetched twice; the
        // cross-domain link never entered the frontier.
        assert_eq!(outcome.pages_visited, 3);
        assert_eq!(outcome.accepted.len(), 2);
        server.verify().await;
    }

    #[tokio::test]
    async fn max_pdfs_truncates_in_discovery_order() {
        let server = MockServer::start().await;

        let listing: String = (1..=10)
            .map(|i| format!(r#"<a href="/pcf/laptop-{i}.pdf">Laptop {i}</a>"#))
            .collect();
        mount(&server, "/", &listing, 1).await;

        let start = Url::parse(&server.uri()).unwrap();
        let tokens = ProductTokenSet::expand("laptop");
        let outcome = Crawler::new(limits(2, 10, 3))
            .crawl(&fetcher(), &start, &tokens)
            .await;

        assert_eq!(outcome.accepted.len(), 3);
        let urls: Vec<&str> = outcome.accepted.iter().map(|l| l.url.path()).collect();
        assert_eq!(urls, ["/pcf/laptop-1.pdf", "/pcf/laptop-2.pdf", "/pcf/laptop-3.pdf"]);
        assert_eq!(outcome.candidates_seen, 10);
    }

    #[tokio::test]
    async fn depth_cap_prunes_deep_pages() {
        let server = MockServer::start().await;

        mount(&server, "/", r#"<a href="/d1">deeper</a>"#, 1).await;
        mount(&server, "/d1", r#"<a href="/d2">deeper</a>"#, 1).await;
        mount(&server, "/d2", r#"<a href="/d3">deeper</a>"#, 1).await;
        mount(&server, "/d3", "never reached", 0).await;

        let start = Url::parse(&server.uri()).unwrap();
        let tokens = ProductTokenSet::expand("laptop");
        let outcome = Crawler::new(limits(2, 10, 10))
            .crawl(&fetcher(), &start, &tokens)
            .await;

        assert_eq!(outcome.pages_visited, 3);
        server.verify().await;
    }

    #[tokio::test]
    async fn token_filter_discards_other_products() {
        let server = MockServer::start().await;

        let listing = r#"<a href="/pcf/laptop-a.pdf">Laptop A</a>
                         <a href="/pcf/phone-x.pdf">Phone X</a>"#;
        mount(&server, "/", listing, 1).await;

        let start = Url::parse(&server.uri()).unwrap();
        let tokens = ProductTokenSet::expand("laptop");
        let outcome = Crawler::new(limits(2, 10, 10))
            .crawl(&fetcher(), &start, &tokens)
            .await;

        assert_eq!(outcome.candidates_seen, 2);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].url.path(), "/pcf/laptop-a.pdf");
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_empty_page() {
        let server = MockServer::start().await;

        mount(
            &server,
            "/",
            r#"<a href="/broken">Reports</a> <a href="/ok">Laptops</a>"#,
            1,
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount(&server, "/ok", r#"<a href="/pcf/macbook.pdf">MacBook PCF</a>"#, 1).await;

        let start = Url::parse(&server.uri()).unwrap();
        let tokens = ProductTokenSet::expand("laptop");
        let outcome = Crawler::new(limits(2, 10, 10))
            .crawl(&fetcher(), &start, &tokens)
            .await;

        // The failing page still counts as visited; the crawl went on.
        assert_eq!(outcome.pages_visited, 3);
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[tokio::test]
    async fn prefetched_start_skips_refetch_and_already_visited() {
        let server = MockServer::start().await;

        // The start page is handed in by the caller and must not be fetched;
        // the page the caller already visited must not be fetched either.
        mount(&server, "/", "never fetched", 0).await;
        mount(&server, "/seen", "never fetched", 0).await;
        mount(&server, "/next", r#"<a href="/pcf/laptop.pdf">Laptop PCF</a>"#, 1).await;

        let start = Url::parse(&server.uri()).unwrap();
        let seen = start.join("/seen").unwrap();
        let start_html = r#"<a href="/next">Reports</a> <a href="/seen">Back</a>"#;

        let tokens = ProductTokenSet::expand("laptop");
        let outcome = Crawler::new(limits(2, 10, 10))
            .crawl_from(&fetcher(), &start, Some(start_html), &tokens, &[seen])
            .await;

        // The prefetched start still counts as a visited page.
        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.accepted.len(), 1);
        server.verify().await;
    }

    #[tokio::test]
    async fn max_pages_stops_fetching() {
        let server = MockServer::start().await;

        let root: String = (1..=5)
            .map(|i| format!(r#"<a href="/p{i}">page {i}</a>"#))
            .collect();
        mount(&server, "/", &root, 1).await;
        for i in 1..=5 {
            Mock::given(method("GET"))
                .and(path(format!("/p{i}")))
                .respond_with(ResponseTemplate::new(200).set_body_string("leaf"))
                .mount(&server)
                .await;
        }

        let start = Url::parse(&server.uri()).unwrap();
        let tokens = ProductTokenSet::expand("laptop");
        let outcome = Crawler::new(limits(2, 3, 10))
            .crawl(&fetcher(), &start, &tokens)
            .await;

        assert_eq!(outcome.pages_visited, 3);
    }
}
