//! External-search fallback for pcfharvest.
//!
//! When the crawl under-delivers, a bounded set of structured queries
//! (site-restricted, filetype-restricted, keyword-augmented) is issued
//! against a search index and the incremental hits are merged into the
//! result set. The index is consumed through the [`SearchProvider`] trait;
//! [`ExaClient`] is the production implementation.

pub mod exa;

use std::collections::HashSet;

use tracing::{debug, info, warn};
use url::Url;

use pcfharvest_shared::{
    CandidateLink, ProductTokenSet, Provenance, Result, is_pdf_url, normalize_url,
    registrable_domain,
};

pub use exa::ExaClient;

/// Fixed PCF vocabulary appended to fallback queries, one variant per entry.
const PCF_VOCABULARY: &[&str] = &[
    "\"product carbon footprint\"",
    "\"life cycle assessment\"",
    "PCF",
    "EPD",
];

// ---------------------------------------------------------------------------
// SearchProvider
// ---------------------------------------------------------------------------

/// One result from the external index. Order is relevance-ranked, but only
/// set membership is relied upon.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Result URL, as returned by the index.
    pub url: String,
    /// Result title, when the index provides one.
    pub title: String,
}

/// The external search capability consumed by [`fallback_search`].
#[allow(async_fn_in_trait)]
pub trait SearchProvider {
    /// Issue one query and return ranked hits.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// What the fallback contributed.
#[derive(Debug, Default)]
pub struct FallbackOutcome {
    /// Incremental candidates not already in `already_found`.
    pub links: Vec<CandidateLink>,
    /// Queries actually issued.
    pub queries_issued: usize,
}

/// Build the bounded query-variant list for one fallback invocation.
fn build_queries(brand_domain: &str, tokens: &ProductTokenSet, max_queries: usize) -> Vec<String> {
    let token_clause = if tokens.tokens().is_empty() {
        String::new()
    } else {
        let quoted: Vec<String> = tokens.tokens().iter().map(|t| format!("\"{t}\"")).collect();
        format!(" ({})", quoted.join(" OR "))
    };

    PCF_VOCABULARY
        .iter()
        .take(max_queries)
        .map(|kw| format!("site:{brand_domain} filetype:pdf{token_clause} {kw}"))
        .collect()
}

/// Query the index for additional PDF candidates when the crawl yield is
/// below target.
///
/// No-op (zero queries) when `already_found` already meets `target_count`.
/// Hits are filtered to PDF URLs on the brand's registrable domain and
/// deduplicated against `already_found`; only the incremental set is
/// returned, tagged with `external-search` provenance. Provider errors are
/// recovered locally and contribute nothing.
pub async fn fallback_search<P: SearchProvider>(
    provider: &P,
    brand_domain: &str,
    tokens: &ProductTokenSet,
    already_found: &[CandidateLink],
    target_count: usize,
    max_queries: usize,
) -> FallbackOutcome {
    let mut outcome = FallbackOutcome::default();

    if already_found.len() >= target_count {
        debug!(
            found = already_found.len(),
            target_count, "crawl met target, skipping search fallback"
        );
        return outcome;
    }

    let brand_domain = registrable_domain(brand_domain);
    let mut seen: HashSet<String> = already_found.iter().map(CandidateLink::dedup_key).collect();

    for query in build_queries(&brand_domain, tokens, max_queries) {
        info!(%query, "issuing fallback query");
        outcome.queries_issued += 1;

        let hits = match provider.search(&query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "search query failed, continuing");
                continue;
            }
        };

        for hit in hits {
            let Ok(url) = Url::parse(hit.url.trim()) else {
                continue;
            };
            if !is_pdf_url(&url) {
                continue;
            }
            let on_domain = url
                .host_str()
                .is_some_and(|h| registrable_domain(h) == brand_domain);
            if !on_domain {
                continue;
            }
            if !seen.insert(normalize_url(&url)) {
                continue;
            }

            let text = if hit.title.is_empty() {
                url.path_segments()
                    .and_then(|mut s| s.next_back())
                    .unwrap_or_default()
                    .to_string()
            } else {
                hit.title
            };

            outcome.links.push(CandidateLink {
                url,
                text,
                source_attr: None,
                provenance: Provenance::ExternalSearch,
            });
        }

        if already_found.len() + outcome.links.len() >= target_count {
            debug!("target reached, stopping fallback early");
            break;
        }
    }

    info!(
        added = outcome.links.len(),
        queries = outcome.queries_issued,
        "search fallback done"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider {
        hits: Vec<SearchHit>,
        calls: AtomicUsize,
    }

    impl StaticProvider {
        fn new(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SearchProvider for StaticProvider {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.clone())
        }
    }

    struct FailingProvider;

    impl SearchProvider for FailingProvider {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
            Err(pcfharvest_shared::HarvestError::Search("quota exceeded".into()))
        }
    }

    fn found(urls: &[&str]) -> Vec<CandidateLink> {
        urls.iter()
            .map(|u| CandidateLink {
                url: Url::parse(u).unwrap(),
                text: String::new(),
                source_attr: None,
                provenance: Provenance::AnchorTag,
            })
            .collect()
    }

    #[tokio::test]
    async fn zero_queries_when_target_met() {
        let provider = StaticProvider::new(vec![]);
        let tokens = ProductTokenSet::expand("laptop");
        let already = found(&[
            "https://example.com/a.pdf",
            "https://example.com/b.pdf",
        ]);

        let outcome = fallback_search(&provider, "example.com", &tokens, &already, 2, 4).await;

        assert_eq!(outcome.queries_issued, 0);
        assert!(outcome.links.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn incremental_hits_filtered_and_deduplicated() {
        let provider = StaticProvider::new(vec![
            // Already known (tracking params differ).
            SearchHit {
                url: "https://example.com/a.pdf?utm_source=search".into(),
                title: "Known".into(),
            },
            // New, on-domain PDF.
            SearchHit {
                url: "https://www.example.com/pcf/laptop-9.pdf".into(),
                title: "Laptop 9 PCF".into(),
            },
            // Off-domain PDF.
            SearchHit {
                url: "https://mirror.test/pcf/laptop-9.pdf".into(),
                title: "Mirror".into(),
            },
            // On-domain, not a PDF.
            SearchHit {
                url: "https://example.com/pcf/laptop-9".into(),
                title: "Landing".into(),
            },
        ]);
        let tokens = ProductTokenSet::expand("laptop");
        let already = found(&["https://example.com/a.pdf"]);

        let outcome = fallback_search(&provider, "example.com", &tokens, &already, 20, 4).await;

        assert_eq!(outcome.links.len(), 1);
        assert_eq!(
            outcome.links[0].url.as_str(),
            "https://www.example.com/pcf/laptop-9.pdf"
        );
        assert_eq!(outcome.links[0].provenance, Provenance::ExternalSearch);
        // Same hits every query; the dedup set keeps the result incremental.
        assert_eq!(outcome.queries_issued, 4);
    }

    #[tokio::test]
    async fn provider_errors_contribute_nothing() {
        let tokens = ProductTokenSet::expand("laptop");
        let outcome =
            fallback_search(&FailingProvider, "example.com", &tokens, &[], 20, 4).await;

        assert_eq!(outcome.queries_issued, 4);
        assert!(outcome.links.is_empty());
    }

    #[tokio::test]
    async fn queries_are_bounded_and_structured() {
        let queries = build_queries("example.com", &ProductTokenSet::expand("laptop"), 2);

        assert_eq!(queries.len(), 2);
        for q in &queries {
            assert!(q.starts_with("site:example.com filetype:pdf"));
            assert!(q.contains("\"laptop\""));
        }
        assert!(queries[0].contains("product carbon footprint"));
    }

    #[tokio::test]
    async fn stops_early_once_target_reached() {
        let provider = StaticProvider::new(vec![SearchHit {
            url: "https://example.com/pcf/laptop-1.pdf".into(),
            title: "Laptop 1".into(),
        }]);
        let tokens = ProductTokenSet::expand("laptop");

        let outcome = fallback_search(&provider, "example.com", &tokens, &[], 1, 4).await;

        assert_eq!(outcome.links.len(), 1);
        assert_eq!(outcome.queries_issued, 1);
    }
}
