//! Core domain types for PCF document discovery.

use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Which extraction strategy produced a candidate link.
///
/// Recorded on every [`CandidateLink`] so a discovery result can explain *why*
/// each URL was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Found in an `<a href>` element.
    AnchorTag,
    /// Found in a `data-*` attribute used for lazy-loaded documents.
    DataAttribute,
    /// Recovered from raw HTML text (inline script/JSON blobs).
    RegexSweep,
    /// Returned by the external search fallback.
    ExternalSearch,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AnchorTag => "anchor-tag",
            Self::DataAttribute => "data-attribute",
            Self::RegexSweep => "regex-sweep",
            Self::ExternalSearch => "external-search",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// CandidateLink
// ---------------------------------------------------------------------------

/// A URL that plausibly points to a PCF document, plus the context that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateLink {
    /// Fully resolved URL.
    pub url: Url,
    /// Anchor text or surrounding label (may be empty for regex-sweep hits).
    pub text: String,
    /// The attribute the URL came from, when not a plain `href`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_attr: Option<String>,
    /// Which strategy discovered this link.
    pub provenance: Provenance,
}

impl CandidateLink {
    /// Deduplication key: the normalized form of the URL.
    ///
    /// Two candidates with equal keys are the same document even if their raw
    /// URL strings differ (fragment, tracking parameters, host case).
    pub fn dedup_key(&self) -> String {
        normalize_url(&self.url)
    }
}

// ---------------------------------------------------------------------------
// DiscoveryResult
// ---------------------------------------------------------------------------

/// Observability counters accumulated across a discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryCounters {
    /// Pages fetched (or attempted) during the crawl, including the landing
    /// and hub pages.
    pub pages_visited: usize,
    /// Candidate links seen before relevance filtering.
    pub candidates_seen: usize,
    /// Candidate links accepted into the result set.
    pub candidates_accepted: usize,
    /// Malformed fragments skipped during extraction.
    pub parse_warnings: usize,
    /// Queries issued to the external search provider.
    pub search_queries: usize,
}

/// The artifact handed to the downstream downloader. Immutable once the
/// orchestrator returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// The landing URL the run started from.
    pub landing_url: Url,
    /// The hub page selected by link scoring, when one cleared the threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_url: Option<Url>,
    /// In-page section/tab fragment matched on the hub page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Accepted PDF candidates, in discovery order, with provenance.
    pub pdf_links: Vec<CandidateLink>,
    /// Run counters.
    pub counters: DiscoveryCounters,
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// Query parameters dropped during normalization. These vary per campaign,
/// not per document.
const TRACKING_PARAMS: &[&str] = &["gclid", "fbclid", "mc_cid", "mc_eid", "ref"];

/// Second-level public suffixes where the registrable domain spans three
/// labels (`example.co.uk`, not `co.uk`).
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.jp", "ne.jp",
    "or.jp", "com.cn", "com.br", "com.mx", "co.in", "co.kr", "com.tw", "com.sg", "com.hk",
];

/// Does this URL point at a PDF document, judging by the URL alone?
pub fn is_pdf_url(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}

/// Normalize a URL for deduplication: scheme + lowercased host + path, query
/// stripped of tracking parameters, fragment dropped.
pub fn normalize_url(url: &Url) -> String {
    let scheme = url.scheme();
    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    let port = url
        .port()
        .map(|p| format!(":{p}"))
        .unwrap_or_default();

    let mut path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    let kept: Vec<String> = url
        .query_pairs()
        .filter(|(k, _)| {
            let k = k.to_ascii_lowercase();
            !k.starts_with("utm_") && !TRACKING_PARAMS.contains(&k.as_str())
        })
        .map(|(k, v)| {
            if v.is_empty() {
                k.into_owned()
            } else {
                format!("{k}={v}")
            }
        })
        .collect();

    if kept.is_empty() {
        format!("{scheme}://{host}{port}{path}")
    } else {
        format!("{scheme}://{host}{port}{path}?{}", kept.join("&"))
    }
}

/// The registrable domain of a host: the unit used for same-domain
/// comparisons, ignoring subdomains.
///
/// Uses a fixed table of common second-level public suffixes rather than a
/// full public-suffix list; IP-address hosts are returned unchanged.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    if SECOND_LEVEL_SUFFIXES.contains(&last_two.as_str()) {
        labels[labels.len() - 3..].join(".")
    } else {
        last_two
    }
}

/// Do two URLs share a registrable domain? Subdomains of the same registrable
/// domain count as same-domain.
pub fn same_registrable_domain(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => registrable_domain(ha) == registrable_domain(hb),
        _ => false,
    }
}
