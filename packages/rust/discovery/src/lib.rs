//! Hub navigation: finding the page that lists a brand's PCF reports.
//!
//! Landing pages rarely list the reports themselves; they link to a hub
//! ("View all product carbon footprints") buried among navigation, news, and
//! careers links. [`find_hub`] scores every outbound same-domain link against
//! an explicit keyword rubric and follows the best one — or nothing, when no
//! link clears the threshold and the landing page itself must serve as the
//! hub. [`find_section`] separately locates the in-page tab or anchor for the
//! requested product category.

mod section;

use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

use pcfharvest_shared::{CandidateLink, Provenance, is_pdf_url, same_registrable_domain};

pub use section::find_section;

// ---------------------------------------------------------------------------
// Rubric tables
// ---------------------------------------------------------------------------

/// Link-text keywords and their weights.
const TEXT_RULES: &[(&str, i32)] = &[
    ("view report", 6),
    ("all pcf", 6),
    ("product footprint", 6),
    ("product carbon footprint", 6),
    ("carbon footprint", 5),
    ("environmental report", 5),
    ("view all", 4),
    ("pcf", 4),
    ("download", 3),
    ("epd", 3),
    ("sustainab", 3),
    ("environmental", 2),
];

/// URL-path keywords and their weights.
const PATH_RULES: &[(&str, i32)] = &[
    ("pcf", 4),
    ("carbon", 4),
    ("footprint", 4),
    ("report", 3),
    ("sustainab", 3),
    ("environment", 2),
];

/// Sections that never lead to the reports hub. A hit disqualifies the link
/// outright.
const EXCLUSIONS: &[&str] = &[
    "news",
    "careers",
    "investor",
    "press",
    "blog",
    "support",
    "drivers",
    "partners",
    "contact",
    "marketing",
    "solution",
];

/// Product-category words that hint the link leads to per-product documents.
const PRODUCT_HINTS: &[&str] = &["laptop", "desktop", "monitor", "server", "device", "book"];

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

// ---------------------------------------------------------------------------
// HubRubric
// ---------------------------------------------------------------------------

/// The tabulated scoring rule set. Weights are tunable parameters; the
/// defaults here are the tuned values, and the acceptance threshold is
/// exposed through configuration.
#[derive(Debug, Clone)]
pub struct HubRubric {
    /// Bonus when the link mentions a product category.
    pub product_hint_bonus: i32,
    /// Bonus for same-page tab links (`#fragment` hrefs).
    pub fragment_bonus: i32,
    /// Minimum score required to follow a link as the hub.
    pub min_score: i32,
}

impl Default for HubRubric {
    fn default() -> Self {
        Self {
            product_hint_bonus: 3,
            fragment_bonus: 1,
            min_score: 8,
        }
    }
}

impl HubRubric {
    /// Override the acceptance threshold (from `[hub] min_score`).
    pub fn with_min_score(mut self, min_score: i32) -> Self {
        self.min_score = min_score;
        self
    }
}

// ---------------------------------------------------------------------------
// ScoredLink
// ---------------------------------------------------------------------------

/// A candidate hub link with its rubric score and the keywords that fired.
#[derive(Debug, Clone)]
pub struct ScoredLink {
    /// The link itself.
    pub link: CandidateLink,
    /// Total rubric score.
    pub score: i32,
    /// Keywords that contributed to the score.
    pub matched: Vec<String>,
}

// ---------------------------------------------------------------------------
// find_hub
// ---------------------------------------------------------------------------

/// Score every outbound same-domain link on the landing page and return the
/// best one, or `None` when nothing clears the threshold (the caller then
/// treats the landing page itself as the hub).
///
/// Deterministic: ties are broken by shorter URL path, then document order.
pub fn find_hub(landing_url: &Url, html: &str, rubric: &HubRubric) -> Option<ScoredLink> {
    let doc = Html::parse_document(html);

    let mut best: Option<ScoredLink> = None;

    for el in doc.select(&ANCHOR_SEL) {
        let href = el.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() || href.starts_with("javascript:") || href.starts_with("mailto:") {
            continue;
        }

        let Ok(url) = landing_url.join(href) else {
            continue;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            continue;
        }
        if !same_registrable_domain(landing_url, &url) {
            continue;
        }
        // A PDF is a document, not a hub page.
        if is_pdf_url(&url) {
            continue;
        }

        let text = el.text().collect::<String>().trim().to_string();
        let Some((score, matched)) = score_link(&text, &url, href, rubric) else {
            continue;
        };

        debug!(%url, score, ?matched, "scored hub candidate");

        let better = match &best {
            None => score >= 1,
            Some(current) => {
                score > current.score
                    || (score == current.score
                        && url.path().len() < current.link.url.path().len())
            }
        };

        if better {
            best = Some(ScoredLink {
                link: CandidateLink {
                    url,
                    text,
                    source_attr: None,
                    provenance: Provenance::AnchorTag,
                },
                score,
                matched,
            });
        }
    }

    match best {
        Some(scored) if scored.score >= rubric.min_score => {
            info!(
                hub = %scored.link.url,
                score = scored.score,
                "following hub link"
            );
            Some(scored)
        }
        Some(scored) => {
            info!(
                best = %scored.link.url,
                score = scored.score,
                min_score = rubric.min_score,
                "no link cleared the hub threshold, staying on landing page"
            );
            None
        }
        None => {
            info!("no scorable links on landing page");
            None
        }
    }
}

/// Apply the rubric to one link. `None` means disqualified.
fn score_link(text: &str, url: &Url, href: &str, rubric: &HubRubric) -> Option<(i32, Vec<String>)> {
    let text_lc = text.to_ascii_lowercase();
    let path_lc = url.path().to_ascii_lowercase();
    let haystack = format!("{text_lc} {}", url.as_str().to_ascii_lowercase());

    if EXCLUSIONS.iter().any(|bad| haystack.contains(bad)) {
        return None;
    }

    let mut score = 0;
    let mut matched = Vec::new();

    for (keyword, weight) in TEXT_RULES {
        if text_lc.contains(keyword) {
            score += weight;
            matched.push((*keyword).to_string());
        }
    }
    for (keyword, weight) in PATH_RULES {
        if path_lc.contains(keyword) {
            score += weight;
            matched.push((*keyword).to_string());
        }
    }
    if PRODUCT_HINTS.iter().any(|hint| haystack.contains(hint)) {
        score += rubric.product_hint_bonus;
    }
    if href.contains('#') {
        score += rubric.fragment_bonus;
    }

    Some((score, matched))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landing() -> Url {
        Url::parse("https://example.com/sustainability").unwrap()
    }

    #[test]
    fn reports_link_beats_careers() {
        let html = r#"<html><body>
            <a href="/sustainability/reports">View all sustainability reports</a>
            <a href="/careers">Careers</a>
        </body></html>"#;

        let hub = find_hub(&landing(), html, &HubRubric::default()).expect("hub");
        assert_eq!(
            hub.link.url.as_str(),
            "https://example.com/sustainability/reports"
        );
        assert!(hub.score >= 8);
        assert!(hub.matched.iter().any(|m| m == "report"));
    }

    #[test]
    fn below_threshold_returns_none() {
        let html = r#"<html><body>
            <a href="/products">Our products</a>
            <a href="/about">About</a>
        </body></html>"#;

        assert!(find_hub(&landing(), html, &HubRubric::default()).is_none());
    }

    #[test]
    fn excluded_sections_disqualified_even_with_keywords() {
        // "report" appears, but the link lives under newsroom.
        let html = r#"<a href="/news/annual-report">Annual report</a>"#;
        assert!(find_hub(&landing(), html, &HubRubric::default()).is_none());
    }

    #[test]
    fn cross_domain_links_never_scored() {
        let html = r#"<a href="https://other.com/pcf/reports">View all PCF reports</a>"#;
        assert!(find_hub(&landing(), html, &HubRubric::default()).is_none());
    }

    #[test]
    fn subdomain_links_are_in_scope() {
        let html =
            r#"<a href="https://downloads.example.com/pcf/reports">View all PCF reports</a>"#;
        let hub = find_hub(&landing(), html, &HubRubric::default()).expect("hub");
        assert_eq!(hub.link.url.host_str(), Some("downloads.example.com"));
    }

    #[test]
    fn tie_broken_by_shorter_path() {
        // Identical text and path vocabulary; the shallower URL wins.
        let html = r#"<html><body>
            <a href="/pcf/archive/2023">Product carbon footprint</a>
            <a href="/pcf">Product carbon footprint</a>
        </body></html>"#;

        let hub = find_hub(&landing(), html, &HubRubric::default()).expect("hub");
        assert_eq!(hub.link.url.as_str(), "https://example.com/pcf");
    }

    #[test]
    fn deterministic_for_identical_html() {
        let html = r#"<html><body>
            <a href="/sustainability/reports">View all sustainability reports</a>
            <a href="/sustainability/pcf">All PCF documents</a>
        </body></html>"#;

        let a = find_hub(&landing(), html, &HubRubric::default()).expect("hub");
        let b = find_hub(&landing(), html, &HubRubric::default()).expect("hub");
        assert_eq!(a.link.url, b.link.url);
        assert_eq!(a.score, b.score);
    }

    #[test]
    fn threshold_is_tunable() {
        let html = r#"<a href="/sustainability">Sustainability</a>"#;
        let strict = HubRubric::default();
        assert!(find_hub(&landing(), html, &strict).is_none());

        let lax = HubRubric::default().with_min_score(2);
        assert!(find_hub(&landing(), html, &lax).is_some());
    }
}
