//! Per-page PDF link extraction for pcfharvest.
//!
//! Three independent strategies behind a common trait ([`ExtractStrategy`]):
//! DOM anchors, `data-*` attributes, and a raw-text regex sweep. The
//! [`Extractor`] runs all of them and unions the results, deduplicated by
//! normalized URL with first-provenance-wins. Extraction never fails on
//! malformed HTML; skipped fragments surface as a warning count.

pub mod strategies;

use std::collections::HashSet;

use scraper::Html;
use tracing::debug;
use url::Url;

use pcfharvest_shared::{CandidateLink, normalize_url};

pub use strategies::{
    AnchorStrategy, AttributeStrategy, ExtractStrategy, PageContext, StrategyHits, SweepStrategy,
};

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Union of all strategies over one page.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Deduplicated candidates, in discovery order.
    pub links: Vec<CandidateLink>,
    /// Malformed fragments skipped across all strategies.
    pub warnings: usize,
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Holds the registered strategies in pass order.
pub struct Extractor {
    strategies: Vec<Box<dyn ExtractStrategy>>,
}

impl Extractor {
    /// Create an extractor with the three built-in passes: anchors, then
    /// data-attributes, then the regex sweep.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(AnchorStrategy),
                Box::new(AttributeStrategy),
                Box::new(SweepStrategy),
            ],
        }
    }

    /// Extract every plausible PDF reference from one page.
    ///
    /// Relative URLs are resolved against `page_url`. When two strategies
    /// find the same document, the earlier pass's provenance is kept.
    pub fn extract(&self, page_url: &Url, html: &str) -> Extraction {
        let doc = Html::parse_document(html);
        let page = PageContext {
            url: page_url,
            doc: &doc,
            raw: html,
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Extraction::default();

        for strategy in &self.strategies {
            let hits = strategy.extract(&page);
            out.warnings += hits.warnings;

            let mut kept = 0usize;
            for link in hits.links {
                if seen.insert(normalize_url(&link.url)) {
                    out.links.push(link);
                    kept += 1;
                }
            }
            debug!(strategy = strategy.name(), kept, "extraction pass done");
        }

        out
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcfharvest_shared::Provenance;

    fn extract(html: &str) -> Extraction {
        let url = Url::parse("https://example.com/sustainability/reports").unwrap();
        Extractor::new().extract(&url, html)
    }

    #[test]
    fn three_passes_find_their_own_links() {
        let html = r#"<html><body>
            <a href="report.pdf">Laptop A PCF</a>
            <div data-href="/files/other.pdf">Laptop B</div>
            <script>var docs = {"pcf": "hidden.pdf"};</script>
        </body></html>"#;

        let result = extract(html);
        assert_eq!(result.links.len(), 3);

        let by_url: Vec<(&str, Provenance)> = result
            .links
            .iter()
            .map(|l| (l.url.as_str(), l.provenance))
            .collect();

        assert!(by_url.contains(&(
            "https://example.com/sustainability/report.pdf",
            Provenance::AnchorTag
        )));
        assert!(by_url.contains(&(
            "https://example.com/files/other.pdf",
            Provenance::DataAttribute
        )));
        assert!(by_url.contains(&(
            "https://example.com/sustainability/hidden.pdf",
            Provenance::RegexSweep
        )));
    }

    #[test]
    fn first_provenance_wins_on_duplicates() {
        // Same document linked in the DOM and repeated in inline JSON.
        let html = r#"<html><body>
            <a href="/pcf/laptop.pdf">Laptop PCF</a>
            <script>preload(["/pcf/laptop.pdf"]);</script>
        </body></html>"#;

        let result = extract(html);
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].provenance, Provenance::AnchorTag);
        assert_eq!(result.links[0].text, "Laptop PCF");
    }

    #[test]
    fn keyword_label_accepted_without_pdf_extension() {
        let html = r#"<a href="/download?id=42">Carbon footprint report</a>"#;
        let result = extract(html);
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].url.as_str(), "https://example.com/download?id=42");
    }

    #[test]
    fn plain_navigation_links_ignored() {
        let html = r##"<html><body>
            <a href="/about">About us</a>
            <a href="/careers">Careers</a>
            <a href="#main">Skip to content</a>
            <a href="mailto:info@example.com">Contact</a>
        </body></html>"##;
        let result = extract(html);
        assert!(result.links.is_empty());
        assert_eq!(result.warnings, 0);
    }

    #[test]
    fn sweep_finds_absolute_urls_in_json() {
        let html = r#"<script>
            window.__DATA__ = {"items":[{"file":"https://cdn.example.com/pcf/notebook-x.pdf?rev=3"}]};
        </script>"#;
        let result = extract(html);
        assert_eq!(result.links.len(), 1);
        assert_eq!(
            result.links[0].url.as_str(),
            "https://cdn.example.com/pcf/notebook-x.pdf?rev=3"
        );
        assert_eq!(result.links[0].provenance, Provenance::RegexSweep);
    }

    #[test]
    fn attribute_pass_records_source_attr() {
        let html = r#"<button data-download="/assets/Server-R750.PDF">Download</button>"#;
        let result = extract(html);
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].source_attr.as_deref(), Some("data-download"));
        assert_eq!(result.links[0].provenance, Provenance::DataAttribute);
    }

    #[test]
    fn malformed_href_counts_warning_not_error() {
        let html = r#"<a href="https://example.com:badport/x.pdf">broken</a>
                      <a href="/ok/report.pdf">fine</a>"#;
        let result = extract(html);
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].url.as_str(), "https://example.com/ok/report.pdf");
        assert!(result.warnings >= 1);
    }

    #[test]
    fn empty_page_yields_nothing() {
        let result = extract("");
        assert!(result.links.is_empty());
        assert_eq!(result.warnings, 0);
    }
}
