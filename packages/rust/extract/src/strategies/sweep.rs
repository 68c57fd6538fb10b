//! Regex sweep over raw HTML text.
//!
//! Recovers `.pdf` references embedded in inline script and JSON blobs that
//! never materialize as DOM attributes. Intentionally redundant with the DOM
//! passes — it is the safety net for script-rendered content.

use regex::Regex;
use std::sync::LazyLock;

use pcfharvest_shared::{CandidateLink, Provenance, is_pdf_url};

use super::{ExtractStrategy, PageContext, StrategyHits};

/// Quoted strings ending in `.pdf` (relative or absolute).
static QUOTED_PDF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["']([^"'<>\s]+?\.pdf(?:\?[^"'<>\s]*)?)["']"#).expect("quoted pdf regex")
});

/// Bare absolute URLs ending in `.pdf` (outside quotes).
static BARE_PDF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>]+\.pdf(?:\?[^\s"'<>]*)?"#).expect("bare pdf regex")
});

/// Scans the raw HTML for quoted and bare `.pdf` references.
pub struct SweepStrategy;

impl ExtractStrategy for SweepStrategy {
    fn name(&self) -> &'static str {
        "sweep"
    }

    fn provenance(&self) -> Provenance {
        Provenance::RegexSweep
    }

    fn extract(&self, page: &PageContext<'_>) -> StrategyHits {
        let mut hits = StrategyHits::default();

        let quoted = QUOTED_PDF_RE
            .captures_iter(page.raw)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str());
        let bare = BARE_PDF_RE.find_iter(page.raw).map(|m| m.as_str());

        for raw in quoted.chain(bare) {
            match page.url.join(raw) {
                Ok(mut url) => {
                    url.set_fragment(None);
                    if is_pdf_url(&url) {
                        hits.links.push(CandidateLink {
                            url,
                            text: String::new(),
                            source_attr: None,
                            provenance: self.provenance(),
                        });
                    }
                }
                Err(_) => hits.warnings += 1,
            }
        }

        hits
    }
}
