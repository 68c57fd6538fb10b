//! Extraction strategy trait and built-in strategies.
//!
//! Each strategy is one independent way of spotting a document link in a
//! page. The three built-ins are deliberately redundant: what an anchor pass
//! misses in script-rendered markup, the raw-text sweep recovers.

mod anchor;
mod attribute;
mod sweep;

use scraper::Html;
use url::Url;

use pcfharvest_shared::{CandidateLink, Provenance};

pub use anchor::AnchorStrategy;
pub use attribute::AttributeStrategy;
pub use sweep::SweepStrategy;

/// Anchor-label keywords that mark a link as a plausible report even when the
/// URL itself does not end in `.pdf`.
const LABEL_KEYWORDS: &[&str] = &["pdf", "report", "footprint"];

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One parsed page handed to every strategy.
pub struct PageContext<'a> {
    /// The page's URL; relative links resolve against it.
    pub url: &'a Url,
    /// Parsed DOM.
    pub doc: &'a Html,
    /// Raw HTML text, for strategies that bypass the DOM.
    pub raw: &'a str,
}

/// Links found by a single strategy, plus skipped-fragment count.
#[derive(Debug, Default)]
pub struct StrategyHits {
    /// Candidates in document order, already resolved to absolute URLs.
    pub links: Vec<CandidateLink>,
    /// Fragments that could not be resolved (malformed hrefs etc.).
    pub warnings: usize,
}

/// One independent link-detection pass over a page.
///
/// Strategies are run in fixed order by the extractor and unioned; when two
/// strategies find the same document, the earlier strategy's provenance wins.
pub trait ExtractStrategy: Send + Sync {
    /// Human-readable strategy name for tracing.
    fn name(&self) -> &'static str;

    /// Provenance tag stamped on every link this strategy finds.
    fn provenance(&self) -> Provenance;

    /// Scan the page. Never fails; malformed fragments are skipped and
    /// counted.
    fn extract(&self, page: &PageContext<'_>) -> StrategyHits;
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Does this label text mark the link as a plausible document?
pub(crate) fn label_matches(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    LABEL_KEYWORDS.iter().any(|k| text.contains(k))
}

/// Resolve an href against the page URL. `None` for empty, same-page, and
/// non-navigational hrefs; `Err`-shaped outcomes are reported as warnings by
/// the caller via the `bool`.
pub(crate) fn resolve(base: &Url, href: &str) -> (Option<Url>, bool) {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return (None, false);
    }

    match base.join(href) {
        Ok(mut resolved) => {
            resolved.set_fragment(None);
            (Some(resolved), false)
        }
        Err(_) => (None, true),
    }
}
