//! Anchor pass: `<a href>` elements.

use scraper::Selector;
use std::sync::LazyLock;

use pcfharvest_shared::{CandidateLink, Provenance, is_pdf_url};

use super::{ExtractStrategy, PageContext, StrategyHits, label_matches, resolve};

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

/// Finds hyperlinks whose resolved URL ends in `.pdf` or whose label contains
/// a document keyword.
pub struct AnchorStrategy;

impl ExtractStrategy for AnchorStrategy {
    fn name(&self) -> &'static str {
        "anchor"
    }

    fn provenance(&self) -> Provenance {
        Provenance::AnchorTag
    }

    fn extract(&self, page: &PageContext<'_>) -> StrategyHits {
        let mut hits = StrategyHits::default();

        for el in page.doc.select(&ANCHOR_SEL) {
            let href = el.value().attr("href").unwrap_or_default();
            let (resolved, warned) = resolve(page.url, href);
            if warned {
                hits.warnings += 1;
            }
            let Some(url) = resolved else { continue };

            let text = el.text().collect::<String>().trim().to_string();
            if is_pdf_url(&url) || label_matches(&text) {
                hits.links.push(CandidateLink {
                    url,
                    text,
                    source_attr: None,
                    provenance: self.provenance(),
                });
            }
        }

        hits
    }
}
