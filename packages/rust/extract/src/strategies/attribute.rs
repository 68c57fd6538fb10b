//! Attribute pass: non-standard `data-*` attributes used to lazy-load or
//! script-inject document links.

use scraper::Selector;
use std::sync::LazyLock;

use pcfharvest_shared::{CandidateLink, Provenance, is_pdf_url};

use super::{ExtractStrategy, PageContext, StrategyHits, resolve};

/// Fixed attribute list, in the order they are checked per element.
const DOCUMENT_ATTRS: &[&str] = &[
    "data-href",
    "data-src",
    "data-url",
    "data-download",
    "data-asset-url",
    "data-file",
];

static ATTR_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "[data-href], [data-src], [data-url], [data-download], [data-asset-url], [data-file]",
    )
    .expect("attribute selector")
});

/// Finds PDF URLs carried in `data-*` attributes instead of `href`.
pub struct AttributeStrategy;

impl ExtractStrategy for AttributeStrategy {
    fn name(&self) -> &'static str {
        "attribute"
    }

    fn provenance(&self) -> Provenance {
        Provenance::DataAttribute
    }

    fn extract(&self, page: &PageContext<'_>) -> StrategyHits {
        let mut hits = StrategyHits::default();

        for el in page.doc.select(&ATTR_SEL) {
            for attr in DOCUMENT_ATTRS {
                let Some(value) = el.value().attr(attr) else {
                    continue;
                };
                if !value.to_ascii_lowercase().contains(".pdf") {
                    continue;
                }

                let (resolved, warned) = resolve(page.url, value);
                if warned {
                    hits.warnings += 1;
                }
                let Some(url) = resolved else { continue };
                if !is_pdf_url(&url) {
                    continue;
                }

                let text = el.text().collect::<String>().trim().to_string();
                hits.links.push(CandidateLink {
                    url,
                    text,
                    source_attr: Some((*attr).to_string()),
                    provenance: self.provenance(),
                });
            }
        }

        hits
    }
}
