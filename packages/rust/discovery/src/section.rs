//! In-page section/tab finding on a hub page.
//!
//! Hub pages often group reports under category tabs with no stable URLs of
//! their own. This scans statically present tab markup (anchor fragments,
//! `aria-controls` / `data-bs-target` panel references, heading ids) for a
//! product-token match. Script-driven tabs are invisible here; that is the
//! accepted limit of static parsing.

use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use pcfharvest_shared::ProductTokenSet;

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

static HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2[id], h3[id], h4[id]").expect("heading selector"));

/// Locate the fragment/tab identifier for the requested product category.
///
/// Checked in order: same-page anchor links by label, `aria-controls` /
/// `data-bs-target` panels on matching tab links, then headings with `id`
/// attributes. Returns the fragment without its leading `#`.
pub fn find_section(html: &str, tokens: &ProductTokenSet) -> Option<String> {
    let doc = Html::parse_document(html);

    // A) Same-page tab anchors matched by label.
    for el in doc.select(&ANCHOR_SEL) {
        let label = el.text().collect::<String>();
        if !label_matches(&label, tokens) {
            continue;
        }
        let href = el.value().attr("href").unwrap_or_default().trim();
        if let Some(fragment) = href.strip_prefix('#') {
            if !fragment.is_empty() {
                debug!(fragment, "section tab found via anchor");
                return Some(fragment.to_string());
            }
        }
    }

    // B) aria-controls / data-bs-target panel references.
    for el in doc.select(&ANCHOR_SEL) {
        let label = el.text().collect::<String>();
        if !label_matches(&label, tokens) {
            continue;
        }
        let panel = el
            .value()
            .attr("aria-controls")
            .or_else(|| el.value().attr("data-bs-target"));
        if let Some(panel) = panel {
            let panel = panel.trim().trim_start_matches('#');
            if !panel.is_empty() {
                debug!(panel, "section tab found via panel reference");
                return Some(panel.to_string());
            }
        }
    }

    // C) Headings with ids.
    for el in doc.select(&HEADING_SEL) {
        let text = el.text().collect::<String>();
        if label_matches(&text, tokens) {
            if let Some(id) = el.value().attr("id") {
                debug!(id, "section found via heading id");
                return Some(id.to_string());
            }
        }
    }

    None
}

/// Tab labels are short ("Laptops", "Monitors"), so match by singular/plural
/// equality against the token set rather than loose containment.
fn label_matches(label: &str, tokens: &ProductTokenSet) -> bool {
    let label = norm(label);
    if label.is_empty() {
        return false;
    }
    tokens.tokens().iter().any(|t| norm(t) == label)
}

fn norm(s: &str) -> String {
    s.trim().to_ascii_lowercase().trim_end_matches('s').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop_tokens() -> ProductTokenSet {
        ProductTokenSet::expand("laptop")
    }

    #[test]
    fn tab_anchor_by_label() {
        let html = r##"<nav>
            <a href="#monitors">Monitors</a>
            <a href="#laptops">Laptops</a>
        </nav>"##;
        assert_eq!(
            find_section(html, &laptop_tokens()).as_deref(),
            Some("laptops")
        );
    }

    #[test]
    fn aria_controls_panel() {
        let html = r#"<a href="/pcfs" aria-controls="panel-notebooks">Notebooks</a>"#;
        assert_eq!(
            find_section(html, &laptop_tokens()).as_deref(),
            Some("panel-notebooks")
        );
    }

    #[test]
    fn bootstrap_target_panel() {
        let html = r##"<a href="/pcfs" data-bs-target="#tab-laptops">Laptops</a>"##;
        assert_eq!(
            find_section(html, &laptop_tokens()).as_deref(),
            Some("tab-laptops")
        );
    }

    #[test]
    fn heading_id_fallback() {
        let html = r#"<h2 id="sect-laptops">Laptops</h2><h2 id="sect-phones">Phones</h2>"#;
        assert_eq!(
            find_section(html, &laptop_tokens()).as_deref(),
            Some("sect-laptops")
        );
    }

    #[test]
    fn loose_containment_does_not_match_tabs() {
        // "Laptop accessories" is not the laptops tab.
        let html = r##"<a href="#acc">Laptop accessories</a>"##;
        assert!(find_section(html, &laptop_tokens()).is_none());
    }

    #[test]
    fn no_match_returns_none() {
        let html = r##"<a href="#phones">Phones</a><h2 id="x">Tablets</h2>"##;
        assert!(find_section(html, &laptop_tokens()).is_none());
    }
}
