//! Product-type token expansion.
//!
//! Brands rarely name documents after the canonical category: a "laptop" PCF
//! is usually filed under the model family ("MacBook", "Chromebook", ...).
//! [`ProductTokenSet::expand`] turns a product-type string into the set of
//! surface forms the crawler and section finder match against.

/// Table-driven family expansion: (trigger substrings, surface forms, word
/// suffixes that also count as a match).
type Family = (&'static [&'static str], &'static [&'static str], &'static [&'static str]);

const FAMILIES: &[Family] = &[
    (
        &["laptop", "notebook"],
        &[
            "laptop",
            "laptops",
            "notebook",
            "notebooks",
            "chromebook",
            "macbook",
            "ultrabook",
        ],
        &["book"],
    ),
    (
        &["desktop", "pc"],
        &["desktop", "desktops", "pc", "tower", "mini"],
        &[],
    ),
    (
        &["monitor", "display"],
        &["monitor", "monitors", "display", "displays"],
        &[],
    ),
    (&["server"], &["server", "servers"], &[]),
];

// ---------------------------------------------------------------------------
// ProductTokenSet
// ---------------------------------------------------------------------------

/// An ordered, deduplicated set of lower-cased surface forms for one product
/// type, plus the family suffixes that also count as a match.
///
/// Expansion is pure and deterministic, always contains the normalized input,
/// and never fails: unknown product types degrade to a singleton set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTokenSet {
    canonical: String,
    tokens: Vec<String>,
    suffixes: Vec<&'static str>,
}

impl ProductTokenSet {
    /// Expand a product-type string into its token set.
    pub fn expand(product_type: &str) -> Self {
        let canonical = product_type.trim().to_ascii_lowercase();

        let mut tokens: Vec<String> = Vec::new();
        let mut suffixes: Vec<&'static str> = Vec::new();

        if !canonical.is_empty() {
            tokens.push(canonical.clone());
        }

        for (triggers, forms, family_suffixes) in FAMILIES {
            if triggers.iter().any(|t| canonical.contains(t)) {
                for form in *forms {
                    if !tokens.iter().any(|t| t == form) {
                        tokens.push((*form).to_string());
                    }
                }
                suffixes.extend_from_slice(family_suffixes);
                break;
            }
        }

        Self {
            canonical,
            tokens,
            suffixes,
        }
    }

    /// The normalized input the set was expanded from.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// All surface forms, in expansion order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Case-insensitive relevance test: does `text` contain any token, or any
    /// word ending in a family suffix?
    pub fn matches(&self, text: &str) -> bool {
        self.matched_token(text).is_some()
    }

    /// Which token (or suffix) hit, for diagnostics. Tokens are checked in
    /// expansion order before suffixes.
    pub fn matched_token(&self, text: &str) -> Option<&str> {
        if self.tokens.is_empty() {
            return None;
        }
        let haystack = text.to_ascii_lowercase();

        if let Some(tok) = self.tokens.iter().find(|t| haystack.contains(t.as_str())) {
            return Some(tok);
        }

        // Suffix rule: "zenbook-14.pdf" matches the laptop family via "book"
        // even though "zenbook" is not in the table.
        for suffix in &self.suffixes {
            let hit = haystack
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| word.len() > suffix.len() && word.ends_with(suffix));
            if hit {
                return Some(suffix);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laptop_family_expands() {
        let set = ProductTokenSet::expand("Laptops");
        assert_eq!(set.canonical(), "laptops");
        // Canonical input always present, family forms follow.
        assert_eq!(set.tokens()[0], "laptops");
        assert!(set.tokens().iter().any(|t| t == "notebook"));
        assert!(set.tokens().iter().any(|t| t == "chromebook"));
    }

    #[test]
    fn expansion_is_deterministic_and_idempotent() {
        let a = ProductTokenSet::expand("laptop");
        let b = ProductTokenSet::expand("laptop");
        assert_eq!(a, b);

        // Expanding the already-normalized canonical changes nothing.
        let c = ProductTokenSet::expand(a.canonical());
        assert_eq!(a.tokens(), c.tokens());
    }

    #[test]
    fn unknown_type_degrades_to_singleton() {
        let set = ProductTokenSet::expand("  Espresso Machine ");
        assert_eq!(set.canonical(), "espresso machine");
        assert_eq!(set.tokens(), ["espresso machine"]);
        assert!(set.matches("best espresso machine ever"));
        assert!(!set.matches("laptop"));
    }

    #[test]
    fn suffix_rule_matches_unlisted_book_variants() {
        let set = ProductTokenSet::expand("laptop");
        assert!(set.matches("ZenBook 14 OLED carbon footprint"));
        assert!(set.matches("/pcf/vivobook-s15.pdf"));
        // Bare "book" words do not trigger the suffix rule.
        assert!(!set.matches("our brand book"));
    }

    #[test]
    fn non_matching_text_rejected() {
        let set = ProductTokenSet::expand("laptop");
        assert!(!set.matches("phone-report.pdf"));
        assert!(!set.matches("smartphone sustainability facts"));
    }

    #[test]
    fn desktop_family_does_not_get_book_suffix() {
        let set = ProductTokenSet::expand("desktop");
        assert!(set.matches("OptiPlex tower pcf"));
        assert!(!set.matches("macbook"));
    }

    #[test]
    fn matched_token_reports_hit() {
        let set = ProductTokenSet::expand("laptop");
        assert_eq!(set.matched_token("macbook-air-13.pdf"), Some("macbook"));
        assert_eq!(set.matched_token("zenbook-14.pdf"), Some("book"));
        assert_eq!(set.matched_token("phone.pdf"), None);
    }

    #[test]
    fn empty_input_matches_nothing() {
        let set = ProductTokenSet::expand("   ");
        assert_eq!(set.canonical(), "");
        assert!(set.tokens().is_empty());
        assert!(!set.matches("laptop"));
    }
}
