//! Vendor article (SKU) extraction.
//!
//! Resolution order inside a card: explicit data attributes, then the
//! site's article selectors, then numeric ids buried in the product link.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

/// Attributes sites use to tag cards with their internal product id.
const ID_ATTRIBUTES: &[&str] = &[
    "data-goods-id",
    "data-product-id",
    "data-item-id",
    "data-sku",
];

/// Numeric id patterns hiding in product URLs, most specific first.
static HREF_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/p(\d+)/",
        r"/(\d{8,})/",
        r"product[/-](\d+)",
        r"id[=:](\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Pull an article from a product card, trying the cheap signals first.
pub fn extract_article(
    card: &ElementRef<'_>,
    article_selectors: &[&str],
    link: Option<&str>,
) -> Option<String> {
    // Data attributes on the card itself or a tagged descendant
    for attr in ID_ATTRIBUTES {
        if let Some(value) = card.value().attr(attr) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
        let Ok(selector) = Selector::parse(&format!("[{attr}]")) else {
            continue;
        };
        if let Some(tagged) = card.select(&selector).next() {
            if let Some(value) = tagged.value().attr(attr) {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    // Site-specific article elements; short digit runs are noise
    for raw in article_selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in card.select(&selector) {
            let text: String = element.text().collect::<String>();
            let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() >= 6 {
                return Some(digits);
            }
        }
    }

    link.and_then(article_from_url)
}

/// Pull a numeric id out of a product URL.
///
/// Short digit runs are path noise (pagination, variant counters), not
/// articles; a capture under six digits is skipped and later patterns
/// still get their chance.
pub fn article_from_url(url: &str) -> Option<String> {
    for pattern in HREF_ID_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(url) {
            let digits = &captures[1];
            if digits.len() >= 6 {
                return Some(digits.to_string());
            }
        }
    }
    None
}
