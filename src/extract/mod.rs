//! Selector-driven product extraction from storefront HTML.
//!
//! All of this is synchronous and infallible by design: a page either
//! yields products or it does not, and any missing field is simply None.
//! Parsed documents never cross an await point.

pub mod article;
pub mod characteristics;
pub mod price;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::fetch::find_block_indicator;
use crate::models::{Availability, Product};
use crate::sites::SiteProfile;

pub use article::{article_from_url, extract_article};
pub use characteristics::{extract_characteristics, free_text};
pub use price::{calculate_discount, parse_price};

/// Hryvnia amount somewhere in a text run.
static PRICE_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*(?:₴|грн|uah)").unwrap());

/// Full currency amount including separated thousands, for capture.
static CURRENCY_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d\s\u{a0}\u{202f}]*)(?:₴|грн|uah)").unwrap());

/// Titles that are really UI chrome, not product names.
///
/// Single-word labels are anchored to the whole string so product titles
/// that merely start with the same word (water filters, sorting trays)
/// survive; multi-word boilerplate keeps its known continuation.
static SERVICE_TITLES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^всі\s+результати",
        r"(?i)^все\s+результаты",
        r"(?i)^фільтр(?:и)?$",
        r"(?i)^фильтр(?:ы)?$",
        r"(?i)^сортування$",
        r"(?i)^сортировка$",
        r"(?i)^показати\s+ще$",
        r"(?i)^показать\s+ещё$",
        r"(?i)^каталог$",
        r"(?i)^порівняти$",
        r"(?i)^сравнить$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// URL path fragments that mark a link as pointing at a product page.
const PRODUCT_LINK_HINTS: &[&str] = &["/p", "/product", "/shop", "/goods"];

/// Phrases meaning the item can be bought right now.
const AVAILABLE_PHRASES: &[&str] = &[
    "в наявності",
    "є в наявності",
    "в наличии",
    "есть в наличии",
    "готовий до відправки",
    "готов к отправке",
    "in stock",
    "available",
];

/// Phrases meaning the item is gone.
const OUT_OF_STOCK_PHRASES: &[&str] = &[
    "немає в наявності",
    "нема в наявності",
    "нет в наличии",
    "закінчився",
    "закончился",
    "відсутній",
    "товар закінчився",
    "out of stock",
    "unavailable",
];

/// Attributes that may carry the real image URL on lazy-loading sites.
const IMAGE_ATTRIBUTES: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

static NEXT_PRODUCT_ID: AtomicU64 = AtomicU64::new(1);

fn next_product_id() -> u64 {
    NEXT_PRODUCT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Stateless extraction engine, parameterized only by relevance strictness.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    /// When set, products whose code match cannot be confirmed are dropped.
    strict_relevance: bool,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Extractor {
    pub fn new(strict_relevance: bool) -> Self {
        Self { strict_relevance }
    }

    /// Extract all identifiable products from a search results page.
    pub fn extract_products(
        &self,
        html: &str,
        profile: &SiteProfile,
        code: &str,
    ) -> Vec<Product> {
        let doc = Html::parse_document(html);
        let cards = self.find_candidate_cards(&doc, profile);
        debug!(site = profile.id, cards = cards.len(), "candidate cards");

        let mut products = Vec::new();
        for card in cards {
            if let Some(product) = self.extract_card(&card, profile, code) {
                if self.is_relevant(&product, code) {
                    products.push(product);
                }
            }
        }
        products
    }

    /// Extract one product from a direct product page.
    ///
    /// Returns None when the page does not look like a product page or no
    /// identifiable product can be assembled from it.
    pub fn extract_single(
        &self,
        html: &str,
        profile: &SiteProfile,
        code: &str,
        page_url: &str,
    ) -> Option<Product> {
        let doc = Html::parse_document(html);
        if !is_product_page_doc(&doc) {
            return None;
        }
        let root = doc.root_element();

        let title = extract_field(&root, profile.selectors.title, 5, 300)
            .or_else(|| extract_field(&root, &["h1"], 5, 300));
        let price = extract_field(&root, profile.selectors.price_discount, 1, 100)
            .and_then(|t| parse_price(&t))
            .or_else(|| fallback_price(&root));
        let old_price = extract_field(&root, profile.selectors.price_regular, 1, 100)
            .and_then(|t| parse_price(&t));
        let article = extract_article(&root, profile.selectors.article, Some(page_url))
            .or_else(|| article_from_url(page_url));

        let mut chars = crate::models::Characteristics::default();
        for raw in profile.selectors.detail_characteristics {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            for block in root.select(&selector) {
                chars.fill_missing_from(extract_characteristics(&block));
            }
        }
        if chars.is_empty() {
            chars = extract_characteristics(&root);
        }
        if let Some(description) = extract_field(&root, profile.selectors.description, 10, 2000) {
            chars.fill_missing_from(free_text(&description));
        }
        if let Some(title) = &title {
            chars.fill_missing_from(free_text(title));
        }

        let product = Product {
            id: next_product_id(),
            discount_percent: price
                .zip(old_price)
                .and_then(|(p, old)| calculate_discount(old, p)),
            availability: extract_availability(&root, profile.selectors.availability),
            article,
            title,
            price,
            old_price,
            url: Some(page_url.to_string()),
            image_url: extract_image(&root, profile.selectors.image, profile.base_url),
            characteristics: chars,
            site: profile.id.to_string(),
            search_code: code.to_string(),
        };

        (product.is_identified() && self.is_relevant(&product, code)).then_some(product)
    }

    /// Whether a product plausibly answers the searched code.
    ///
    /// The match is computed from URL, title and article; by default the
    /// result is advisory only and everything passes. Strict mode enforces
    /// it.
    pub fn is_relevant(&self, product: &Product, code: &str) -> bool {
        if !self.strict_relevance {
            return true;
        }
        let code = code.trim();
        product.url.as_deref().is_some_and(|u| u.contains(code))
            || product.title.as_deref().is_some_and(|t| t.contains(code))
            || product.article.as_deref() == Some(code)
    }

    /// Candidate product cards, site selectors first, universal fallback
    /// second.
    pub fn find_candidate_cards<'a>(
        &self,
        doc: &'a Html,
        profile: &SiteProfile,
    ) -> Vec<ElementRef<'a>> {
        for raw in profile.selectors.product_card {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            let valid: Vec<ElementRef<'a>> = doc
                .select(&selector)
                .filter(|card| is_valid_card(card))
                .collect();
            if !valid.is_empty() {
                return valid;
            }
        }
        universal_cards(doc)
    }

    fn extract_card(
        &self,
        card: &ElementRef<'_>,
        profile: &SiteProfile,
        code: &str,
    ) -> Option<Product> {
        let title = extract_title(card, profile.selectors.title);
        let url = extract_link(card, profile.selectors.link, profile.base_url);
        let price = extract_field(card, profile.selectors.price_discount, 1, 100)
            .and_then(|t| parse_price(&t))
            .or_else(|| fallback_price(card));
        let old_price = extract_field(card, profile.selectors.price_regular, 1, 100)
            .and_then(|t| parse_price(&t));
        let article = extract_article(card, profile.selectors.article, url.as_deref());

        let mut chars = crate::models::Characteristics::default();
        for raw in profile.selectors.characteristics {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            for block in card.select(&selector) {
                chars.fill_missing_from(extract_characteristics(&block));
            }
        }
        if chars.is_empty() {
            chars = extract_characteristics(card);
        }
        if let Some(title) = &title {
            chars.fill_missing_from(free_text(title));
        }

        // Promo labels ("-23%") cover tiles that hide the old price
        let discount_percent = price
            .zip(old_price)
            .and_then(|(p, old)| calculate_discount(old, p))
            .or_else(|| {
                extract_field(card, profile.selectors.discount_percent, 2, 20)
                    .and_then(|t| parse_discount_label(&t))
            });

        let product = Product {
            id: next_product_id(),
            discount_percent,
            availability: extract_availability(card, profile.selectors.availability),
            article,
            title,
            price,
            old_price,
            url,
            image_url: extract_image(card, profile.selectors.image, profile.base_url),
            characteristics: chars,
            site: profile.id.to_string(),
            search_code: code.to_string(),
        };

        product.is_identified().then_some(product)
    }
}

/// Whether a page looks like a single product page rather than a listing.
///
/// Cheap probe count: h1, a price amount, product-ish class names, and a
/// buy/cart control. Three of four is convincing.
pub fn is_product_page(html: &str) -> bool {
    is_product_page_doc(&Html::parse_document(html))
}

fn is_product_page_doc(doc: &Html) -> bool {
    let text: String = doc.root_element().text().collect::<Vec<_>>().join(" ");
    let lowered = text.to_lowercase();

    let probes = [
        has_match(doc, "h1"),
        PRICE_LIKE.is_match(&text),
        has_match(doc, "[class*=\"product\"], [itemtype*=\"Product\"]"),
        has_match(doc, "[class*=\"buy\"], [class*=\"cart\"], button[class*=\"basket\"]")
            || lowered.contains("купити")
            || lowered.contains("в кошик")
            || lowered.contains("в корзину")
            || lowered.contains("add to cart"),
    ];
    probes.iter().filter(|p| **p).count() >= 3
}

fn has_match(doc: &Html, raw: &str) -> bool {
    Selector::parse(raw)
        .map(|s| doc.select(&s).next().is_some())
        .unwrap_or(false)
}

/// Card validity heuristic.
///
/// A card must carry enough text, not be a challenge fragment, and show
/// at least two product signals (price-looking text, product link, image,
/// substantial text).
fn is_valid_card(card: &ElementRef<'_>) -> bool {
    let text: String = card.text().collect::<Vec<_>>().join(" ");
    let text = text.trim();
    if text.chars().count() < 15 || find_block_indicator(text).is_some() {
        return false;
    }

    let mut signals = 0;
    if PRICE_LIKE.is_match(text) {
        signals += 1;
    }
    if has_product_link(card) {
        signals += 1;
    }
    if has_match_in(card, "img") {
        signals += 1;
    }
    if text.chars().count() > 30 {
        signals += 1;
    }
    signals >= 2
}

/// First currency amount anywhere inside the element.
fn fallback_price(root: &ElementRef<'_>) -> Option<u64> {
    let text: String = root.text().collect::<Vec<_>>().join(" ");
    CURRENCY_AMOUNT
        .captures(&text)
        .and_then(|c| price::parse_price(&c[0]))
}

fn has_match_in(card: &ElementRef<'_>, raw: &str) -> bool {
    Selector::parse(raw)
        .map(|s| card.select(&s).next().is_some())
        .unwrap_or(false)
}

fn has_product_link(card: &ElementRef<'_>) -> bool {
    let anchor = Selector::parse("a[href]").unwrap();
    card.select(&anchor).any(|a| {
        a.value()
            .attr("href")
            .is_some_and(|href| PRODUCT_LINK_HINTS.iter().any(|hint| href.contains(hint)))
    })
}

/// Structure-agnostic card discovery for unknown layouts.
///
/// Starts from text nodes carrying a currency amount and walks up a few
/// ancestors looking for a container that also holds a product link and
/// substantial text. Capped at ten deduplicated containers.
fn universal_cards(doc: &Html) -> Vec<ElementRef<'_>> {
    const CONTAINER_TAGS: &[&str] = &["div", "article", "li", "section"];
    const MAX_CARDS: usize = 10;
    const MAX_ANCESTORS: usize = 5;

    let mut seen = std::collections::HashSet::new();
    let mut cards = Vec::new();

    for node in doc.tree.nodes() {
        if cards.len() >= MAX_CARDS {
            break;
        }
        let Node::Text(text) = node.value() else {
            continue;
        };
        if !PRICE_LIKE.is_match(text) {
            continue;
        }

        for ancestor in node.ancestors().take(MAX_ANCESTORS) {
            let Some(element) = ElementRef::wrap(ancestor) else {
                continue;
            };
            if !CONTAINER_TAGS.contains(&element.value().name()) {
                continue;
            }
            let body: String = element.text().collect::<Vec<_>>().join(" ");
            if body.trim().len() > 50 && has_product_link(&element) {
                if seen.insert(ancestor.id()) {
                    cards.push(element);
                }
                break;
            }
        }
    }
    cards
}

/// First non-empty, length-bounded text behind an ordered selector list.
///
/// Idempotent over its inputs; unparsable selectors are skipped.
pub fn extract_field(
    root: &ElementRef<'_>,
    selectors: &[&str],
    min_len: usize,
    max_len: usize,
) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in root.select(&selector) {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let text = normalize_whitespace(&text);
            let len = text.chars().count();
            if len >= min_len && len <= max_len {
                return Some(text);
            }
        }
    }
    None
}

fn extract_title(card: &ElementRef<'_>, title_selectors: &[&str]) -> Option<String> {
    if let Some(title) = extract_field(card, title_selectors, 5, 300) {
        if !is_service_title(&title) {
            return Some(title);
        }
    }

    // Product link anchors usually carry the name when selectors miss
    let anchor = Selector::parse("a[href]").unwrap();
    for a in card.select(&anchor) {
        let is_product = a
            .value()
            .attr("href")
            .is_some_and(|h| PRODUCT_LINK_HINTS.iter().any(|hint| h.contains(hint)));
        if !is_product {
            continue;
        }
        let text = normalize_whitespace(&a.text().collect::<Vec<_>>().join(" "));
        let len = text.chars().count();
        if (10..=300).contains(&len) && !is_service_title(&text) {
            return Some(text);
        }
    }

    extract_field(card, &["h1", "h2", "h3", "h4"], 10, 300)
        .filter(|t| !is_service_title(t))
}

/// Percent out of a promo label like "-23%" or "Знижка 15%".
fn parse_discount_label(text: &str) -> Option<u8> {
    if !text.contains('%') {
        return None;
    }
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    let percent: u8 = digits.parse().ok()?;
    (1..=99).contains(&percent).then_some(percent)
}

fn is_service_title(title: &str) -> bool {
    let trimmed = title.trim();
    SERVICE_TITLES.iter().any(|p| p.is_match(trimmed))
}

fn extract_link(
    card: &ElementRef<'_>,
    link_selectors: &[&str],
    base_url: &str,
) -> Option<String> {
    for raw in link_selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in card.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(resolved) = resolve_url(base_url, href) {
                    return Some(resolved);
                }
            }
        }
    }
    // Any product-style anchor as a last resort
    let anchor = Selector::parse("a[href]").unwrap();
    for a in card.select(&anchor) {
        if let Some(href) = a.value().attr("href") {
            if PRODUCT_LINK_HINTS.iter().any(|hint| href.contains(hint)) {
                return resolve_url(base_url, href);
            }
        }
    }
    None
}

fn extract_image(
    card: &ElementRef<'_>,
    image_selectors: &[&str],
    base_url: &str,
) -> Option<String> {
    let fallback = ["img"];
    let selector_sets: [&[&str]; 2] = [image_selectors, &fallback];
    for selectors in selector_sets {
        for raw in selectors {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            for element in card.select(&selector) {
                for attr in IMAGE_ATTRIBUTES {
                    if let Some(value) = element.value().attr(attr) {
                        if let Some(resolved) = accept_image_url(base_url, value) {
                            return Some(resolved);
                        }
                    }
                }
            }
        }
    }
    None
}

fn accept_image_url(base_url: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    let lowered = raw.to_lowercase();
    if lowered.contains("placeholder") || lowered.contains("no-photo") {
        return None;
    }
    let looks_like_image = [".jpg", ".jpeg", ".png", ".webp", ".gif"]
        .iter()
        .any(|ext| lowered.contains(ext))
        || ["/image", "/img", "/photo", "content.rozetka"]
            .iter()
            .any(|path| lowered.contains(path));
    if !looks_like_image {
        return None;
    }
    resolve_url(base_url, raw)
}

fn resolve_url(base_url: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    url::Url::parse(base_url)
        .ok()?
        .join(href)
        .ok()
        .map(|u| u.to_string())
}

fn extract_availability(card: &ElementRef<'_>, selectors: &[&str]) -> Availability {
    let text = extract_field(card, selectors, 1, 120)
        .map(|t| t.to_lowercase())
        .unwrap_or_default();
    if OUT_OF_STOCK_PHRASES.iter().any(|p| text.contains(p)) {
        Availability::OutOfStock
    } else if text.is_empty() || AVAILABLE_PHRASES.iter().any(|p| text.contains(p)) {
        // Listed cards without an availability label are sellable
        Availability::Available
    } else {
        Availability::Unknown
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use crate::sites::SiteRegistry;

    use super::*;

    const ROZETKA_CARD: &str = r#"
        <li class="catalog-grid__cell">
          <div class="goods-tile" data-goods-id="395024052">
            <a class="goods-tile__heading" href="/ua/p395024052/">
              <span class="goods-tile__title">Каструля Luminarc Ambiante 5 л скляна</span>
            </a>
            <div class="goods-tile__picture">
              <img src="https://content.rozetka.com.ua/goods/images/big/395024052.jpg">
            </div>
            <div class="goods-tile__price--old price--gray">1 299 ₴</div>
            <div class="goods-tile__price"><span class="goods-tile__price-value">999 ₴</span></div>
            <div class="goods-tile__availability">Є в наявності</div>
          </div>
        </li>"#;

    fn page(cards: &str) -> String {
        format!("<html><body><ul>{cards}</ul></body></html>")
    }

    #[test]
    fn extracts_full_card() {
        let registry = SiteRegistry::builtin();
        let profile = registry.profile("rozetka").unwrap();
        let extractor = Extractor::default();

        let products = extractor.extract_products(&page(ROZETKA_CARD), profile, "395024052");
        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(
            p.title.as_deref(),
            Some("Каструля Luminarc Ambiante 5 л скляна")
        );
        assert_eq!(p.price, Some(999));
        assert_eq!(p.old_price, Some(1_299));
        assert_eq!(p.discount_percent, Some(23));
        assert_eq!(p.article.as_deref(), Some("395024052"));
        assert_eq!(p.availability, Availability::Available);
        assert_eq!(
            p.url.as_deref(),
            Some("https://rozetka.com.ua/ua/p395024052/")
        );
        assert!(p
            .image_url
            .as_deref()
            .is_some_and(|u| u.ends_with("395024052.jpg")));
        assert_eq!(p.site, "rozetka");
        assert_eq!(p.search_code, "395024052");
        assert!(p.id > 0);
    }

    #[test]
    fn rejects_thin_and_blocked_cards() {
        let registry = SiteRegistry::builtin();
        let profile = registry.profile("rozetka").unwrap();
        let extractor = Extractor::default();

        let html = page(
            r#"<li class="catalog-grid__cell">реклама</li>
               <li class="catalog-grid__cell">Checking your browser before accessing rozetka</li>"#,
        );
        assert!(extractor.extract_products(&html, profile, "1").is_empty());
    }

    #[test]
    fn card_without_price_still_counts_with_link_and_image() {
        // Out-of-stock cards often drop the price; link + image + long
        // enough text must keep them in play.
        let html = Html::parse_fragment(
            r#"<div>
                <a href="/shop/p12345678/">Набір каструль Berlinger Haus Metallic Line 10 предметів</a>
                <img src="https://cdn.example.com/images/12345678.jpg">
            </div>"#,
        );
        let selector = Selector::parse("div").unwrap();
        let card = html.select(&selector).next().unwrap();
        assert!(is_valid_card(&card));
    }

    #[test]
    fn universal_fallback_finds_unknown_layouts() {
        let registry = SiteRegistry::builtin();
        let profile = registry.profile("rozetka").unwrap();
        let extractor = Extractor::default();

        // No known card classes at all
        let html = r#"<html><body>
            <div class="x-item">
              <a href="/shop/p12345678/">Сковорода Tefal Unlimited 28 см з антипригарним покриттям</a>
              <span>2 499 грн</span>
            </div>
        </body></html>"#;
        let products = extractor.extract_products(html, profile, "12345678");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, Some(2_499));
        assert_eq!(products[0].article.as_deref(), Some("12345678"));
    }

    #[test]
    fn universal_fallback_caps_and_dedupes() {
        let mut body = String::new();
        for i in 0..25 {
            body.push_str(&format!(
                r#"<div class="u{i}">
                     <a href="/product/{}">Товар номер {i} з достатньо довгою назвою</a>
                     <span>1 {i:03} грн</span><span>1 {i:03} грн</span>
                   </div>"#,
                10_000_000 + i
            ));
        }
        let html = format!("<html><body>{body}</body></html>");
        let doc = Html::parse_document(&html);
        assert_eq!(universal_cards(&doc).len(), 10);
    }

    #[test]
    fn extract_field_is_pure() {
        let html = Html::parse_fragment(r#"<div><span class="t">  Назва   товару  </span></div>"#);
        let root = html.root_element();
        let first = extract_field(&root, &[".missing", ".t"], 5, 300);
        let second = extract_field(&root, &[".missing", ".t"], 5, 300);
        assert_eq!(first.as_deref(), Some("Назва товару"));
        assert_eq!(first, second);
    }

    #[test]
    fn promo_labels_parse_as_percent() {
        assert_eq!(parse_discount_label("-23%"), Some(23));
        assert_eq!(parse_discount_label("Знижка 15%"), Some(15));
        assert_eq!(parse_discount_label("-0%"), None);
        assert_eq!(parse_discount_label("новинка"), None);
    }

    #[test]
    fn service_titles_are_skipped() {
        assert!(is_service_title("Всі результати пошуку"));
        assert!(is_service_title("Фільтр"));
        assert!(is_service_title("Фільтри"));
        assert!(is_service_title("Сортування"));
        assert!(is_service_title("Показати ще"));
        assert!(!is_service_title("Каструля 5 л"));
    }

    #[test]
    fn titles_starting_with_service_words_are_kept() {
        assert!(!is_service_title("Фільтр для води Brita Marella"));
        assert!(!is_service_title("Фильтр-кувшин Аквафор Орлеан"));
        assert!(!is_service_title("Сортування для білизни 3 секції"));
    }

    #[test]
    fn availability_phrases() {
        let html = Html::parse_fragment(
            r#"<div><span class="goods-tile__availability">Немає в наявності</span></div>"#,
        );
        let root = html.root_element();
        assert_eq!(
            extract_availability(&root, &[".goods-tile__availability"]),
            Availability::OutOfStock
        );

        let html = Html::parse_fragment(r#"<div><span class="a">Закінчується</span></div>"#);
        let root = html.root_element();
        assert_eq!(extract_availability(&root, &[".a"]), Availability::Unknown);

        let html = Html::parse_fragment("<div></div>");
        let root = html.root_element();
        assert_eq!(extract_availability(&root, &[".a"]), Availability::Available);
    }

    #[test]
    fn image_filtering() {
        assert!(accept_image_url("https://s/", "data:image/png;base64,AAA").is_none());
        assert!(accept_image_url("https://s/", "/img/placeholder.png").is_none());
        assert_eq!(
            accept_image_url("https://s/", "/photos/1.webp").as_deref(),
            Some("https://s/photos/1.webp")
        );
        assert_eq!(
            accept_image_url("https://s/", "https://cdn/pic.jpg").as_deref(),
            Some("https://cdn/pic.jpg")
        );
    }

    #[test]
    fn strict_relevance_enforces_code_match() {
        let mut product = Product {
            title: Some("Чайник".into()),
            ..Default::default()
        };
        let permissive = Extractor::new(false);
        let strict = Extractor::new(true);

        assert!(permissive.is_relevant(&product, "12345678"));
        assert!(!strict.is_relevant(&product, "12345678"));

        product.article = Some("12345678".into());
        assert!(strict.is_relevant(&product, "12345678"));
    }

    #[test]
    fn product_page_probe() {
        let product_page = r#"<html><body>
            <h1>Блендер Philips HR2621</h1>
            <div class="product-price">1 899 ₴</div>
            <button class="buy-button">Купити</button>
        </body></html>"#;
        assert!(is_product_page(product_page));

        let listing = r#"<html><body>
            <ul><li><a href="/p1/">Товар</a></li></ul>
        </body></html>"#;
        assert!(!is_product_page(listing));
    }

    #[test]
    fn extract_single_builds_identified_product() {
        let registry = SiteRegistry::builtin();
        let profile = registry.profile("rozetka").unwrap();
        let extractor = Extractor::default();

        let html = r#"<html><body class="product-page">
            <h1>Мультиварка Moulinex MK1001 з 12 програмами</h1>
            <div class="goods-tile__price"><span class="goods-tile__price-value">3 499 ₴</span></div>
            <button class="buy-button">Додати в кошик</button>
            <div class="characteristics-table">
              <table><tr><td>Бренд</td><td>Moulinex</td></tr></table>
            </div>
        </body></html>"#;
        let product = extractor
            .extract_single(html, profile, "87654321", "https://rozetka.com.ua/ua/p87654321/")
            .unwrap();
        assert_eq!(product.price, Some(3_499));
        assert_eq!(product.article.as_deref(), Some("87654321"));
        assert_eq!(product.characteristics.brand.as_deref(), Some("Moulinex"));
    }
}
