//! Static per-site profiles: URL templates and selector priority lists.
//!
//! Profiles are pure data, built once at startup and passed by reference.
//! Selector lists are ordered by reliability; the extractor walks them and
//! stops at the first hit.

use std::collections::HashMap;

use crate::error::TaskError;

/// Ordered candidate selectors per extractable field.
#[derive(Debug, Clone, Default)]
pub struct FieldSelectors {
    pub product_card: &'static [&'static str],
    pub title: &'static [&'static str],
    pub price_regular: &'static [&'static str],
    pub price_discount: &'static [&'static str],
    pub discount_percent: &'static [&'static str],
    pub article: &'static [&'static str],
    pub availability: &'static [&'static str],
    pub image: &'static [&'static str],
    pub link: &'static [&'static str],
    pub characteristics: &'static [&'static str],
    /// Characteristic blocks on a full product page (richer than cards).
    pub detail_characteristics: &'static [&'static str],
    pub description: &'static [&'static str],
}

/// Immutable descriptor for one storefront.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub id: &'static str,
    pub base_url: &'static str,
    /// Primary search URL, `{}` replaced with the url-encoded code.
    pub search_url: &'static str,
    pub alt_search_urls: &'static [&'static str],
    /// Direct product page URL variants, most likely first.
    pub direct_urls: &'static [&'static str],
    pub selectors: FieldSelectors,
    /// Referer/Origin the site expects from organic traffic.
    pub referer: Option<&'static str>,
}

impl SiteProfile {
    fn expand(template: &str, code: &str) -> String {
        template.replace("{}", &urlencoding::encode(code))
    }

    /// Direct product page URLs for a code, in priority order.
    pub fn direct_product_urls(&self, code: &str) -> Vec<String> {
        self.direct_urls
            .iter()
            .map(|t| Self::expand(t, code))
            .collect()
    }

    /// Primary search URL for a code.
    pub fn search_page_url(&self, code: &str) -> String {
        Self::expand(self.search_url, code)
    }

    /// Alternate search URLs for a code, in priority order.
    pub fn alt_search_page_urls(&self, code: &str) -> Vec<String> {
        self.alt_search_urls
            .iter()
            .map(|t| Self::expand(t, code))
            .collect()
    }

    /// Selectors whose presence means the page finished rendering.
    ///
    /// Used by the browser fetcher as DOM-readiness probes: any one of
    /// title, discounted price, or card selectors appearing is enough.
    pub fn ready_selectors(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.selectors
            .title
            .iter()
            .chain(self.selectors.price_discount.iter())
            .chain(self.selectors.product_card.iter())
            .copied()
    }
}

/// Read-only lookup of all known site profiles.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    profiles: HashMap<&'static str, SiteProfile>,
}

impl SiteRegistry {
    /// Registry with the built-in storefront profiles.
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();
        for profile in [rozetka(), allo(), comfy(), epicentr()] {
            profiles.insert(profile.id, profile);
        }
        Self { profiles }
    }

    /// Look up a profile, failing for unregistered site ids.
    pub fn profile(&self, site_id: &str) -> Result<&SiteProfile, TaskError> {
        let key = site_id.trim().to_lowercase();
        self.profiles
            .get(key.as_str())
            .ok_or_else(|| TaskError::UnknownSite(site_id.to_string()))
    }

    /// All registered site ids, sorted for stable display.
    pub fn site_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.profiles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn rozetka() -> SiteProfile {
    SiteProfile {
        id: "rozetka",
        base_url: "https://rozetka.com.ua",
        search_url: "https://rozetka.com.ua/ua/search/?text={}",
        alt_search_urls: &[
            "https://rozetka.com.ua/search/?text={}",
            "https://rozetka.com.ua/ua/catalog/search/?query={}",
        ],
        direct_urls: &[
            "https://rozetka.com.ua/ua/p{}/",
            "https://rozetka.com.ua/p{}/",
            "https://rozetka.com.ua/ua/product/{}/",
            "https://rozetka.com.ua/goods/{}/",
        ],
        selectors: FieldSelectors {
            product_card: &[
                "li.catalog-grid__cell",
                "rz-catalog-tile",
                "app-goods-tile-default",
                "div.goods-tile",
                "div[data-goods-id]",
                "li[class*=\"catalog-grid__cell\"]",
                "div[class*=\"goods-tile\"]",
            ],
            title: &[
                "span.goods-tile__title",
                "a.goods-tile__heading span.goods-tile__title",
                ".goods-tile__title",
                "rz-indexed-link span.goods-tile__title",
                ".goods-tile__heading",
                "a[class*=\"goods-tile__heading\"]",
            ],
            price_regular: &[
                ".goods-tile__price--old",
                ".price--gray",
                "div.goods-tile__price--old.price--gray",
            ],
            price_discount: &[
                "span.goods-tile__price-value",
                ".goods-tile__price-value",
                "div.goods-tile__price span.goods-tile__price-value",
                ".goods-tile__price .goods-tile__price-value",
            ],
            discount_percent: &[
                ".goods-tile__label.promo-label",
                "span.goods-tile__label.promo-label",
            ],
            article: &[".g-id", "div.g-id", "[data-goods-id]"],
            availability: &[
                ".goods-tile__availability",
                ".goods-tile__availability--available",
                ".goods-tile__availability--unavailable",
            ],
            image: &[
                "div.goods-tile__picture img",
                ".goods-tile__picture img",
                "rz-button-product-page img",
            ],
            link: &[
                "a[href*=\"/p\"]",
                "rz-indexed-link a[href*=\"/p\"]",
                ".product-link[href*=\"/p\"]",
                "a.goods-tile__heading[href*=\"/p\"]",
            ],
            characteristics: &[
                ".product-about__brief",
                ".characteristics-table",
                ".product-specs",
            ],
            detail_characteristics: &[
                ".characteristics-full",
                ".product-about",
                ".characteristics-table",
                ".specs-table",
            ],
            description: &[".product-about__brief", ".product-description"],
        },
        referer: Some("https://rozetka.com.ua/"),
    }
}

fn allo() -> SiteProfile {
    SiteProfile {
        id: "allo",
        base_url: "https://allo.ua",
        search_url: "https://allo.ua/ua/catalogsearch/result/?q={}",
        alt_search_urls: &[
            "https://allo.ua/catalogsearch/result/?q={}",
            "https://allo.ua/ua/search/?q={}",
            "https://allo.ua/search/?query={}",
        ],
        direct_urls: &[
            "https://allo.ua/ua/p{}/",
            "https://allo.ua/p{}/",
            "https://allo.ua/ua/product/{}/",
        ],
        selectors: FieldSelectors {
            product_card: &["div.product-card", ".product-card"],
            title: &["a.product-card__title", ".product-card__title"],
            price_regular: &["div.v-pb__old span.sum", ".v-pb__old .sum"],
            price_discount: &[
                "div.v-pb__cur span.sum",
                "div.v-pb__cur.discount span.sum",
                ".v-pb__cur .sum",
            ],
            discount_percent: &[],
            article: &[".product-sku__value", "span.product-sku__value"],
            availability: &[".product-card__availability", ".availability"],
            image: &[
                "div.product-card__pictures img",
                ".product-card__img img",
                ".image-carousel img",
                "picture img",
            ],
            link: &["a.product-card__title[href]", ".product-card__title[href]"],
            characteristics: &[".product-card__detail", "div.product-card__detail dl"],
            detail_characteristics: &[
                ".product-characteristics",
                ".specifications",
                ".product-details",
                ".char-list",
            ],
            description: &[".product-description", ".product-info"],
        },
        referer: Some("https://allo.ua/"),
    }
}

fn comfy() -> SiteProfile {
    SiteProfile {
        id: "comfy",
        base_url: "https://comfy.ua",
        search_url: "https://comfy.ua/ua/search/?q={}",
        alt_search_urls: &[
            "https://comfy.ua/search/?q={}",
            "https://comfy.ua/ua/catalog/search/?query={}",
        ],
        direct_urls: &[
            "https://comfy.ua/ua/product/{}/",
            "https://comfy.ua/product/{}/",
            "https://comfy.ua/ua/p{}/",
        ],
        selectors: FieldSelectors {
            product_card: &[".prdl-item", "div[class*=\"prdl-item\"]"],
            title: &[".prdl-item__name", "a.prdl-item__name"],
            price_regular: &[],
            price_discount: &[
                ".prdl-item__price-current",
                ".prdl-item__price .prdl-item__price-current",
            ],
            discount_percent: &[],
            article: &[".prdl-item__code", "a.prdl-item__code"],
            availability: &[],
            image: &[".nci-sl__slide img", ".prdl-item__media img"],
            link: &["a.prdl-item__name[href]", ".prdl-item__name[href]"],
            characteristics: &[],
            detail_characteristics: &[
                ".product-specifications",
                ".characteristics",
                ".specs-list",
            ],
            description: &[".product-description"],
        },
        referer: Some("https://comfy.ua/"),
    }
}

fn epicentr() -> SiteProfile {
    SiteProfile {
        id: "epicentr",
        base_url: "https://epicentrk.ua",
        search_url: "https://epicentrk.ua/ua/search/?q={}",
        alt_search_urls: &[
            "https://epicentrk.ua/search/?q={}",
            "https://epicentrk.ua/ua/catalog/search/?query={}",
        ],
        direct_urls: &[
            "https://epicentrk.ua/ua/shop/p{}/",
            "https://epicentrk.ua/shop/p{}/",
            "https://epicentrk.ua/ua/product/{}/",
        ],
        selectors: FieldSelectors {
            product_card: &[
                ".card-product",
                "div[class*=\"product-card\"]",
                "div[class*=\"catalog-item\"]",
            ],
            title: &[".card-product__title a", ".product-card__title a"],
            price_regular: &[".card-product__price-old", ".price-old"],
            price_discount: &[".card-product__price-current", ".price-current"],
            discount_percent: &[],
            article: &[],
            availability: &[],
            image: &[".card-product__image img", ".product-card__image img"],
            link: &[".card-product__title a", "a[href*=\"/shop/\"]"],
            characteristics: &[],
            detail_characteristics: &[
                ".product-characteristics",
                ".specifications",
                ".char-table",
            ],
            description: &[".product-description"],
        },
        referer: Some("https://epicentrk.ua/"),
    }
}
