//! Core data types shared across the scraping pipeline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which retrieval strategy produced (or tried to produce) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeMethod {
    /// Plain HTTP with a browser-impersonating fingerprint.
    Fast,
    /// Real automated browser (Chromium over CDP).
    Browser,
}

impl ScrapeMethod {
    /// The other strategy, used when escalating.
    pub fn other(self) -> Self {
        match self {
            ScrapeMethod::Fast => ScrapeMethod::Browser,
            ScrapeMethod::Browser => ScrapeMethod::Fast,
        }
    }
}

impl std::fmt::Display for ScrapeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeMethod::Fast => write!(f, "fast"),
            ScrapeMethod::Browser => write!(f, "browser"),
        }
    }
}

/// Lifecycle state of a single scrape task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
    Stopped,
}

/// Stock state derived from availability labels on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    OutOfStock,
    #[default]
    Unknown,
}

/// Free-text product characteristics, one named slot per attribute.
///
/// The extractor fills these from structured markup first and free-text
/// patterns second; arbitrary keys from the page never leak through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<String>,
    /// Product type/category ("type" is reserved, hence the name).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl Characteristics {
    /// True if no attribute was extracted.
    pub fn is_empty(&self) -> bool {
        self.material.is_none()
            && self.brand.is_none()
            && self.collection.is_none()
            && self.color.is_none()
            && self.composition.is_none()
            && self.kind.is_none()
            && self.packaging.is_none()
            && self.quantity.is_none()
            && self.size.is_none()
    }

    /// Fill only the slots that are still empty from `other`.
    pub fn fill_missing_from(&mut self, other: Characteristics) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.material, other.material);
        fill(&mut self.brand, other.brand);
        fill(&mut self.collection, other.collection);
        fill(&mut self.color, other.color);
        fill(&mut self.composition, other.composition);
        fill(&mut self.kind, other.kind);
        fill(&mut self.packaging, other.packaging);
        fill(&mut self.quantity, other.quantity);
        fill(&mut self.size, other.size);
    }
}

/// One extracted product.
///
/// Prices are plain integer hryvnia: the observed storefronts have no
/// sub-unit pricing, so this is deliberately not a monetary-precision type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Synthesized sequence number (unique within one run).
    pub id: u64,
    /// Vendor article/SKU, when the page exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    /// Product title as shown on the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Current (possibly discounted) price, currency-stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    /// Regular price before discount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_price: Option<u64>,
    /// Derived discount percent, only when old_price > price > 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<u8>,
    pub availability: Availability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Characteristics::is_empty")]
    pub characteristics: Characteristics,
    /// Site id this product came from.
    pub site: String,
    /// Product code the search was started with.
    pub search_code: String,
}

impl Product {
    /// A product is only worth keeping if it can be identified somehow.
    pub fn is_identified(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
            || self.article.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// Outcome of one (product code, site) task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingResult {
    /// Product code the task was scheduled with.
    pub code: String,
    /// Site id the task was scheduled with.
    pub site: String,
    /// Extracted product, absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    pub status: ScrapeStatus,
    /// Human-readable message for the last failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Which fetcher produced the terminal outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_used: Option<ScrapeMethod>,
    /// Wall-clock time spent on the task.
    #[serde(with = "duration_secs")]
    pub response_time: Duration,
    /// Fetch strategies consumed: 0 (stopped early), 1, or 2.
    pub attempts: u32,
    /// When the task finished (or was rejected).
    pub scraped_at: DateTime<Utc>,
}

impl ScrapingResult {
    /// A result shell for a task that has not produced anything yet.
    pub fn pending(code: &str, site: &str) -> Self {
        Self {
            code: code.to_string(),
            site: site.to_string(),
            product: None,
            status: ScrapeStatus::Idle,
            error_message: None,
            method_used: None,
            response_time: Duration::ZERO,
            attempts: 0,
            scraped_at: Utc::now(),
        }
    }

    /// An error result for a task rejected before any fetch.
    pub fn rejected(code: &str, site: &str, message: String) -> Self {
        Self {
            status: ScrapeStatus::Error,
            error_message: Some(message),
            ..Self::pending(code, site)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ScrapeStatus::Success
    }
}

/// Serialize Duration as fractional seconds for export consumers.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

/// One unit of work for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTask {
    pub code: String,
    pub site: String,
}

impl ScrapeTask {
    pub fn new(code: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            site: site.into(),
        }
    }

    /// Product codes must be non-empty and digits-only.
    ///
    /// Invalid codes are rejected before scheduling and never reach a
    /// fetcher.
    pub fn validate_code(code: &str) -> bool {
        let trimmed = code.trim();
        !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
    }
}
