//! Page retrieval: the `Fetcher` abstraction and its two implementations.

pub mod browser;
pub mod http;
pub mod stealth;
pub mod user_agent;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::ScrapeMethod;
use crate::sites::SiteProfile;

pub use browser::BrowserFetcher;
pub use http::FastFetcher;

/// Phrases that mark a page as an anti-bot challenge instead of content.
///
/// Matched case-insensitively against both HTTP bodies and rendered DOM.
pub const BLOCK_INDICATORS: &[&str] = &[
    "checking your browser",
    "captcha",
    "protection",
    "verify you are human",
    "blocked",
    "access denied",
    "pardon our interruption",
    "incapsula",
    "cloudflare",
    "bot detection",
    "challenge",
    "javascript is required",
];

/// First block indicator found in the text, if any.
pub fn find_block_indicator(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    BLOCK_INDICATORS
        .iter()
        .find(|phrase| lowered.contains(*phrase))
        .copied()
}

/// A successfully retrieved page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that actually produced the content (after redirects).
    pub url: String,
    /// Raw HTML (HTTP body or rendered DOM).
    pub html: String,
}

/// One way of turning a URL into HTML.
///
/// Implementations own their transport state (connection pool or browser
/// instance) and are driven by the orchestrator's URL strategy pipeline.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, profile: &SiteProfile) -> Result<FetchedPage, FetchError>;

    fn method(&self) -> ScrapeMethod;
}
