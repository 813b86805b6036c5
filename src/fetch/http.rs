//! Plain-HTTP fetcher with a browser-impersonating fingerprint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::error::FetchError;
use crate::models::ScrapeMethod;
use crate::sites::SiteProfile;

use super::{find_block_indicator, user_agent::random_user_agent, FetchedPage, Fetcher};

/// Cheap pooled-connection fetcher, the first thing tried for every URL.
///
/// Carries cookies across requests to a site (consent banners, session
/// tokens) and sends the full header set a real Chrome navigation would.
pub struct FastFetcher {
    client: reqwest::Client,
}

impl FastFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    fn request_headers(profile: &SiteProfile) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            "Accept-Language",
            HeaderValue::from_static("uk-UA,uk;q=0.9,ru;q=0.8,en-US;q=0.7,en;q=0.6"),
        );
        headers.insert(
            "sec-ch-ua",
            HeaderValue::from_static(
                "\"Not/A)Brand\";v=\"8\", \"Chromium\";v=\"126\", \"Google Chrome\";v=\"126\"",
            ),
        );
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"Windows\""));
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("same-origin"));
        headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
        headers.insert("DNT", HeaderValue::from_static("1"));
        if let Some(referer) = profile.referer {
            if let Ok(value) = HeaderValue::from_str(referer) {
                headers.insert("Referer", value.clone());
                headers.insert(
                    "Origin",
                    HeaderValue::from_str(referer.trim_end_matches('/'))
                        .unwrap_or(value),
                );
            }
        }
        headers
    }
}

#[async_trait]
impl Fetcher for FastFetcher {
    async fn fetch(&self, url: &str, profile: &SiteProfile) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(Self::request_headers(profile))
            .header("User-Agent", random_user_agent())
            .send()
            .await?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "http fetch");
        match status.as_u16() {
            403 => return Err(FetchError::Forbidden),
            429 => return Err(FetchError::RateLimited),
            code if !status.is_success() => return Err(FetchError::Status(code)),
            _ => {}
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        if let Some(indicator) = find_block_indicator(&html) {
            return Err(FetchError::Blocked {
                indicator: indicator.to_string(),
            });
        }

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }

    fn method(&self) -> ScrapeMethod {
        ScrapeMethod::Fast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::SiteRegistry;

    #[test]
    fn header_set_impersonates_a_browser() {
        let registry = SiteRegistry::builtin();
        let profile = registry.profile("rozetka").unwrap();
        let headers = FastFetcher::request_headers(profile);

        assert!(headers.contains_key("Accept"));
        assert!(headers
            .get("Accept-Language")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("uk-UA"));
        assert!(headers.contains_key("Sec-Fetch-Mode"));
        assert_eq!(
            headers.get("Referer").unwrap(),
            &HeaderValue::from_static("https://rozetka.com.ua/")
        );
        assert_eq!(
            headers.get("Origin").unwrap(),
            &HeaderValue::from_static("https://rozetka.com.ua")
        );
    }

    #[test]
    fn constructs_with_default_timeout() {
        assert!(FastFetcher::new(Duration::from_secs(30)).is_ok());
    }
}
