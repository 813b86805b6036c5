//! Per-task orchestration: fast attempt first, browser fallback second.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::models::{Product, ScrapeStatus, ScrapeTask, ScrapingResult};
use crate::sites::SiteProfile;

use super::stats::Statistics;
use super::{LogCallback, LogLevel};

/// Runs one (code, site) task through the hybrid strategy.
///
/// An attempt is one fetcher walking the URL pipeline: direct product URL
/// variants, then the primary search page, then alternate search URLs.
/// The first stage yielding an identifiable product wins. A failed primary
/// attempt escalates to the fallback fetcher after a short random delay.
pub struct HybridScraper {
    extractor: Extractor,
    fallback_enabled: bool,
    delay_secs: (f64, f64),
    backoff_secs: (f64, f64),
    cancelled: Arc<AtomicBool>,
    log: Option<LogCallback>,
}

impl HybridScraper {
    pub fn new(extractor: Extractor, fallback_enabled: bool) -> Self {
        Self {
            extractor,
            fallback_enabled,
            delay_secs: (1.0, 3.0),
            backoff_secs: (5.0, 10.0),
            cancelled: Arc::new(AtomicBool::new(false)),
            log: None,
        }
    }

    /// Override the inter-attempt and rate-limit delays (tests use zero).
    pub fn with_delays(mut self, delay_secs: (f64, f64), backoff_secs: (f64, f64)) -> Self {
        self.delay_secs = delay_secs;
        self.backoff_secs = backoff_secs;
        self
    }

    /// Share a cancellation flag with the dispatcher.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    pub fn with_log(mut self, log: LogCallback) -> Self {
        self.log = Some(log);
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if let Some(log) = &self.log {
            log(message, level);
        }
    }

    /// Run one task to a terminal result, updating `stats` exactly once
    /// for success or error outcomes. Stopped tasks leave the counters
    /// untouched.
    pub async fn scrape(
        &self,
        task: &ScrapeTask,
        profile: &SiteProfile,
        primary: &dyn Fetcher,
        fallback: Option<&dyn Fetcher>,
        stats: &Statistics,
    ) -> ScrapingResult {
        let started = Instant::now();
        let mut result = ScrapingResult::pending(&task.code, &task.site);

        if self.is_cancelled() {
            result.status = ScrapeStatus::Stopped;
            return result;
        }
        result.status = ScrapeStatus::Running;

        info!(code = %task.code, site = %task.site, method = %primary.method(), "task start");
        match self.attempt(primary, profile, &task.code).await {
            Ok(product) => {
                result.attempts = 1;
                return self.finish_success(result, product, primary, started, stats);
            }
            Err(message) => {
                result.attempts = 1;
                result.error_message = Some(message.clone());
                result.method_used = Some(primary.method());
                self.emit(
                    LogLevel::Warning,
                    &format!("{}/{}: {message}", task.site, task.code),
                );

                let fallback = match fallback {
                    Some(f) if self.fallback_enabled => f,
                    _ => return self.finish_error(result, started, stats),
                };
                if self.is_cancelled() {
                    result.status = ScrapeStatus::Stopped;
                    result.response_time = started.elapsed();
                    return result;
                }

                self.jitter(self.delay_secs).await;
                debug!(code = %task.code, site = %task.site, "escalating to fallback fetcher");
                self.emit(
                    LogLevel::Debug,
                    &format!(
                        "{}/{}: escalating to {}",
                        task.site,
                        task.code,
                        fallback.method()
                    ),
                );

                result.attempts = 2;
                match self.attempt(fallback, profile, &task.code).await {
                    Ok(product) => {
                        self.finish_success(result, product, fallback, started, stats)
                    }
                    Err(message) => {
                        result.error_message = Some(message);
                        result.method_used = Some(fallback.method());
                        self.finish_error(result, started, stats)
                    }
                }
            }
        }
    }

    fn finish_success(
        &self,
        mut result: ScrapingResult,
        product: Product,
        fetcher: &dyn Fetcher,
        started: Instant,
        stats: &Statistics,
    ) -> ScrapingResult {
        result.status = ScrapeStatus::Success;
        result.method_used = Some(fetcher.method());
        result.error_message = None;
        result.response_time = started.elapsed();
        result.scraped_at = chrono::Utc::now();
        result.product = Some(product);
        stats.record_success(fetcher.method(), result.response_time.as_millis() as u64);
        info!(
            code = %result.code,
            site = %result.site,
            method = %fetcher.method(),
            "task success"
        );
        result
    }

    fn finish_error(
        &self,
        mut result: ScrapingResult,
        started: Instant,
        stats: &Statistics,
    ) -> ScrapingResult {
        result.status = ScrapeStatus::Error;
        result.response_time = started.elapsed();
        result.scraped_at = chrono::Utc::now();
        stats.record_failure(result.response_time.as_millis() as u64);
        warn!(
            code = %result.code,
            site = %result.site,
            error = result.error_message.as_deref().unwrap_or("unknown"),
            "task failed"
        );
        result
    }

    /// One fetcher's pass over the URL strategy pipeline.
    async fn attempt(
        &self,
        fetcher: &dyn Fetcher,
        profile: &SiteProfile,
        code: &str,
    ) -> Result<Product, String> {
        let mut last_error: Option<String> = None;

        // Stage 1: direct product pages
        for url in profile.direct_product_urls(code) {
            match fetcher.fetch(&url, profile).await {
                Ok(page) => {
                    if let Some(product) =
                        self.extractor.extract_single(&page.html, profile, code, &page.url)
                    {
                        return Ok(product);
                    }
                }
                Err(err) => {
                    if let Some(message) = self.handle_error(err, &mut last_error).await {
                        return Err(message);
                    }
                }
            }
            // Pace successive requests on the same task
            self.jitter(self.delay_secs).await;
        }

        // Stage 2 and 3: search pages
        let mut search_urls = vec![profile.search_page_url(code)];
        search_urls.extend(profile.alt_search_page_urls(code));
        let last_index = search_urls.len() - 1;
        for (i, url) in search_urls.into_iter().enumerate() {
            match fetcher.fetch(&url, profile).await {
                Ok(page) => {
                    let mut products = self.extractor.extract_products(&page.html, profile, code);
                    if !products.is_empty() {
                        return Ok(products.remove(0));
                    }
                    last_error = Some("no products found".to_string());
                }
                Err(err) => {
                    if let Some(message) = self.handle_error(err, &mut last_error).await {
                        return Err(message);
                    }
                }
            }
            if i < last_index {
                self.jitter(self.delay_secs).await;
            }
        }

        Err(last_error.unwrap_or_else(|| "no products found".to_string()))
    }

    /// Record the error; returns Some when the whole attempt must stop.
    async fn handle_error(
        &self,
        err: FetchError,
        last_error: &mut Option<String>,
    ) -> Option<String> {
        if err.is_fatal_for_fetcher() {
            return Some(err.to_string());
        }
        let rate_limited = matches!(err, FetchError::RateLimited);
        *last_error = Some(err.to_string());
        if rate_limited {
            warn!("rate limited, backing off");
            self.jitter(self.backoff_secs).await;
        }
        None
    }

    async fn jitter(&self, (min, max): (f64, f64)) {
        let secs = {
            let mut rng = rand::rng();
            rng.random_range(min..=max)
        };
        if secs > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(secs)).await;
        }
    }
}
