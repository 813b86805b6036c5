//! Orchestrator and dispatcher behavior with stub fetchers (no network).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use pricewatch::error::FetchError;
use pricewatch::extract::Extractor;
use pricewatch::fetch::{FetchedPage, Fetcher};
use pricewatch::models::{ScrapeMethod, ScrapeStatus, ScrapeTask};
use pricewatch::scrape::{
    Dispatcher, FetcherPair, FetcherProvider, HybridScraper, LogLevel, Statistics,
};
use pricewatch::sites::{SiteProfile, SiteRegistry};

/// A page that passes the product-page gate and yields one product.
fn product_page_html(code: &str) -> String {
    format!(
        r#"<html><body class="product-page">
            <h1>Сковорода Tefal Unlimited 28 см, код {code}</h1>
            <div class="price-box">2 499 ₴</div>
            <button class="buy-button">Купити</button>
        </body></html>"#
    )
}

#[derive(Clone, Copy, PartialEq)]
enum StubBehavior {
    Succeed,
    FailForbidden,
    FailStatus,
    RateLimitFirst,
}

/// Scripted fetcher that also counts calls and concurrent use.
struct StubFetcher {
    method: ScrapeMethod,
    behavior: StubBehavior,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    hold_ms: u64,
}

impl StubFetcher {
    fn new(method: ScrapeMethod, behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            method,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            hold_ms: 0,
        })
    }

    fn slow(method: ScrapeMethod, hold_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            method,
            behavior: StubBehavior::Succeed,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            hold_ms,
        })
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str, _profile: &SiteProfile) -> Result<FetchedPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if self.hold_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.hold_ms)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let call = self.calls.load(Ordering::SeqCst);
        match self.behavior {
            StubBehavior::Succeed => {
                let code: String = url.chars().filter(|c| c.is_ascii_digit()).collect();
                Ok(FetchedPage {
                    url: url.to_string(),
                    html: product_page_html(&code),
                })
            }
            StubBehavior::FailForbidden => Err(FetchError::Forbidden),
            StubBehavior::FailStatus => Err(FetchError::Status(500)),
            StubBehavior::RateLimitFirst if call == 1 => Err(FetchError::RateLimited),
            StubBehavior::RateLimitFirst => {
                let code: String = url.chars().filter(|c| c.is_ascii_digit()).collect();
                Ok(FetchedPage {
                    url: url.to_string(),
                    html: product_page_html(&code),
                })
            }
        }
    }

    fn method(&self) -> ScrapeMethod {
        self.method
    }
}

struct StubProvider {
    primary: Arc<StubFetcher>,
    fallback: Option<Arc<StubFetcher>>,
}

impl FetcherProvider for StubProvider {
    fn build(&self) -> anyhow::Result<FetcherPair> {
        Ok(FetcherPair {
            primary: self.primary.clone(),
            fallback: self.fallback.clone().map(|f| f as Arc<dyn Fetcher>),
        })
    }
}

fn quiet_scraper(fallback_enabled: bool) -> HybridScraper {
    HybridScraper::new(Extractor::default(), fallback_enabled)
        .with_delays((0.0, 0.0), (0.0, 0.0))
}

fn profile() -> SiteProfile {
    SiteRegistry::builtin().profile("rozetka").unwrap().clone()
}

#[tokio::test]
async fn fallback_result_carries_method_and_attempts() {
    let primary = StubFetcher::new(ScrapeMethod::Fast, StubBehavior::FailForbidden);
    let fallback = StubFetcher::new(ScrapeMethod::Browser, StubBehavior::Succeed);
    let scraper = quiet_scraper(true);
    let stats = Statistics::new(1);
    let task = ScrapeTask::new("12345678", "rozetka");

    let result = scraper
        .scrape(
            &task,
            &profile(),
            primary.as_ref(),
            Some(fallback.as_ref()),
            &stats,
        )
        .await;

    assert_eq!(result.status, ScrapeStatus::Success);
    assert_eq!(result.method_used, Some(ScrapeMethod::Browser));
    assert_eq!(result.attempts, 2);
    assert!(result.product.is_some());
    // Forbidden aborts the primary's URL pipeline after one request
    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);

    let snap = stats.snapshot();
    assert_eq!(snap.successful, 1);
    assert_eq!(snap.browser_success, 1);
    assert_eq!(snap.fast_success, 0);
}

#[tokio::test]
async fn failure_without_fallback_is_terminal_after_one_attempt() {
    let primary = StubFetcher::new(ScrapeMethod::Fast, StubBehavior::FailStatus);
    let scraper = quiet_scraper(false);
    let stats = Statistics::new(1);
    let task = ScrapeTask::new("12345678", "rozetka");

    let result = scraper
        .scrape(&task, &profile(), primary.as_ref(), None, &stats)
        .await;

    assert_eq!(result.status, ScrapeStatus::Error);
    assert_eq!(result.attempts, 1);
    assert!(result.error_message.is_some());
    assert_eq!(stats.snapshot().failed, 1);
}

#[tokio::test]
async fn log_callback_sees_escalation_at_debug_level() {
    let primary = StubFetcher::new(ScrapeMethod::Fast, StubBehavior::FailForbidden);
    let fallback = StubFetcher::new(ScrapeMethod::Browser, StubBehavior::Succeed);
    let levels: Arc<std::sync::Mutex<Vec<LogLevel>>> = Arc::default();
    let sink = Arc::clone(&levels);
    let scraper = quiet_scraper(true).with_log(Arc::new(move |_, level| {
        sink.lock().unwrap().push(level);
    }));
    let stats = Statistics::new(1);
    let task = ScrapeTask::new("12345678", "rozetka");

    let result = scraper
        .scrape(
            &task,
            &profile(),
            primary.as_ref(),
            Some(fallback.as_ref()),
            &stats,
        )
        .await;

    assert_eq!(result.status, ScrapeStatus::Success);
    let seen = levels.lock().unwrap();
    assert!(seen.contains(&LogLevel::Warning));
    assert!(seen.contains(&LogLevel::Debug));
}

#[tokio::test]
async fn rate_limit_backs_off_within_the_same_attempt() {
    // A 429 on the first URL is not terminal: the fetcher keeps walking
    // its URL pipeline after the back-off and still wins the attempt.
    let primary = StubFetcher::new(ScrapeMethod::Fast, StubBehavior::RateLimitFirst);
    let scraper = quiet_scraper(true);
    let stats = Statistics::new(1);
    let task = ScrapeTask::new("12345678", "rozetka");

    let result = scraper
        .scrape(&task, &profile(), primary.as_ref(), None, &stats)
        .await;

    assert_eq!(result.status, ScrapeStatus::Success);
    assert_eq!(result.method_used, Some(ScrapeMethod::Fast));
    assert_eq!(result.attempts, 1);
    assert!(primary.calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(stats.snapshot().successful, 1);
}

#[tokio::test]
async fn cancellation_before_start_fetches_nothing() {
    let fetcher = StubFetcher::new(ScrapeMethod::Fast, StubBehavior::Succeed);
    let scraper = Arc::new(quiet_scraper(true));
    scraper.cancel_flag().store(true, Ordering::Relaxed);

    let provider = Arc::new(StubProvider {
        primary: fetcher.clone(),
        fallback: None,
    });
    let dispatcher = Dispatcher::new(
        Arc::new(SiteRegistry::builtin()),
        scraper,
        provider,
        2,
    )
    .with_worker_delay((0.0, 0.0));

    let tasks = vec![
        ScrapeTask::new("111111", "rozetka"),
        ScrapeTask::new("222222", "allo"),
    ];
    let (results, snapshot) = dispatcher.run(tasks).await;

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.status, ScrapeStatus::Stopped);
        assert_eq!(result.attempts, 0);
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(snapshot.processed, 0);
}

#[tokio::test]
async fn worker_pool_bounds_concurrency() {
    let fetcher = StubFetcher::slow(ScrapeMethod::Fast, 25);
    let scraper = Arc::new(quiet_scraper(false));
    let provider = Arc::new(StubProvider {
        primary: fetcher.clone(),
        fallback: None,
    });
    let dispatcher = Dispatcher::new(
        Arc::new(SiteRegistry::builtin()),
        scraper,
        provider,
        3,
    )
    .with_worker_delay((0.0, 0.0));

    let tasks: Vec<ScrapeTask> = (0..9)
        .map(|i| ScrapeTask::new(format!("10000{i}"), "rozetka"))
        .collect();
    let (results, snapshot) = dispatcher.run(tasks).await;

    assert_eq!(results.len(), 9);
    assert_eq!(snapshot.processed, 9);
    assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn progress_percent_keeps_fractional_steps() {
    let fetcher = StubFetcher::new(ScrapeMethod::Fast, StubBehavior::Succeed);
    let scraper = Arc::new(quiet_scraper(false));
    let provider = Arc::new(StubProvider {
        primary: fetcher.clone(),
        fallback: None,
    });
    let percents: Arc<std::sync::Mutex<Vec<f32>>> = Arc::default();
    let sink = Arc::clone(&percents);
    let dispatcher = Dispatcher::new(
        Arc::new(SiteRegistry::builtin()),
        scraper,
        provider,
        1,
    )
    .with_worker_delay((0.0, 0.0))
    .with_progress(Arc::new(move |percent, _| {
        sink.lock().unwrap().push(percent);
    }));

    let tasks: Vec<ScrapeTask> = (0..3)
        .map(|i| ScrapeTask::new(format!("10000{i}"), "rozetka"))
        .collect();
    let (results, _) = dispatcher.run(tasks).await;

    assert_eq!(results.len(), 3);
    let seen = percents.lock().unwrap();
    assert_eq!(seen.len(), 3);
    // 1 of 3 is a third, not a truncated 33
    assert!((seen[0] - 100.0 / 3.0).abs() < 0.01);
    assert_eq!(*seen.last().unwrap(), 100.0);
}

#[tokio::test]
async fn batch_statistics_partition_results() {
    // One worker, scripted per-site: rozetka succeeds, allo's code is bad
    let fetcher = StubFetcher::new(ScrapeMethod::Fast, StubBehavior::Succeed);
    let scraper = Arc::new(quiet_scraper(false));
    let provider = Arc::new(StubProvider {
        primary: fetcher.clone(),
        fallback: None,
    });
    let dispatcher = Dispatcher::new(
        Arc::new(SiteRegistry::builtin()),
        scraper,
        provider,
        1,
    )
    .with_worker_delay((0.0, 0.0));

    let tasks = vec![
        ScrapeTask::new("12345678", "rozetka"),
        ScrapeTask::new("abc", "allo"),
    ];
    let (results, snapshot) = dispatcher.run(tasks).await;

    assert_eq!(results.len(), 2);
    assert_eq!(snapshot.processed, 2);
    assert_eq!(snapshot.successful + snapshot.failed, snapshot.processed);
    assert_eq!(snapshot.successful, 1);
    assert_eq!(snapshot.failed, 1);

    let rejected = results
        .iter()
        .find(|r| r.code == "abc")
        .expect("rejected task present");
    assert_eq!(rejected.status, ScrapeStatus::Error);
    assert!(rejected
        .error_message
        .as_deref()
        .unwrap()
        .contains("invalid product code"));
    assert_eq!(rejected.attempts, 0);

    let success = results.iter().find(|r| r.code == "12345678").unwrap();
    assert_eq!(success.status, ScrapeStatus::Success);
    assert_eq!(success.method_used, Some(ScrapeMethod::Fast));
}

#[tokio::test]
async fn unknown_site_is_rejected_without_fetching() {
    let fetcher = StubFetcher::new(ScrapeMethod::Fast, StubBehavior::FailStatus);
    let scraper = Arc::new(quiet_scraper(false));
    let provider = Arc::new(StubProvider {
        primary: fetcher.clone(),
        fallback: None,
    });
    let dispatcher = Dispatcher::new(
        Arc::new(SiteRegistry::builtin()),
        scraper,
        provider,
        1,
    )
    .with_worker_delay((0.0, 0.0));

    let (results, _) = dispatcher
        .run(vec![ScrapeTask::new("12345678", "amazon")])
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ScrapeStatus::Error);
    assert!(results[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("unknown site"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}
