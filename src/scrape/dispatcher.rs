//! Bounded worker pool over (code, site) tasks.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{debug, error, info};

use crate::error::TaskError;
use crate::fetch::Fetcher;
use crate::models::{ScrapeStatus, ScrapeTask, ScrapingResult};
use crate::sites::{SiteProfile, SiteRegistry};

use super::orchestrator::HybridScraper;
use super::stats::{Statistics, StatsSnapshot};
use super::ProgressCallback;

/// Builds the fetchers a worker will own.
///
/// Called once per worker so that browser-backed fetchers are never shared
/// between concurrent tasks.
pub trait FetcherProvider: Send + Sync {
    fn build(&self) -> anyhow::Result<FetcherPair>;
}

/// One worker's primary fetcher and optional escalation target.
pub struct FetcherPair {
    pub primary: Arc<dyn Fetcher>,
    pub fallback: Option<Arc<dyn Fetcher>>,
}

/// Builds fetchers from runtime settings.
pub struct SettingsFetcherProvider {
    settings: crate::config::Settings,
}

impl SettingsFetcherProvider {
    pub fn new(settings: crate::config::Settings) -> Self {
        Self { settings }
    }

    fn fast(&self) -> anyhow::Result<Arc<dyn Fetcher>> {
        Ok(Arc::new(crate::fetch::FastFetcher::new(
            self.settings.http_timeout(),
        )?))
    }

    fn browser(&self) -> Arc<dyn Fetcher> {
        Arc::new(crate::fetch::BrowserFetcher::new(
            self.settings.headless,
            self.settings.browser_nav_timeout(),
            self.settings.browser_ready_timeout(),
        ))
    }
}

impl FetcherProvider for SettingsFetcherProvider {
    fn build(&self) -> anyhow::Result<FetcherPair> {
        use crate::models::ScrapeMethod;

        let (primary, fallback): (Arc<dyn Fetcher>, Arc<dyn Fetcher>) =
            match self.settings.primary_method {
                ScrapeMethod::Fast => (self.fast()?, self.browser()),
                ScrapeMethod::Browser => (self.browser(), self.fast()?),
            };
        Ok(FetcherPair {
            primary,
            fallback: self.settings.fallback_enabled.then_some(fallback),
        })
    }
}

/// Runs a batch of tasks with bounded concurrency.
///
/// Invalid tasks are rejected before any worker sees them. Cancellation
/// stops queue consumption; tasks already in flight run to completion and
/// whatever finished is returned.
pub struct Dispatcher {
    registry: Arc<SiteRegistry>,
    scraper: Arc<HybridScraper>,
    provider: Arc<dyn FetcherProvider>,
    max_workers: usize,
    worker_delay_secs: (f64, f64),
    progress: Option<ProgressCallback>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SiteRegistry>,
        scraper: Arc<HybridScraper>,
        provider: Arc<dyn FetcherProvider>,
        max_workers: usize,
    ) -> Self {
        Self {
            registry,
            scraper,
            provider,
            max_workers: max_workers.max(1),
            worker_delay_secs: (1.0, 3.0),
            progress: None,
        }
    }

    /// Override the per-worker inter-task delay (tests use zero).
    pub fn with_worker_delay(mut self, delay_secs: (f64, f64)) -> Self {
        self.worker_delay_secs = delay_secs;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, processed: usize, total: usize, message: &str) {
        if let Some(progress) = &self.progress {
            let percent = if total == 0 {
                100.0
            } else {
                processed as f32 * 100.0 / total as f32
            };
            progress(percent, message);
        }
    }

    /// Run the whole batch and return results in completion order.
    pub async fn run(&self, tasks: Vec<ScrapeTask>) -> (Vec<ScrapingResult>, StatsSnapshot) {
        let total = tasks.len();
        let stats = Arc::new(Statistics::new(total));
        let mut results = Vec::with_capacity(total);
        let mut queue_items = Vec::new();

        // Validation pass: bad tasks become error results without a fetch
        for task in tasks {
            if !ScrapeTask::validate_code(&task.code) {
                let err = TaskError::InvalidCode(task.code.clone());
                stats.record_failure(0);
                let result = ScrapingResult::rejected(&task.code, &task.site, err.to_string());
                self.report(
                    results.len() + 1,
                    total,
                    &format!("{}/{}: rejected", task.site, task.code),
                );
                results.push(result);
                continue;
            }
            match self.registry.profile(&task.site) {
                Ok(profile) => queue_items.push((task, profile.clone())),
                Err(err) => {
                    stats.record_failure(0);
                    let result =
                        ScrapingResult::rejected(&task.code, &task.site, err.to_string());
                    self.report(
                        results.len() + 1,
                        total,
                        &format!("{}/{}: rejected", task.site, task.code),
                    );
                    results.push(result);
                }
            }
        }

        let queue: Arc<Mutex<Vec<(ScrapeTask, SiteProfile)>>> =
            Arc::new(Mutex::new(queue_items));
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<ScrapingResult>();

        info!(total, workers = self.max_workers, "dispatch start");

        let mut handles = Vec::new();
        for worker_id in 0..self.max_workers {
            let queue = Arc::clone(&queue);
            let semaphore = Arc::clone(&semaphore);
            let scraper = Arc::clone(&self.scraper);
            let provider = Arc::clone(&self.provider);
            let stats = Arc::clone(&stats);
            let tx = tx.clone();
            let delay = self.worker_delay_secs;

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };

                let pair = match provider.build() {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(worker_id, "fetcher init failed: {e:#}");
                        return;
                    }
                };

                loop {
                    if scraper.is_cancelled() {
                        debug!(worker_id, "cancelled, draining stopped");
                        break;
                    }
                    let Some((task, profile)) = queue.lock().await.pop() else {
                        break;
                    };

                    let result = scraper
                        .scrape(
                            &task,
                            &profile,
                            pair.primary.as_ref(),
                            pair.fallback.as_deref(),
                            &stats,
                        )
                        .await;
                    let stopped = result.status == ScrapeStatus::Stopped;
                    if tx.send(result).is_err() || stopped {
                        break;
                    }

                    let secs = {
                        let mut rng = rand::rng();
                        rng.random_range(delay.0..=delay.1)
                    };
                    if secs > 0.0 {
                        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                    }
                }
            }));
        }
        drop(tx);

        while let Some(result) = rx.recv().await {
            self.report(
                results.len() + 1,
                total,
                &format!("{}/{}: {:?}", result.site, result.code, result.status),
            );
            results.push(result);
        }
        for handle in handles {
            let _ = handle.await;
        }

        // Tasks no worker could take (init failures, cancellation)
        let mut leftover = queue.lock().await;
        for (task, _) in leftover.drain(..) {
            let mut result = ScrapingResult::pending(&task.code, &task.site);
            if self.scraper.is_cancelled() {
                result.status = ScrapeStatus::Stopped;
            } else {
                result.status = ScrapeStatus::Error;
                result.error_message = Some("no worker available".to_string());
                stats.record_failure(0);
            }
            results.push(result);
        }

        let snapshot = stats.snapshot();
        info!(
            processed = snapshot.processed,
            successful = snapshot.successful,
            failed = snapshot.failed,
            "dispatch done"
        );
        (results, snapshot)
    }
}
