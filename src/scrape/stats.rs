//! Running counters shared across dispatcher workers.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Live tallies for one scraping run.
///
/// Each task increments exactly one of success/failure and, on success,
/// exactly one method counter. Updated lock-free from every worker.
#[derive(Debug, Default)]
pub struct Statistics {
    total: AtomicUsize,
    processed: AtomicUsize,
    successful: AtomicUsize,
    failed: AtomicUsize,
    fast_success: AtomicUsize,
    browser_success: AtomicUsize,
    total_response_ms: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub fast_success: usize,
    pub browser_success: usize,
    /// Mean wall-clock seconds per processed task.
    pub avg_response_secs: f64,
}

impl Statistics {
    pub fn new(total: usize) -> Self {
        let stats = Self::default();
        stats.total.store(total, Ordering::Relaxed);
        stats
    }

    pub fn record_success(&self, method: crate::models::ScrapeMethod, elapsed_ms: u64) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.successful.fetch_add(1, Ordering::Relaxed);
        match method {
            crate::models::ScrapeMethod::Fast => {
                self.fast_success.fetch_add(1, Ordering::Relaxed);
            }
            crate::models::ScrapeMethod::Browser => {
                self.browser_success.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.total_response_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self, elapsed_ms: u64) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.total_response_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let processed = self.processed.load(Ordering::Relaxed);
        let total_ms = self.total_response_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            processed,
            successful: self.successful.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            fast_success: self.fast_success.load(Ordering::Relaxed),
            browser_success: self.browser_success.load(Ordering::Relaxed),
            avg_response_secs: if processed == 0 {
                0.0
            } else {
                total_ms as f64 / processed as f64 / 1000.0
            },
        }
    }
}
