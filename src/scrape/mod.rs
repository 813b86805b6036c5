//! Hybrid scraping pipeline: per-task orchestration and the worker pool.

pub mod dispatcher;
pub mod orchestrator;
pub mod stats;

use std::sync::Arc;

pub use dispatcher::{Dispatcher, FetcherPair, FetcherProvider, SettingsFetcherProvider};
pub use orchestrator::HybridScraper;
pub use stats::{Statistics, StatsSnapshot};

/// Progress notification: percent complete (0.0..=100.0) and a short message.
pub type ProgressCallback = Arc<dyn Fn(f32, &str) + Send + Sync>;

/// Log severity for mirrored log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Mirrors pipeline log lines to an embedding application.
pub type LogCallback = Arc<dyn Fn(&str, LogLevel) + Send + Sync>;
