//! Runtime settings: TOML file plus `PRICEWATCH_*` environment overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::models::ScrapeMethod;

fn default_workers() -> usize {
    3
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_browser_nav_timeout_secs() -> u64 {
    30
}

fn default_browser_ready_timeout_secs() -> u64 {
    10
}

fn default_min_delay_secs() -> f64 {
    1.0
}

fn default_max_delay_secs() -> f64 {
    3.0
}

fn default_headless() -> bool {
    true
}

fn default_fallback_enabled() -> bool {
    true
}

fn default_primary_method() -> ScrapeMethod {
    ScrapeMethod::Fast
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Concurrent workers in the dispatcher.
    pub workers: usize,
    /// Fetcher tried first for every task.
    pub primary_method: ScrapeMethod,
    /// Escalate to the other fetcher after a failed primary attempt.
    pub fallback_enabled: bool,
    /// Drop products whose code match cannot be confirmed.
    pub strict_relevance: bool,
    /// Run the browser without a window.
    pub headless: bool,
    pub http_timeout_secs: u64,
    pub browser_nav_timeout_secs: u64,
    pub browser_ready_timeout_secs: u64,
    /// Random delay range between requests, seconds.
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            primary_method: default_primary_method(),
            fallback_enabled: default_fallback_enabled(),
            strict_relevance: false,
            headless: default_headless(),
            http_timeout_secs: default_http_timeout_secs(),
            browser_nav_timeout_secs: default_browser_nav_timeout_secs(),
            browser_ready_timeout_secs: default_browser_ready_timeout_secs(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file, then the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            Some(path) => {
                debug!("config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("PRICEWATCH_WORKERS") {
            self.workers = v;
        }
        if let Ok(v) = std::env::var("PRICEWATCH_METHOD") {
            match v.to_lowercase().as_str() {
                "fast" => self.primary_method = ScrapeMethod::Fast,
                "browser" => self.primary_method = ScrapeMethod::Browser,
                _ => debug!("ignoring unknown PRICEWATCH_METHOD {v:?}"),
            }
        }
        if let Some(v) = env_parse("PRICEWATCH_FALLBACK") {
            self.fallback_enabled = v;
        }
        if let Some(v) = env_parse("PRICEWATCH_STRICT_RELEVANCE") {
            self.strict_relevance = v;
        }
        if let Some(v) = env_parse("PRICEWATCH_HEADLESS") {
            self.headless = v;
        }
        if let Some(v) = env_parse("PRICEWATCH_HTTP_TIMEOUT") {
            self.http_timeout_secs = v;
        }
        if let Some(v) = env_parse("PRICEWATCH_MIN_DELAY") {
            self.min_delay_secs = v;
        }
        if let Some(v) = env_parse("PRICEWATCH_MAX_DELAY") {
            self.max_delay_secs = v;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.workers >= 1, "workers must be at least 1");
        anyhow::ensure!(
            self.min_delay_secs >= 0.0 && self.max_delay_secs >= self.min_delay_secs,
            "delay range is inverted"
        );
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn browser_nav_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_nav_timeout_secs)
    }

    pub fn browser_ready_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_ready_timeout_secs)
    }

    pub fn delay_range(&self) -> (f64, f64) {
        (self.min_delay_secs, self.max_delay_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
