//! Error taxonomy for the scraping pipeline.
//!
//! Fetch failures stay inside the per-task `ScrapingResult`; nothing here
//! crosses the dispatcher boundary as a hard error except programming
//! mistakes (misconfigured worker counts and the like), which go through
//! anyhow at the CLI layer.

use thiserror::Error;

/// A single fetch attempt failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The response was an anti-bot challenge page, not real content.
    #[error("blocked by anti-bot protection ({indicator})")]
    Blocked {
        /// The phrase that tripped the block detector.
        indicator: String,
    },

    /// HTTP 403. The same fetcher must not retry this URL.
    #[error("access forbidden (403)")]
    Forbidden,

    /// HTTP 429. The caller must back off before any further attempt.
    #[error("rate limited (429)")]
    RateLimited,

    /// No response or DOM readiness within the configured bound.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// Any other unsuccessful HTTP status.
    #[error("http status {0}")]
    Status(u16),

    /// Transport-level failure (DNS, TLS, connection reset...).
    #[error("network error: {0}")]
    Network(String),

    /// Browser automation failure (launch, navigation, CDP).
    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Whether the same fetcher may try another URL after this error.
    ///
    /// Blocked and Forbidden mean the site has made up its mind about this
    /// fetcher's fingerprint; retrying different URLs only burns attempts.
    pub fn is_fatal_for_fetcher(&self) -> bool {
        matches!(self, FetchError::Blocked { .. } | FetchError::Forbidden)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout("http response".to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Task-level failures that happen before any fetch is attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Product code failed validation (empty or non-digits).
    #[error("invalid product code: {0:?}")]
    InvalidCode(String),

    /// Site id is not in the profile registry.
    #[error("unknown site: {0:?}")]
    UnknownSite(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_and_forbidden_are_fatal() {
        assert!(FetchError::Blocked {
            indicator: "captcha".into()
        }
        .is_fatal_for_fetcher());
        assert!(FetchError::Forbidden.is_fatal_for_fetcher());
        assert!(!FetchError::RateLimited.is_fatal_for_fetcher());
        assert!(!FetchError::Timeout("x".into()).is_fatal_for_fetcher());
        assert!(!FetchError::Status(500).is_fatal_for_fetcher());
    }

    #[test]
    fn error_messages_are_readable() {
        let err = FetchError::Blocked {
            indicator: "cloudflare".into(),
        };
        assert!(err.to_string().contains("cloudflare"));
        assert_eq!(
            TaskError::UnknownSite("foo".into()).to_string(),
            "unknown site: \"foo\""
        );
    }
}
