//! Headless-browser fetcher for anti-bot protected sites.
//!
//! Uses chromiumoxide (CDP) with stealth evasion so pages render the same
//! DOM a real visitor would get. A fetcher owns at most one browser; page
//! access is serialized internally, so concurrent workers each get their
//! own instance.

#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;

#[cfg(feature = "browser")]
use anyhow::Context;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::models::ScrapeMethod;
use crate::sites::SiteProfile;

use super::{FetchedPage, Fetcher};
#[cfg(feature = "browser")]
use super::{find_block_indicator, stealth::STEALTH_SCRIPTS, user_agent::random_user_agent};

/// JavaScript to wait for page ready state.
#[cfg(feature = "browser")]
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

#[cfg(feature = "browser")]
pub struct BrowserFetcher {
    headless: bool,
    nav_timeout: Duration,
    ready_timeout: Duration,
    browser: Mutex<Option<Browser>>,
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(headless: bool, nav_timeout: Duration, ready_timeout: Duration) -> Self {
        Self {
            headless,
            nav_timeout,
            ready_timeout,
            browser: Mutex::new(None),
        }
    }

    /// Find Chrome executable.
    fn find_chrome() -> anyhow::Result<std::path::PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Please install it:\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
        ))
    }

    async fn launch(&self) -> anyhow::Result<Browser> {
        info!("Launching browser (headless={})", self.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless, confusingly
        if !self.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--metrics-recording-only")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-software-rasterizer");

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(browser)
    }

    async fn prepare_page(&self, browser: &Browser) -> anyhow::Result<Page> {
        let page = browser.new_page("about:blank").await?;

        page.execute(
            SetUserAgentOverrideParams::builder()
                .user_agent(random_user_agent())
                .accept_language("uk-UA,uk;q=0.9,ru;q=0.8,en-US;q=0.7")
                .build()
                .map_err(|e| anyhow::anyhow!("user agent params: {}", e))?,
        )
        .await?;

        for script in STEALTH_SCRIPTS {
            if let Err(e) = page.evaluate(script.to_string()).await {
                debug!("Stealth script injection skipped: {}", e);
            }
        }

        Ok(page)
    }

    async fn wait_for_page_ready(&self, page: &Page) {
        match tokio::time::timeout(
            self.ready_timeout,
            page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()),
        )
        .await
        {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state"),
        }
    }

    /// Poll for any of the profile's content selectors to appear.
    async fn wait_for_content(&self, page: &Page, profile: &SiteProfile) -> Result<(), FetchError> {
        let deadline = tokio::time::Instant::now() + self.ready_timeout;
        loop {
            for selector in profile.ready_selectors() {
                if page.find_element(selector).await.is_ok() {
                    debug!("Content selector found: {}", selector);
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(FetchError::Timeout(format!(
                    "content selectors on {}",
                    profile.id
                )));
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    /// Close the browser process, if one was launched.
    pub async fn close(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            let _ = browser.close().await;
        }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str, profile: &SiteProfile) -> Result<FetchedPage, FetchError> {
        // One page at a time per instance; the guard spans the whole fetch
        let mut guard = self.browser.lock().await;
        if guard.is_none() {
            let browser = self
                .launch()
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            *guard = Some(browser);
        }
        let Some(browser) = guard.as_ref() else {
            return Err(FetchError::Browser("browser unavailable".to_string()));
        };

        let page = self
            .prepare_page(browser)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let result = self.fetch_on_page(&page, url, profile).await;
        let _ = page.close().await;
        result
    }

    fn method(&self) -> ScrapeMethod {
        ScrapeMethod::Browser
    }
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    async fn fetch_on_page(
        &self,
        page: &Page,
        url: &str,
        profile: &SiteProfile,
    ) -> Result<FetchedPage, FetchError> {
        debug!(%url, "browser fetch");

        tokio::time::timeout(self.nav_timeout, page.goto(url))
            .await
            .map_err(|_| FetchError::Timeout(format!("navigation to {url}")))?
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        self.wait_for_page_ready(page).await;
        self.wait_for_content(page, profile).await?;

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        if let Some(indicator) = find_block_indicator(&html) {
            return Err(FetchError::Blocked {
                indicator: indicator.to_string(),
            });
        }

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserFetcher;

#[cfg(not(feature = "browser"))]
impl BrowserFetcher {
    pub fn new(
        _headless: bool,
        _nav_timeout: std::time::Duration,
        _ready_timeout: std::time::Duration,
    ) -> Self {
        Self
    }

    pub async fn close(&self) {}
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&self, _url: &str, _profile: &SiteProfile) -> Result<FetchedPage, FetchError> {
        Err(FetchError::Browser(
            "browser support not compiled; rebuild with --features browser".to_string(),
        ))
    }

    fn method(&self) -> ScrapeMethod {
        ScrapeMethod::Browser
    }
}
