//! Chromium-backed browser driver
//!
//! Launches Chromium via CDP with retry/backoff, applies one-time stealth
//! instrumentation, and renders pages with non-essential resource types
//! blocked to shorten navigation.

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::Page;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::driver::{BrowserDriver, BrowserSession, LaunchError, RenderRequest, RenderedPage};
use crate::browser_setup;
use crate::config::ScrapeConfig;
use crate::fetch::FetchFailure;
use crate::stealth;

/// Launch attempts before giving up
const LAUNCH_RETRIES: u32 = 3;

/// Backoff between launch attempts
const LAUNCH_BACKOFF: Duration = Duration::from_secs(1);

/// Fixed settle delay after document readiness, letting late scripts
/// populate the DOM before extraction
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Poll interval for the document-readiness check
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resource URL patterns aborted during rendering. Markup is all a fetch
/// needs; images, fonts, styles, and media only slow navigation down.
const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico",
    "*.woff", "*.woff2", "*.ttf", "*.otf", "*.eot",
    "*.css",
    "*.mp4", "*.webm", "*.mp3", "*.wav", "*.avi", "*.mov",
];

/// Extracts title and meta/OpenGraph description in one evaluation
const PAGE_METADATA_SCRIPT: &str = r#"
    (() => {
        const metaDesc = document.querySelector('meta[name="description"]');
        const ogDesc = document.querySelector('meta[property="og:description"]');
        return {
            title: document.title || '',
            description: (metaDesc && metaDesc.getAttribute('content')) ||
                         (ogDesc && ogDesc.getAttribute('content')) || ''
        };
    })()
"#;

#[derive(Debug, Deserialize)]
struct PageMetadata {
    title: String,
    description: String,
}

/// Production driver launching real Chromium processes
pub struct ChromiumDriver {
    config: ScrapeConfig,
}

impl ChromiumDriver {
    #[must_use]
    pub fn new(config: ScrapeConfig) -> Self {
        Self { config }
    }

    /// One-time anti-detection instrumentation on a throwaway page
    ///
    /// Registering the evasion scripts against any page installs them for
    /// every document the browser creates afterwards. An instrumentation
    /// error disables the capability for the process lifetime.
    async fn instrument(&self, browser: &Browser) {
        if !self.config.stealth_mode() || !stealth::is_available() {
            return;
        }

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                stealth::disable_for_process(&format!("probe page creation failed: {e}"));
                return;
            }
        };

        if let Err(e) = stealth::inject(&page).await {
            stealth::disable_for_process(&e.to_string());
        } else {
            debug!("Stealth instrumentation applied to browser");
        }

        if let Err(e) = page.close().await {
            debug!("Failed to close stealth probe page: {e}");
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, LaunchError> {
        let mut last_error = None;

        for attempt in 1..=LAUNCH_RETRIES {
            match browser_setup::launch_browser(&self.config).await {
                Ok((browser, handler, user_data_dir)) => {
                    self.instrument(&browser).await;
                    info!("Browser launched (attempt {attempt})");
                    return Ok(Box::new(ChromiumSession {
                        browser,
                        handler,
                        user_data_dir: Some(user_data_dir),
                    }));
                }
                Err(e) => {
                    warn!("Browser launch attempt {attempt}/{LAUNCH_RETRIES} failed: {e}");
                    last_error = Some(e);
                    if attempt < LAUNCH_RETRIES {
                        tokio::time::sleep(LAUNCH_BACKOFF).await;
                    }
                }
            }
        }

        let error = last_error.map_or_else(String::new, |e| e.to_string());
        if error.contains("executable not found") {
            Err(LaunchError::ExecutableNotFound(error))
        } else {
            Err(LaunchError::ProcessFailed(error))
        }
    }
}

/// One live Chromium process with its tracked event-handler task
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl ChromiumSession {
    /// Navigate and extract within the caller's budget
    async fn render_inner(
        page: &Page,
        request: &RenderRequest,
    ) -> Result<RenderedPage, FetchFailure> {
        // Abort requests for resource types the extraction never reads
        page.execute(network::EnableParams::default())
            .await
            .map_err(|e| FetchFailure::Navigation(e.to_string()))?;
        page.execute(network::SetBlockedUrLsParams::new(
            BLOCKED_URL_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect::<Vec<_>>(),
        ))
        .await
        .map_err(|e| FetchFailure::Navigation(e.to_string()))?;

        page.goto(request.url.clone())
            .await
            .map_err(|e| FetchFailure::Navigation(e.to_string()))?;

        // Document-ready, not full-load: waiting for images and late
        // subresources would burn the budget for nothing
        Self::wait_for_dom_ready(page).await;
        tokio::time::sleep(SETTLE_DELAY).await;

        let html = page
            .content()
            .await
            .map_err(|e| FetchFailure::Evaluation(e.to_string()))?;

        let metadata: PageMetadata = page
            .evaluate(PAGE_METADATA_SCRIPT)
            .await
            .map_err(|e| FetchFailure::Evaluation(e.to_string()))?
            .into_value()
            .map_err(|e| FetchFailure::Evaluation(e.to_string()))?;

        Ok(RenderedPage {
            html,
            title: metadata.title,
            description: metadata.description,
        })
    }

    /// Poll until `document.readyState` leaves `loading`
    ///
    /// Unbounded on its own; the render deadline above cuts it off.
    async fn wait_for_dom_ready(page: &Page) {
        loop {
            match page.evaluate("document.readyState").await {
                Ok(result) => {
                    if let Ok(state) = result.into_value::<String>()
                        && state != "loading"
                    {
                        return;
                    }
                }
                Err(e) => {
                    debug!("readyState probe failed: {e}");
                    return;
                }
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, FetchFailure> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchFailure::Navigation(e.to_string()))?;

        let result = match tokio::time::timeout(
            request.timeout,
            Self::render_inner(&page, request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchFailure::DeadlineExceeded(
                request.timeout.as_secs_f64(),
            )),
        };

        // Close the page on every exit path; a leaked page pins renderer
        // memory for the rest of the session's life
        if let Err(e) = page.close().await {
            debug!("Failed to close page after render: {e}");
        }

        result
    }

    async fn is_healthy(&self) -> bool {
        self.browser.version().await.is_ok()
    }

    async fn close(mut self: Box<Self>) -> anyhow::Result<()> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        Ok(())
        // Drop aborts the handler task and removes the profile directory
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
        if let Some(path) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up browser profile directory {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }
}
