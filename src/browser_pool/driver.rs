//! Driver seam between pool bookkeeping and real browser processes
//!
//! The pool manages lifecycle and contention; everything that actually
//! touches a browser process sits behind these traits. Production uses
//! [`ChromiumDriver`](super::chromium::ChromiumDriver); tests inject stub
//! sessions so pool semantics are exercised without launching processes.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::fetch::{FetchFailure, FetchMethod, FetchResult};

/// A rendering process could not be started
///
/// This is the one error class allowed to escape resource acquisition:
/// there is no way to serve a rendered fetch without a process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No usable executable after the configured path, well-known install
    /// locations, and managed download were all exhausted
    #[error("browser executable not found: {0}")]
    ExecutableNotFound(String),

    /// The process started but did not come up after all retries
    #[error("browser process failed to start: {0}")]
    ProcessFailed(String),
}

/// What a rendered fetch asks of a browser session
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    /// Budget for navigation, settle, and extraction together
    pub timeout: Duration,
}

/// Markup and metadata captured from a rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub title: String,
    pub description: String,
}

impl RenderedPage {
    /// Convert into the strategy-level result type
    #[must_use]
    pub fn into_fetch_result(self) -> FetchResult {
        FetchResult {
            html: Some(self.html),
            title: self.title,
            description: self.description,
            method_used: FetchMethod::Rendered,
        }
    }
}

/// One live rendering process
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate, wait for document readiness plus a settle delay, and
    /// extract markup and metadata
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, FetchFailure>;

    /// Cheap liveness probe used before handing the session out
    async fn is_healthy(&self) -> bool;

    /// Close the underlying process
    ///
    /// Errors are reported but the session is gone either way; callers
    /// must drop their handle regardless of the result.
    async fn close(self: Box<Self>) -> anyhow::Result<()>;
}

/// Launches rendering processes for the pool
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, LaunchError>;
}
