//! Browser-rendered fetch strategy
//!
//! Acquires a pooled browser session and renders the page with script
//! execution. The session guard returns the browser to the pool on every
//! exit path: success, navigation error, evaluation error, or timeout.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{FetchFailure, FetchMethod, FetchResult, FetchStrategy};
use crate::browser_pool::{BrowserPool, RenderRequest};

/// Full browser-engine strategy for script-driven pages
pub struct RenderedFetch {
    pool: Arc<BrowserPool>,
}

impl RenderedFetch {
    #[must_use]
    pub fn new(pool: Arc<BrowserPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FetchStrategy for RenderedFetch {
    fn method(&self) -> FetchMethod {
        FetchMethod::Rendered
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResult, FetchFailure> {
        let guard = self
            .pool
            .acquire()
            .await
            .map_err(|e| FetchFailure::BrowserUnavailable(e.to_string()))?;

        debug!("Rendering {url} with browser {}", guard.id());

        let request = RenderRequest {
            url: url.to_string(),
            timeout,
        };

        let rendered = guard.session().render(&request).await?;
        Ok(rendered.into_fetch_result())
        // guard drops here, returning the browser to the pool
    }
}
