//! Fetch strategy contract
//!
//! Two interchangeable retrieval strategies implement one contract:
//! [`LightFetch`](light::LightFetch) issues a plain HTTP GET with no script
//! execution, [`RenderedFetch`](rendered::RenderedFetch) drives a pooled
//! browser engine. The acquisition engine selects between them per domain
//! and falls back from light to rendered when budget allows.
//!
//! Failures are carried as an explicit [`FetchFailure`] value; no panic or
//! unchecked error crosses a strategy boundary.

pub mod light;
pub mod rendered;

pub use light::LightFetch;
pub use rendered::RenderedFetch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Retrieval strategy identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    /// Plain HTTP client, no script execution
    Light,
    /// Full browser engine rendering
    Rendered,
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Rendered => write!(f, "rendered"),
        }
    }
}

/// Raw markup and basic metadata captured by a fetch strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    /// Captured document markup; None when the strategy produced metadata
    /// without a usable body
    pub html: Option<String>,
    /// Document title, empty when unavailable
    pub title: String,
    /// Meta/OpenGraph description, empty when unavailable
    pub description: String,
    /// Strategy that produced this result
    pub method_used: FetchMethod,
}

/// Why a fetch attempt failed
///
/// All variants are recoverable at the engine level (method fallback or a
/// null result); none propagate past the engine boundary.
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// Transport-level error before any response arrived
    #[error("request error: {0}")]
    Network(String),

    /// Server answered with a non-200 status
    #[error("http status {0}")]
    HttpStatus(u16),

    /// 200 response whose body fails the main-content heuristic
    /// (script-only shell)
    #[error("no main content detected")]
    ThinContent,

    /// Browser navigation did not complete
    #[error("navigation error: {0}")]
    Navigation(String),

    /// In-page evaluation failed after navigation
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// The strategy exceeded its deadline
    #[error("timed out after {0:.1}s")]
    DeadlineExceeded(f64),

    /// A rendering process could not be obtained
    #[error("browser unavailable: {0}")]
    BrowserUnavailable(String),
}

/// One fetch contract implemented by both strategies
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Which strategy this is, for outcome recording
    fn method(&self) -> FetchMethod;

    /// Retrieve the page, bounded by `timeout`
    ///
    /// Implementations bound their own I/O, but callers still wrap the call
    /// in an external deadline; neither side trusts the other not to hang.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResult, FetchFailure>;
}
