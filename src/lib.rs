//! Adaptive web content acquisition
//!
//! Fetches arbitrary pages with the cheapest strategy that works for each
//! destination host, learning per-domain method and timeout preferences
//! from outcomes. Heavy browser rendering runs against a bounded process
//! pool; plain HTTP handles everything that does not need scripts.
//!
//! ```no_run
//! use fetchwise::{AcquisitionEngine, BrowserPool, ContentPipeline, MemoryPageCache, ScrapeConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScrapeConfig::default();
//!     let pool = BrowserPool::new(&config);
//!     let engine = Arc::new(AcquisitionEngine::new(&config, Arc::clone(&pool))?);
//!     let pipeline = ContentPipeline::new(
//!         engine,
//!         Arc::new(MemoryPageCache::new()),
//!         config.cache_ttl_secs(),
//!     );
//!
//!     let resource = pipeline
//!         .get_page_content("https://example.com/article", "rust", None, "en")
//!         .await;
//!     println!("{}: {}", resource.title, resource.description);
//!
//!     pool.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod browser_pool;
pub mod browser_setup;
pub mod cache;
pub mod config;
pub mod domain_intel;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod nlp;
pub mod stealth;
pub mod utils;

pub use browser_pool::{
    BrowserDriver, BrowserPool, BrowserSession, ChromiumDriver, LaunchError, PooledBrowserGuard,
    RenderRequest, RenderedPage,
};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use cache::{MemoryPageCache, PageCache};
pub use config::{ScrapeConfig, ScrapeConfigBuilder};
pub use domain_intel::{
    DomainIntelligence, DomainMethodRecord, DomainTimeoutRecord, MethodCacheStats,
    TimeoutCacheStats,
};
pub use engine::AcquisitionEngine;
pub use extract::{ContentPipeline, ContentType, ExtractedResource};
pub use fetch::{FetchFailure, FetchMethod, FetchResult, FetchStrategy, LightFetch, RenderedFetch};
pub use nlp::DescriptionService;
