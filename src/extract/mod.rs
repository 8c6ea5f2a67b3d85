//! Content extraction pipeline
//!
//! Wraps the acquisition engine with caching and turns raw markup into
//! structured resource metadata. Total fetch failure still produces a
//! placeholder resource: downstream consumers never special-case failure.

pub mod content_type;
pub mod metadata;

pub use content_type::{ContentType, determine_content_type};
pub use metadata::{PageMetadata, estimate_read_time, extract_metadata};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::PageCache;
use crate::engine::AcquisitionEngine;
use crate::nlp::DescriptionService;
use crate::utils::url_utils::normalize_url;

use metadata::MIN_DESCRIPTION_LENGTH;

/// Structured metadata for one extracted resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedResource {
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_time_minutes: Option<u32>,
}

impl ExtractedResource {
    /// Placeholder returned when nothing could be fetched
    #[must_use]
    pub fn placeholder(url: &str, topic: &str) -> Self {
        Self {
            title: format!("Resource about {topic}"),
            url: url.to_string(),
            description: format!("A resource about {topic}"),
            content_type: determine_content_type(url, None),
            duration_minutes: None,
            read_time_minutes: None,
        }
    }
}

/// Caching extraction pipeline over the acquisition engine
pub struct ContentPipeline {
    engine: Arc<AcquisitionEngine>,
    cache: Arc<dyn PageCache>,
    nlp: Option<Arc<dyn DescriptionService>>,
    cache_ttl_secs: u64,
}

impl ContentPipeline {
    #[must_use]
    pub fn new(
        engine: Arc<AcquisitionEngine>,
        cache: Arc<dyn PageCache>,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            engine,
            cache,
            nlp: None,
            cache_ttl_secs,
        }
    }

    /// Attach an external description generator
    #[must_use]
    pub fn with_description_service(mut self, nlp: Arc<dyn DescriptionService>) -> Self {
        self.nlp = Some(nlp);
        self
    }

    /// The engine backing this pipeline
    #[must_use]
    pub fn engine(&self) -> &Arc<AcquisitionEngine> {
        &self.engine
    }

    /// Fetch raw markup for a URL, consulting the cache first
    ///
    /// Returns None when the page could not be fetched by any strategy
    /// within budget.
    pub async fn scrape_url(
        &self,
        url: &str,
        timeout: Option<Duration>,
        cache_enabled: bool,
    ) -> Option<String> {
        let cache_key = format!("page:{}", normalize_url(url));

        if cache_enabled
            && let Some(cached) = self.cache.get(&cache_key).await
        {
            debug!("Using cached content for {url}");
            return Some(cached);
        }

        let result = self.engine.fetch(url, timeout).await?;
        let html = result.html?;

        if cache_enabled && !self.cache.setex(&cache_key, self.cache_ttl_secs, html.clone()).await {
            warn!("Failed to cache content for {url}");
        }

        Some(html)
    }

    /// Fetch a page and derive structured resource metadata
    ///
    /// Always returns a value: on total fetch failure the placeholder
    /// resource stands in, so callers never branch on failure.
    pub async fn get_page_content(
        &self,
        url: &str,
        topic: &str,
        timeout: Option<Duration>,
        language: &str,
    ) -> ExtractedResource {
        let cache_key = format!("resource:{}_{language}", normalize_url(url));

        if let Some(cached) = self.cache.get(&cache_key).await {
            match serde_json::from_str::<ExtractedResource>(&cached) {
                Ok(resource) => {
                    debug!("Using cached resource for {url}");
                    return resource;
                }
                Err(e) => warn!("Discarding unparseable cached resource for {url}: {e}"),
            }
        }

        let Some(html) = self.scrape_url(url, timeout, true).await else {
            warn!("No content returned for {url}, using placeholder");
            return ExtractedResource::placeholder(url, topic);
        };

        let resource = self.build_resource(&html, url, topic, language).await;

        match serde_json::to_string(&resource) {
            Ok(encoded) => {
                if !self.cache.setex(&cache_key, self.cache_ttl_secs, encoded).await {
                    warn!("Failed to cache resource for {url}");
                }
            }
            Err(e) => warn!("Failed to encode resource for {url}: {e}"),
        }

        resource
    }

    async fn build_resource(
        &self,
        html: &str,
        url: &str,
        topic: &str,
        language: &str,
    ) -> ExtractedResource {
        let page = extract_metadata(html);

        let title = if page.title.len() >= 3 {
            page.title
        } else {
            format!("Resource about {topic}")
        };

        let description = self
            .resolve_description(page.description, html, url, topic, language)
            .await;

        let content_type = determine_content_type(url, Some(html));

        let minutes = estimate_read_time(page.text_length);
        let (duration_minutes, read_time_minutes) = match content_type {
            ContentType::Video => (Some(minutes), None),
            ContentType::Article | ContentType::Tutorial | ContentType::Documentation => {
                (None, Some(minutes))
            }
            _ => (None, None),
        };

        ExtractedResource {
            title,
            url: url.to_string(),
            description,
            content_type,
            duration_minutes,
            read_time_minutes,
        }
    }

    /// Page-native description, the external generator when that is
    /// missing or judged irrelevant, then the placeholder
    async fn resolve_description(
        &self,
        derived: Option<String>,
        html: &str,
        url: &str,
        topic: &str,
        language: &str,
    ) -> String {
        match derived {
            Some(description) if description.len() >= MIN_DESCRIPTION_LENGTH => {
                if let Some(nlp) = &self.nlp
                    && !nlp.validate_description(&description, topic, language).await
                {
                    debug!("Page description judged irrelevant for {url}, regenerating");
                    if let Some(generated) = nlp
                        .generate_description(html, url, topic, language)
                        .await
                        .filter(|d| d.len() >= MIN_DESCRIPTION_LENGTH)
                    {
                        return generated;
                    }
                }
                description
            }
            _ => {
                if let Some(nlp) = &self.nlp
                    && let Some(generated) = nlp
                        .generate_description(html, url, topic, language)
                        .await
                        .filter(|d| d.len() >= MIN_DESCRIPTION_LENGTH)
                {
                    return generated;
                }
                format!("A resource about {topic}")
            }
        }
    }
}
