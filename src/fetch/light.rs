//! Plain-HTTP fetch strategy
//!
//! One GET with a rotating user agent, hard-capped at a few seconds: if a
//! page cannot be fetched this cheaply it is not worth more of the budget,
//! the rendered strategy is. A 200 response still fails if the body looks
//! like a script-only shell, which is how light fetches against SPA hosts
//! get detected and fed back into method learning.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::prelude::IndexedRandom;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use super::{FetchFailure, FetchMethod, FetchResult, FetchStrategy};
use crate::utils::constants::{LIGHT_FETCH_CAP_SECS, USER_AGENTS};

/// Minimum visible text for a page with no recognizable content container
const MIN_TEXT_LENGTH: usize = 1000;

static MAIN_CONTENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("main, article, #content, .content").expect("static selector is valid")
});

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static selector is valid"));

static META_DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("static selector is valid")
});

static OG_DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:description"]"#).expect("static selector is valid")
});

/// Plain HTTP GET strategy, no script execution
pub struct LightFetch {
    client: reqwest::Client,
}

impl LightFetch {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

/// Parsed body, or the reason it is unusable
fn parse_body(html: &str) -> Result<(String, String), FetchFailure> {
    let document = Html::parse_document(html);

    // Script-only shells return 200 with an empty body; treat those as
    // failures so the caller falls back to rendering
    let has_main_content = document.select(&MAIN_CONTENT_SELECTOR).next().is_some()
        || document
            .root_element()
            .text()
            .map(str::len)
            .sum::<usize>()
            > MIN_TEXT_LENGTH;

    if !has_main_content {
        return Err(FetchFailure::ThinContent);
    }

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .next()
        .or_else(|| document.select(&OG_DESCRIPTION_SELECTOR).next())
        .and_then(|m| m.value().attr("content"))
        .unwrap_or_default()
        .to_string();

    Ok((title, description))
}

#[async_trait]
impl FetchStrategy for LightFetch {
    fn method(&self) -> FetchMethod {
        FetchMethod::Light
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResult, FetchFailure> {
        let capped = timeout.min(Duration::from_secs_f64(LIGHT_FETCH_CAP_SECS));
        let user_agent = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let response = self
            .client
            .get(url)
            .timeout(capped)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchFailure::DeadlineExceeded(capped.as_secs_f64())
                } else {
                    FetchFailure::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            debug!("Light fetch failed for {url}: status {status}");
            return Err(FetchFailure::HttpStatus(status.as_u16()));
        }

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::DeadlineExceeded(capped.as_secs_f64())
            } else {
                FetchFailure::Network(e.to_string())
            }
        })?;

        let (title, description) = parse_body(&html)?;

        Ok(FetchResult {
            html: Some(html),
            title,
            description,
            method_used: FetchMethod::Light,
        })
    }
}
