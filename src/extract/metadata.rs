//! Title and description derivation from raw markup

use log::debug;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Shortest description considered usable; anything shorter falls through
/// the fallback chain
pub const MIN_DESCRIPTION_LENGTH: usize = 10;

/// Shortest paragraph promoted to a description
const MIN_PARAGRAPH_LENGTH: usize = 50;

/// Longest description kept before truncation
const MAX_DESCRIPTION_LENGTH: usize = 300;

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static selector is valid"));

static META_DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("static selector is valid")
});

static OG_DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:description"]"#).expect("static selector is valid")
});

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector is valid"));

/// Everything the pipeline derives from markup in one parse
#[derive(Debug, Clone)]
pub struct PageMetadata {
    /// Title tag text, empty when absent
    pub title: String,
    /// Best available description after the fallback chain, or None when
    /// nothing usable was found
    pub description: Option<String>,
    /// Total visible text length, for read-time estimation
    pub text_length: usize,
}

/// Derive title, description, and text length from markup
///
/// Description fallback chain: `meta[name=description]`, then
/// OpenGraph, then the first paragraph with enough text (truncated).
#[must_use]
pub fn extract_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let meta_description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .next()
        .or_else(|| document.select(&OG_DESCRIPTION_SELECTOR).next())
        .and_then(|m| m.value().attr("content"))
        .map(str::trim)
        .filter(|d| d.len() >= MIN_DESCRIPTION_LENGTH)
        .map(ToString::to_string);

    let description = meta_description.or_else(|| {
        document
            .select(&PARAGRAPH_SELECTOR)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .find(|text| text.len() > MIN_PARAGRAPH_LENGTH)
            .map(|text| truncate_description(&text))
    });

    if description.is_none() {
        debug!("No usable description found in markup");
    }

    let text_length = document
        .root_element()
        .text()
        .map(str::len)
        .sum::<usize>();

    PageMetadata {
        title,
        description,
        text_length,
    }
}

/// Truncate at a character boundary, marking the cut with an ellipsis
#[must_use]
pub fn truncate_description(text: &str) -> String {
    if text.len() <= MAX_DESCRIPTION_LENGTH {
        return text.to_string();
    }
    let mut cut = MAX_DESCRIPTION_LENGTH;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

/// Estimate reading time in minutes from visible text length
///
/// Assumes ~200 words per minute and ~5 characters per word; never less
/// than one minute.
#[must_use]
pub fn estimate_read_time(text_length: usize) -> u32 {
    let words = text_length as f64 / 5.0;
    let minutes = (words / 200.0).round() as u32;
    minutes.max(1)
}
