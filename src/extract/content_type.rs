//! Content classification from hostname rules and DOM signals

use log::debug;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Classification of an extracted resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Documentation,
    Exercise,
    Tutorial,
    Quiz,
    Article,
    Unknown,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Documentation => "documentation",
            Self::Exercise => "exercise",
            Self::Tutorial => "tutorial",
            Self::Quiz => "quiz",
            Self::Article => "article",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

const VIDEO_PLATFORMS: &[&str] = &["youtube.com", "vimeo.com", "dailymotion.com"];

const DOCUMENTATION_PATTERNS: &[&str] = &["docs.", "documentation.", ".dev/docs", "developer."];

const EXERCISE_PLATFORMS: &[&str] = &[
    "exercism.io",
    "leetcode.com",
    "hackerrank.com",
    "codewars.com",
];

static VIDEO_EMBED_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"video, iframe[src*="youtube"], iframe[src*="vimeo"]"#)
        .expect("static selector is valid")
});

static CODE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("code, pre, .code, .codehilite, .highlight").expect("static selector is valid")
});

/// Classify a resource from its URL and, when available, its markup
///
/// Hostname rules run first so known platforms classify without a parse;
/// DOM inspection then looks for video embeds, code blocks, and quiz
/// signals. Everything else is an article.
#[must_use]
pub fn determine_content_type(url: &str, html: Option<&str>) -> ContentType {
    let domain = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();

    if VIDEO_PLATFORMS.iter().any(|p| domain.contains(p)) {
        return ContentType::Video;
    }

    // Documentation patterns match against the full URL since `.dev/docs`
    // spans host and path
    let url_lower = url.to_lowercase();
    if DOCUMENTATION_PATTERNS
        .iter()
        .any(|p| domain.contains(p) || url_lower.contains(p))
    {
        return ContentType::Documentation;
    }

    if EXERCISE_PLATFORMS.iter().any(|p| domain.contains(p)) {
        return ContentType::Exercise;
    }

    let Some(html) = html else {
        return ContentType::Article;
    };

    classify_from_markup(html)
}

fn classify_from_markup(html: &str) -> ContentType {
    let document = Html::parse_document(html);

    if document.select(&VIDEO_EMBED_SELECTOR).next().is_some() {
        return ContentType::Video;
    }

    if document.select(&CODE_SELECTOR).next().is_some() {
        debug!("Code blocks present, classifying as tutorial");
        return ContentType::Tutorial;
    }

    let text = document
        .root_element()
        .text()
        .collect::<String>()
        .to_lowercase();
    let has_quiz = (text.contains("quiz") || text.contains("exercise") || text.contains("practice"))
        && (text.contains("question") || text.contains("answer") || text.contains("solution"));
    if has_quiz {
        return ContentType::Quiz;
    }

    ContentType::Article
}
