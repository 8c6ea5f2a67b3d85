//! NLP description service interface
//!
//! The content pipeline falls back to an external description generator
//! only when page-native metadata is missing or judged irrelevant to the
//! topic. The service is consumed through this trait; the pipeline works
//! without one (placeholder descriptions are used instead).

use async_trait::async_trait;

/// Description generation and validation, typically backed by an external
/// NLP service
#[async_trait]
pub trait DescriptionService: Send + Sync {
    /// Generate a description for a resource from its markup
    async fn generate_description(
        &self,
        html: &str,
        url: &str,
        topic: &str,
        language: &str,
    ) -> Option<String>;

    /// Judge whether a page-supplied description is relevant to the topic
    ///
    /// Returning false sends the pipeline to `generate_description`.
    async fn validate_description(&self, description: &str, topic: &str, language: &str) -> bool;
}
