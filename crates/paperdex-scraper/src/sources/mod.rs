//! Paper source clients.

pub mod arxiv;
pub mod listing;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::RawPaper;

/// Common interface for all paper source clients.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Fetch up to `max_results` raw paper records for a topic.
    ///
    /// Page-scoped sources (the curated listing site) ignore the topic
    /// text and return whatever the configured page currently shows.
    async fn fetch(&self, topic: &str, max_results: usize) -> Result<Vec<RawPaper>, FetchError>;

    /// Short source name for logs and summaries.
    fn name(&self) -> &'static str;
}
