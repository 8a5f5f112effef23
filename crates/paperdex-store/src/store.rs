//! The document store contract.

use async_trait::async_trait;
use uuid::Uuid;

use crate::document::{Collection, StoredDocument};
use crate::error::Result;

/// Common interface for document store backends.
///
/// There is no transactional guarantee across collections: a caller
/// writing to titles, abstracts and topics performs three independent
/// `put` sequences, and partial failure is surfaced to the caller.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Idempotent upsert of one document into a collection.
    async fn put(&self, collection: Collection, doc: &StoredDocument) -> Result<()>;

    /// Similarity query: documents ordered by decreasing similarity to
    /// `query_text`, at most `limit`. `topic_filter` restricts results
    /// to one topic partition when given.
    async fn query(
        &self,
        collection: Collection,
        query_text: &str,
        limit: usize,
        topic_filter: Option<Uuid>,
    ) -> Result<Vec<StoredDocument>>;

    /// List stored documents without ranking, at most `limit`.
    async fn list_all(&self, collection: Collection, limit: usize) -> Result<Vec<StoredDocument>>;
}
