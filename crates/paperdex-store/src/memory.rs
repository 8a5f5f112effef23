//! In-memory document store.
//!
//! Brute-force cosine ranking over embedder vectors. Backs tests and
//! no-persistence deployments; behavior matches [`LanceStore`] at the
//! contract level (lazy collections, idempotent upsert, ordered query).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::document::{Collection, StoredDocument};
use crate::embed::{cosine, Embedder};
use crate::error::Result;
use crate::store::DocumentStore;

pub struct MemoryStore {
    embedder: Arc<dyn Embedder>,
    collections: Mutex<HashMap<Collection, Vec<(StoredDocument, Vec<f32>)>>>,
}

impl MemoryStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            collections: Mutex::new(HashMap::new()),
        }
    }

    /// Total documents in one collection. Test/diagnostic helper.
    pub fn count(&self, collection: Collection) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(&collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, collection: Collection, doc: &StoredDocument) -> Result<()> {
        let vector = self.embedder.embed(&doc.text).await?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection).or_default();
        // Upsert by id
        docs.retain(|(existing, _)| existing.id != doc.id);
        docs.push((doc.clone(), vector));
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        query_text: &str,
        limit: usize,
        topic_filter: Option<Uuid>,
    ) -> Result<Vec<StoredDocument>> {
        let query_vec = self.embedder.embed(query_text).await?;
        let collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get(&collection) else {
            // Collection absent — treat as created-empty.
            return Ok(vec![]);
        };

        let mut scored: Vec<(f32, &StoredDocument)> = docs
            .iter()
            .filter(|(doc, _)| {
                topic_filter
                    .map(|t| doc.metadata.topic_id == t)
                    .unwrap_or(true)
            })
            .map(|(doc, vec)| (cosine(&query_vec, vec), doc))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn list_all(&self, collection: Collection, limit: usize) -> Result<Vec<StoredDocument>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .take(limit)
                    .map(|(doc, _)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
