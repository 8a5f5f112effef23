//! The retrieval policy engine.
//!
//! Orchestrates the full flow for each operation:
//!   scrape_and_store:  fetch → normalize → write topics → titles → abstracts
//!   search_stored:     nearest stored topic → titles/abstracts by that topic's text
//!   get_or_scrape:     search, falling back to a live scrape on miss
//!
//! Steps inside one operation are strictly sequential. Multi-collection
//! writes carry no transaction: a failure mid-write leaves earlier
//! writes persisted, and the partial state is logged distinctly from a
//! total failure. The engine never retries — retry policy belongs to
//! the calling transport.

use std::sync::Arc;

use paperdex_scraper::{FetchError, PaperSource};
use paperdex_store::{Collection, DocumentStore, StoreError, StoredDocument};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::normalize::{normalize_papers, NormalizedBatch};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// `max_results` must be a positive integer.
    #[error("max_results must be a positive integer")]
    InvalidLimit,

    /// The source could not be fetched at all.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A collection write failed; earlier writes are not rolled back.
    #[error("Store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    /// A collection query failed.
    #[error("Store query failed: {0}")]
    StoreQuery(#[source] StoreError),

    /// No topic in the store is close enough to serve the query.
    #[error("No matching topics found in store")]
    NoMatch,

    /// Stored search and the live-scrape fallback both failed.
    #[error("Both search and scrape failed; search: {search}; scrape: {scrape}")]
    Combined {
        search: String,
        scrape: Box<EngineError>,
    },
}

// ── Result shapes ─────────────────────────────────────────────────────────────

/// Outcome of one scrape_and_store call.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSummary {
    pub topic_id: Uuid,
    /// Number of papers persisted (title/abstract pairs).
    pub stored_papers: usize,
}

/// Outcome of one search_stored call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub titles: Vec<StoredDocument>,
    pub abstracts: Vec<StoredDocument>,
    /// The stored topic text the query was resolved to.
    pub matched_topic: String,
}

/// Outcome of one get_or_scrape call.
#[derive(Debug, Clone, Serialize)]
pub struct GetOrScrapeResults {
    #[serde(flatten)]
    pub results: SearchResults,
    /// Whether a live scrape was triggered to serve this call.
    pub scraped: bool,
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// The get-or-scrape decision logic over one store and one source.
///
/// Holds its collaborators by explicit shared handles — there is no
/// module-level store state. Cloning is cheap; concurrent calls against
/// the same store are safe because every call mints its own identifiers.
#[derive(Clone)]
pub struct RetrievalEngine {
    store: Arc<dyn DocumentStore>,
    source: Arc<dyn PaperSource>,
}

impl RetrievalEngine {
    pub fn new(store: Arc<dyn DocumentStore>, source: Arc<dyn PaperSource>) -> Self {
        Self { store, source }
    }

    /// Fetch papers for a topic and persist the normalized documents.
    ///
    /// A total fetch failure writes nothing. A write failure after the
    /// fetch leaves earlier writes persisted (append-only store, no
    /// rollback) and is reported as [`EngineError::StoreWrite`].
    #[instrument(skip(self))]
    pub async fn scrape_and_store(
        &self,
        topic: &str,
        max_results: usize,
    ) -> Result<ScrapeSummary, EngineError> {
        if max_results == 0 {
            return Err(EngineError::InvalidLimit);
        }

        let raw = self.source.fetch(topic, max_results).await?;
        let batch = normalize_papers(topic, &raw);

        self.write_batch(&batch).await?;

        info!(
            topic = topic,
            topic_id = %batch.topic_id(),
            papers = batch.paper_count(),
            source = self.source.name(),
            "Scrape stored"
        );
        Ok(ScrapeSummary {
            topic_id: batch.topic_id(),
            stored_papers: batch.paper_count(),
        })
    }

    /// Cache-only search: resolve the nearest stored topic, then rank
    /// titles and abstracts against that topic's text.
    ///
    /// The title/abstract queries are deliberately not filtered by
    /// topic id — topic matching is approximate, and similar papers
    /// stored under another topic are fair results.
    #[instrument(skip(self))]
    pub async fn search_stored(
        &self,
        topic: &str,
        max_results: usize,
    ) -> Result<SearchResults, EngineError> {
        if max_results == 0 {
            return Err(EngineError::InvalidLimit);
        }

        let matched = self
            .store
            .query(Collection::Topics, topic, 1, None)
            .await
            .map_err(EngineError::StoreQuery)?;
        let Some(matched_topic) = matched.into_iter().next() else {
            return Err(EngineError::NoMatch);
        };

        let titles = self
            .store
            .query(Collection::Titles, &matched_topic.text, max_results, None)
            .await
            .map_err(EngineError::StoreQuery)?;
        let abstracts = self
            .store
            .query(Collection::Abstracts, &matched_topic.text, max_results, None)
            .await
            .map_err(EngineError::StoreQuery)?;

        Ok(SearchResults {
            titles,
            abstracts,
            matched_topic: matched_topic.text,
        })
    }

    /// Serve from the store when possible, else refresh from the live
    /// source and search again. The resilient entry point for
    /// user-facing flows.
    #[instrument(skip(self))]
    pub async fn get_or_scrape(
        &self,
        topic: &str,
        max_results: usize,
    ) -> Result<GetOrScrapeResults, EngineError> {
        let search_detail = match self.search_stored(topic, max_results).await {
            Ok(results) if !results.titles.is_empty() => {
                return Ok(GetOrScrapeResults {
                    results,
                    scraped: false,
                });
            }
            Ok(_) => "stored search returned no titles".to_string(),
            Err(e) => e.to_string(),
        };

        if let Err(scrape_err) = self.scrape_and_store(topic, max_results).await {
            return Err(EngineError::Combined {
                search: search_detail,
                scrape: Box::new(scrape_err),
            });
        }

        match self.search_stored(topic, max_results).await {
            Ok(results) => Ok(GetOrScrapeResults {
                results,
                scraped: true,
            }),
            Err(e) => Err(EngineError::Combined {
                search: search_detail,
                scrape: Box::new(e),
            }),
        }
    }

    /// Enumerate stored topic texts.
    #[instrument(skip(self))]
    pub async fn list_topics(&self, limit: usize) -> Result<Vec<String>, EngineError> {
        let topics = self
            .store
            .list_all(Collection::Topics, limit)
            .await
            .map_err(EngineError::StoreQuery)?;
        Ok(topics.into_iter().map(|doc| doc.text).collect())
    }

    /// Write one normalized batch in collection order topics → titles →
    /// abstracts, logging how far the write got on failure.
    async fn write_batch(&self, batch: &NormalizedBatch) -> Result<(), EngineError> {
        self.store
            .put(Collection::Topics, &batch.topic)
            .await
            .map_err(EngineError::StoreWrite)?;

        for (written, doc) in batch.titles.iter().enumerate() {
            if let Err(e) = self.store.put(Collection::Titles, doc).await {
                warn!(
                    topic_id = %batch.topic_id(),
                    written_titles = written,
                    "Partial write: topic stored, titles incomplete, abstracts unwritten"
                );
                return Err(EngineError::StoreWrite(e));
            }
        }

        for (written, doc) in batch.abstracts.iter().enumerate() {
            if let Err(e) = self.store.put(Collection::Abstracts, doc).await {
                warn!(
                    topic_id = %batch.topic_id(),
                    written_abstracts = written,
                    "Partial write: topic and titles stored, abstracts incomplete"
                );
                return Err(EngineError::StoreWrite(e));
            }
        }

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use paperdex_scraper::RawPaper;
    use paperdex_store::{DocumentType, HashEmbedder, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ===== Stubs =====

    /// Scripted source with a fetch-call counter.
    struct StubSource {
        papers: Vec<RawPaper>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn returning(papers: Vec<RawPaper>) -> Arc<Self> {
            Arc::new(Self {
                papers,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                papers: vec![],
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn fetch_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaperSource for StubSource {
        async fn fetch(&self, _topic: &str, max_results: usize) -> Result<Vec<RawPaper>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Http("stub source unreachable".to_string()));
            }
            Ok(self.papers.iter().take(max_results).cloned().collect())
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    /// Store that delegates to a MemoryStore but fails writes to one
    /// collection, for partial-write behavior.
    struct FlakyStore {
        inner: MemoryStore,
        fail_on: Collection,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn put(&self, collection: Collection, doc: &StoredDocument) -> Result<(), StoreError> {
            if collection == self.fail_on {
                return Err(StoreError::LanceDb("injected write failure".to_string()));
            }
            self.inner.put(collection, doc).await
        }

        async fn query(
            &self,
            collection: Collection,
            query_text: &str,
            limit: usize,
            topic_filter: Option<Uuid>,
        ) -> Result<Vec<StoredDocument>, StoreError> {
            self.inner.query(collection, query_text, limit, topic_filter).await
        }

        async fn list_all(&self, collection: Collection, limit: usize) -> Result<Vec<StoredDocument>, StoreError> {
            self.inner.list_all(collection, limit).await
        }
    }

    // ===== Helpers =====

    fn raw(title: &str, abstract_text: Option<&str>) -> RawPaper {
        RawPaper {
            title: title.to_string(),
            abstract_text: abstract_text.map(String::from),
            url: Some(format!("https://example.org/{title}")),
            code_url: None,
        }
    }

    fn three_papers() -> Vec<RawPaper> {
        vec![
            raw("Policy Gradients Revisited", Some("We revisit policy gradients.")),
            raw("Q-Learning at Scale", Some("Scaling value-based methods.")),
            raw("Model-Based Exploration", None),
        ]
    }

    fn memory_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(Arc::new(HashEmbedder::new())))
    }

    fn engine(store: Arc<MemoryStore>, source: Arc<StubSource>) -> RetrievalEngine {
        RetrievalEngine::new(store, source)
    }

    // ===== scrape_and_store =====

    #[tokio::test]
    async fn test_scrape_then_search_is_nonempty_and_bounded() {
        let store = memory_store();
        let eng = engine(store, StubSource::returning(three_papers()));

        let summary = eng.scrape_and_store("reinforcement learning", 3).await.unwrap();
        assert_eq!(summary.stored_papers, 3);

        let results = eng.search_stored("reinforcement learning", 3).await.unwrap();
        assert!(!results.titles.is_empty());
        assert!(results.titles.len() <= 3);
        assert!(results.abstracts.len() <= 3);
    }

    #[tokio::test]
    async fn test_pairing_invariant_holds_per_call() {
        let store = memory_store();
        let eng = engine(store.clone(), StubSource::returning(three_papers()));
        eng.scrape_and_store("reinforcement learning", 3).await.unwrap();

        let titles = store.list_all(Collection::Titles, 100).await.unwrap();
        let abstracts = store.list_all(Collection::Abstracts, 100).await.unwrap();
        let title_paper_ids: std::collections::HashSet<_> =
            titles.iter().map(|d| d.metadata.paper_id).collect();

        assert_eq!(abstracts.len(), titles.len());
        for doc in &abstracts {
            assert_eq!(doc.metadata.document_type, DocumentType::Abstract);
            assert!(title_paper_ids.contains(&doc.metadata.paper_id));
        }
    }

    #[tokio::test]
    async fn test_end_to_end_scenario_with_missing_abstract() {
        let store = memory_store();
        let eng = engine(store, StubSource::returning(three_papers()));

        let summary = eng.scrape_and_store("reinforcement learning", 3).await.unwrap();
        assert_eq!(summary.stored_papers, 3);

        let results = eng.search_stored("reinforcement learning", 3).await.unwrap();
        assert_eq!(results.titles.len(), 3);
        assert_eq!(results.abstracts.len(), 3);
        assert_eq!(
            results.abstracts.iter().filter(|d| d.text.is_empty()).count(),
            1,
            "the record without an abstract is stored with empty text"
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let store = memory_store();
        let eng = engine(store.clone(), StubSource::failing());

        let err = eng.scrape_and_store("anything", 5).await.unwrap_err();
        assert!(matches!(err, EngineError::Fetch(_)));
        assert_eq!(store.count(Collection::Topics), 0);
        assert_eq!(store.count(Collection::Titles), 0);
        assert_eq!(store.count(Collection::Abstracts), 0);
    }

    #[tokio::test]
    async fn test_scraping_twice_accumulates_topics() {
        let store = memory_store();
        let eng = engine(store.clone(), StubSource::returning(three_papers()));

        eng.scrape_and_store("reinforcement learning", 3).await.unwrap();
        eng.scrape_and_store("reinforcement learning", 3).await.unwrap();

        // Accumulate, never merge: two independent topic documents.
        assert_eq!(store.count(Collection::Topics), 2);
        assert_eq!(store.count(Collection::Titles), 6);
    }

    #[tokio::test]
    async fn test_zero_max_results_rejected() {
        let eng = engine(memory_store(), StubSource::returning(three_papers()));
        assert!(matches!(
            eng.scrape_and_store("rl", 0).await.unwrap_err(),
            EngineError::InvalidLimit
        ));
        assert!(matches!(
            eng.search_stored("rl", 0).await.unwrap_err(),
            EngineError::InvalidLimit
        ));
    }

    #[tokio::test]
    async fn test_partial_write_keeps_earlier_collections() {
        let flaky = Arc::new(FlakyStore {
            inner: MemoryStore::new(Arc::new(HashEmbedder::new())),
            fail_on: Collection::Abstracts,
        });
        let eng = RetrievalEngine::new(flaky.clone(), StubSource::returning(three_papers()));

        let err = eng.scrape_and_store("rl", 3).await.unwrap_err();
        assert!(matches!(err, EngineError::StoreWrite(_)));
        // No rollback: topic and titles remain persisted.
        assert_eq!(flaky.inner.count(Collection::Topics), 1);
        assert_eq!(flaky.inner.count(Collection::Titles), 3);
        assert_eq!(flaky.inner.count(Collection::Abstracts), 0);
    }

    // ===== search_stored =====

    #[tokio::test]
    async fn test_search_empty_store_is_no_match() {
        let eng = engine(memory_store(), StubSource::returning(vec![]));
        assert!(matches!(
            eng.search_stored("rl", 5).await.unwrap_err(),
            EngineError::NoMatch
        ));
    }

    #[tokio::test]
    async fn test_topic_match_is_similarity_not_equality() {
        let store = memory_store();
        let eng = engine(
            store,
            StubSource::returning(vec![raw("Residual Networks for Vision", Some("CNNs."))]),
        );
        eng.scrape_and_store("vision", 5).await.unwrap();

        let results = eng.search_stored("computer vision", 5).await.unwrap();
        assert_eq!(results.matched_topic, "vision");
        assert_eq!(results.titles.len(), 1);
        assert_eq!(results.titles[0].text, "Residual Networks for Vision");
    }

    // ===== get_or_scrape =====

    #[tokio::test]
    async fn test_get_or_scrape_cold_store_scrapes_once() {
        let source = StubSource::returning(three_papers());
        let store = memory_store();
        let eng = engine(store, source.clone());

        let out = eng.get_or_scrape("reinforcement learning", 3).await.unwrap();
        assert!(out.scraped);
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(out.results.titles.len(), 3);
    }

    #[tokio::test]
    async fn test_get_or_scrape_matches_scrape_then_search() {
        let papers = three_papers();

        // Flow A: explicit scrape followed by search.
        let eng_a = engine(memory_store(), StubSource::returning(papers.clone()));
        eng_a.scrape_and_store("reinforcement learning", 3).await.unwrap();
        let search_a = eng_a.search_stored("reinforcement learning", 3).await.unwrap();

        // Flow B: get_or_scrape on an empty store.
        let eng_b = engine(memory_store(), StubSource::returning(papers));
        let out_b = eng_b.get_or_scrape("reinforcement learning", 3).await.unwrap();

        assert!(out_b.scraped);
        assert_eq!(out_b.results.matched_topic, search_a.matched_topic);

        let titles = |docs: &[StoredDocument]| {
            let mut v: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
            v.sort();
            v
        };
        assert_eq!(titles(&out_b.results.titles), titles(&search_a.titles));
        assert_eq!(titles(&out_b.results.abstracts), titles(&search_a.abstracts));
    }

    #[tokio::test]
    async fn test_get_or_scrape_warm_store_skips_fetch() {
        let source = StubSource::returning(three_papers());
        let store = memory_store();
        let eng = engine(store, source.clone());

        eng.scrape_and_store("reinforcement learning", 3).await.unwrap();
        assert_eq!(source.fetch_count(), 1);

        let out = eng.get_or_scrape("reinforcement learning", 3).await.unwrap();
        assert!(!out.scraped);
        assert_eq!(source.fetch_count(), 1, "warm store must not trigger a fetch");
    }

    #[tokio::test]
    async fn test_get_or_scrape_combined_failure_carries_scrape_detail() {
        let eng = engine(memory_store(), StubSource::failing());

        let err = eng.get_or_scrape("rl", 3).await.unwrap_err();
        match err {
            EngineError::Combined { search, scrape } => {
                assert!(search.contains("No matching topics"));
                assert!(matches!(*scrape, EngineError::Fetch(_)));
            }
            other => panic!("expected Combined, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_or_scrape_empty_fetch_still_reports_scraped() {
        // The source is reachable but returns nothing: the scrape stores
        // a topic with no papers, so the re-search matches the topic and
        // returns empty sequences.
        let source = StubSource::returning(vec![]);
        let eng = engine(memory_store(), source.clone());

        let out = eng.get_or_scrape("rl", 3).await.unwrap();
        assert!(out.scraped);
        assert!(out.results.titles.is_empty());
        assert_eq!(source.fetch_count(), 1);
    }

    // ===== list_topics =====

    #[tokio::test]
    async fn test_list_topics_returns_stored_texts() {
        let store = memory_store();
        let eng = engine(store, StubSource::returning(three_papers()));

        eng.scrape_and_store("reinforcement learning", 3).await.unwrap();
        eng.scrape_and_store("computer vision", 3).await.unwrap();

        let mut topics = eng.list_topics(20).await.unwrap();
        topics.sort();
        assert_eq!(topics, vec!["computer vision", "reinforcement learning"]);
    }

    #[tokio::test]
    async fn test_list_topics_empty_store() {
        let eng = engine(memory_store(), StubSource::returning(vec![]));
        assert!(eng.list_topics(20).await.unwrap().is_empty());
    }
}
