//! paperdex-engine — Normalization and the get-or-scrape retrieval policy.
//!
//! The engine is the only component with real decision logic: it decides
//! whether a query is served from the document store or refreshed from
//! the live source, and it keeps the three collections (titles,
//! abstracts, topics) consistent enough to cross-reference.
//!
//! Four operations, exposed as a plain function-call contract any
//! transport can bind to:
//!
//! - [`RetrievalEngine::scrape_and_store`] — fetch, normalize, persist
//! - [`RetrievalEngine::search_stored`] — cache-only topic search
//! - [`RetrievalEngine::get_or_scrape`] — resilient store-then-refresh
//! - [`RetrievalEngine::list_topics`] — enumerate stored topics

pub mod engine;
pub mod normalize;

pub use engine::{
    EngineError, GetOrScrapeResults, RetrievalEngine, ScrapeSummary, SearchResults,
};
pub use normalize::{normalize_papers, NormalizedBatch};
