//! paperdex-store — Document store adapter.
//!
//! Three topic-partitioned collections (titles, abstracts, topics) of
//! similarity-searchable text documents. The store contract is small:
//! idempotent upsert, similarity query, and full listing. Collections
//! are created lazily on first access — "collection absent" is healed,
//! never surfaced as an error.
//!
//! Similarity itself is delegated to the backend: documents are embedded
//! at write time via an [`Embedder`] and ranked by the backend at query
//! time. Two backends ship here: an embedded LanceDB database
//! ([`LanceStore`]) and an in-memory brute-force store ([`MemoryStore`]).

pub mod document;
pub mod embed;
pub mod error;
pub mod lance;
pub mod memory;
pub mod store;

pub use document::{Collection, DocMetadata, DocumentType, StoredDocument};
pub use embed::{Embedder, HashEmbedder, OpenAiEmbedder};
pub use error::{Result, StoreError};
pub use lance::LanceStore;
pub use memory::MemoryStore;
pub use store::DocumentStore;
