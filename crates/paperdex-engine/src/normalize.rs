//! Normalization: one fetch result set into persistable documents.
//!
//! Every pass mints fresh identifiers — a topic id for the batch, and
//! per record one paper id shared by the derived title/abstract pair.
//! There is no deduplication against previously stored papers:
//! re-scraping a topic accumulates new rows rather than merging.

use chrono::Utc;
use paperdex_scraper::RawPaper;
use paperdex_store::{DocMetadata, DocumentType, StoredDocument};
use uuid::Uuid;

/// The three document sets produced from one fetch.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub topic: StoredDocument,
    pub titles: Vec<StoredDocument>,
    pub abstracts: Vec<StoredDocument>,
}

impl NormalizedBatch {
    pub fn topic_id(&self) -> Uuid {
        self.topic.metadata.topic_id
    }

    /// Number of papers in the batch (title/abstract pairs).
    pub fn paper_count(&self) -> usize {
        self.titles.len()
    }
}

/// Build the topic document and matched title/abstract pairs for one
/// fetch result set.
///
/// A record with no abstract still yields an abstract document with
/// empty text, so every abstract's `paper_id` has a title counterpart.
pub fn normalize_papers(topic_text: &str, papers: &[RawPaper]) -> NormalizedBatch {
    let topic_id = Uuid::new_v4();
    let now = Utc::now();

    let topic = StoredDocument {
        id: topic_id,
        text: topic_text.to_string(),
        metadata: DocMetadata {
            document_type: DocumentType::Topic,
            paper_id: None,
            paper_url: None,
            code_url: None,
            topic_id,
        },
        created_at: now,
    };

    let mut titles = Vec::with_capacity(papers.len());
    let mut abstracts = Vec::with_capacity(papers.len());

    for paper in papers {
        let paper_id = Uuid::new_v4();
        let metadata = DocMetadata {
            document_type: DocumentType::Title,
            paper_id: Some(paper_id),
            paper_url: paper.url.clone(),
            code_url: paper.code_url.clone(),
            topic_id,
        };

        titles.push(StoredDocument {
            id: Uuid::new_v4(),
            text: paper.title.clone(),
            metadata: metadata.clone(),
            created_at: now,
        });

        abstracts.push(StoredDocument {
            id: Uuid::new_v4(),
            text: paper.abstract_text.clone().unwrap_or_default(),
            metadata: DocMetadata {
                document_type: DocumentType::Abstract,
                ..metadata
            },
            created_at: now,
        });
    }

    NormalizedBatch {
        topic,
        titles,
        abstracts,
    }
}
