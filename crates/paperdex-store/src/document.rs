//! Persisted document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three independent partitions of the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Titles,
    Abstracts,
    Topics,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Titles => "titles",
            Collection::Abstracts => "abstracts",
            Collection::Topics => "topics",
        }
    }
}

/// What kind of text a document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Title,
    Abstract,
    Topic,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Title => "title",
            DocumentType::Abstract => "abstract",
            DocumentType::Topic => "topic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(DocumentType::Title),
            "abstract" => Some(DocumentType::Abstract),
            "topic" => Some(DocumentType::Topic),
            _ => None,
        }
    }
}

/// Cross-reference metadata attached to every document.
///
/// Title and abstract documents carry the `paper_id` of the record they
/// were derived from; topic documents have no paper and `paper_id` is
/// `None`. Cross-references are plain identifiers, never live pointers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMetadata {
    pub document_type: DocumentType,
    pub paper_id: Option<Uuid>,
    pub paper_url: Option<String>,
    pub code_url: Option<String>,
    pub topic_id: Uuid,
}

/// One indexable unit of text with attached metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: Uuid,
    pub text: String,
    pub metadata: DocMetadata,
    pub created_at: DateTime<Utc>,
}
