//! LanceDB document store.
//!
//! Embedded vector database, no external server. Each collection maps to
//! one Lance table; tables are created empty on first access so callers
//! never see a "collection absent" failure. Documents are embedded at
//! write time and ranked by the backend's native vector search at query
//! time.

use std::path::Path;
use std::sync::Arc;

use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::StreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::table::Table;
use tracing::debug;
use uuid::Uuid;

use crate::document::{Collection, DocMetadata, DocumentType, StoredDocument};
use crate::embed::Embedder;
use crate::error::{Result, StoreError};
use crate::store::DocumentStore;

pub struct LanceStore {
    conn: Connection,
    embedder: Arc<dyn Embedder>,
}

impl LanceStore {
    /// Open or create a store at the given path.
    pub async fn open(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        if !path.as_ref().exists() {
            std::fs::create_dir_all(path.as_ref())?;
        }
        let conn = lancedb::connect(&path_str).execute().await?;
        Ok(Self { conn, embedder })
    }

    /// Open the table behind a collection, creating it empty if absent.
    async fn table(&self, collection: Collection) -> Result<Table> {
        let name = collection.as_str();
        let tables = self.conn.table_names().execute().await?;
        if !tables.contains(&name.to_string()) {
            debug!(collection = name, "Creating empty collection");
            let schema = document_schema(self.embedder.dimension());
            let empty_iter = RecordBatchIterator::new(vec![], schema);
            self.conn.create_table(name, empty_iter).execute().await?;
        }
        Ok(self.conn.open_table(name).execute().await?)
    }
}

#[async_trait]
impl DocumentStore for LanceStore {
    async fn put(&self, collection: Collection, doc: &StoredDocument) -> Result<()> {
        let table = self.table(collection).await?;
        let embedding = self.embedder.embed(&doc.text).await?;

        // Idempotent upsert: drop any row with the same id first.
        table.delete(&format!("id = '{}'", doc.id)).await?;

        let record = document_to_record(doc, &embedding, self.embedder.dimension())?;
        let schema = record.schema();
        let iter = RecordBatchIterator::new(vec![Ok(record)], schema);
        table.add(iter).execute().await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        query_text: &str,
        limit: usize,
        topic_filter: Option<Uuid>,
    ) -> Result<Vec<StoredDocument>> {
        let table = self.table(collection).await?;
        let query_vec = self.embedder.embed(query_text).await?;

        let mut query = table.vector_search(query_vec)?;
        if let Some(topic_id) = topic_filter {
            query = query.only_if(format!("topic_id = '{}'", topic_id));
        }
        let mut stream = query.limit(limit).execute().await?;

        let mut docs = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                docs.push(record_to_document(&batch, i)?);
            }
        }
        Ok(docs)
    }

    async fn list_all(&self, collection: Collection, limit: usize) -> Result<Vec<StoredDocument>> {
        let table = self.table(collection).await?;
        let mut stream = table.query().limit(limit).execute().await?;

        let mut docs = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                docs.push(record_to_document(&batch, i)?);
            }
        }
        Ok(docs)
    }
}

// ── Arrow conversion ──────────────────────────────────────────────────────────

fn document_schema(dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("document_type", DataType::Utf8, false),
        Field::new("paper_id", DataType::Utf8, true),
        Field::new("paper_url", DataType::Utf8, true),
        Field::new("code_url", DataType::Utf8, true),
        Field::new("topic_id", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, false)), dim as i32),
            true,
        ),
    ]))
}

fn document_to_record(doc: &StoredDocument, embedding: &[f32], dim: usize) -> Result<RecordBatch> {
    let schema = document_schema(dim);

    let id = StringArray::from(vec![doc.id.to_string()]);
    let text = StringArray::from(vec![doc.text.as_str()]);
    let document_type = StringArray::from(vec![doc.metadata.document_type.as_str()]);
    let paper_id = StringArray::from(vec![doc.metadata.paper_id.map(|p| p.to_string())]);
    let paper_url = StringArray::from(vec![doc.metadata.paper_url.as_deref()]);
    let code_url = StringArray::from(vec![doc.metadata.code_url.as_deref()]);
    let topic_id = StringArray::from(vec![doc.metadata.topic_id.to_string()]);
    let created_at = StringArray::from(vec![doc.created_at.to_rfc3339()]);

    let values = Float32Array::from(embedding.to_vec());
    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let embedding = FixedSizeListArray::try_new(field, dim as i32, Arc::new(values), None)
        .map_err(|e| StoreError::Arrow(e.to_string()))?;

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(text),
            Arc::new(document_type),
            Arc::new(paper_id),
            Arc::new(paper_url),
            Arc::new(code_url),
            Arc::new(topic_id),
            Arc::new(created_at),
            Arc::new(embedding),
        ],
    )
    .map_err(|e| StoreError::Arrow(e.to_string()))
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StoreError::InvalidRecord(format!("missing column '{name}'")))
}

fn get_string(batch: &RecordBatch, name: &str, row: usize) -> Result<String> {
    Ok(string_col(batch, name)?.value(row).to_string())
}

fn get_opt_string(batch: &RecordBatch, name: &str, row: usize) -> Result<Option<String>> {
    let arr = string_col(batch, name)?;
    Ok(if arr.is_null(row) { None } else { Some(arr.value(row).to_string()) })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidRecord(format!("bad uuid '{s}': {e}")))
}

fn record_to_document(batch: &RecordBatch, row: usize) -> Result<StoredDocument> {
    let document_type = {
        let raw = get_string(batch, "document_type", row)?;
        DocumentType::parse(&raw)
            .ok_or_else(|| StoreError::InvalidRecord(format!("unknown document_type '{raw}'")))?
    };

    Ok(StoredDocument {
        id: parse_uuid(&get_string(batch, "id", row)?)?,
        text: get_string(batch, "text", row)?,
        metadata: DocMetadata {
            document_type,
            paper_id: get_opt_string(batch, "paper_id", row)?
                .map(|s| parse_uuid(&s))
                .transpose()?,
            paper_url: get_opt_string(batch, "paper_url", row)?,
            code_url: get_opt_string(batch, "code_url", row)?,
            topic_id: parse_uuid(&get_string(batch, "topic_id", row)?)?,
        },
        created_at: chrono::DateTime::parse_from_rfc3339(&get_string(batch, "created_at", row)?)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_doc() -> StoredDocument {
        StoredDocument {
            id: Uuid::new_v4(),
            text: "Attention is all you need".to_string(),
            metadata: DocMetadata {
                document_type: DocumentType::Title,
                paper_id: Some(Uuid::new_v4()),
                paper_url: Some("https://arxiv.org/abs/1706.03762".to_string()),
                code_url: None,
                topic_id: Uuid::new_v4(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_roundtrip() {
        let doc = sample_doc();
        let embedding = vec![0.5f32; 8];
        let record = document_to_record(&doc, &embedding, 8).unwrap();
        let back = record_to_document(&record, 0).unwrap();

        assert_eq!(back.id, doc.id);
        assert_eq!(back.text, doc.text);
        assert_eq!(back.metadata.document_type, DocumentType::Title);
        assert_eq!(back.metadata.paper_id, doc.metadata.paper_id);
        assert_eq!(back.metadata.paper_url, doc.metadata.paper_url);
        assert_eq!(back.metadata.code_url, None);
        assert_eq!(back.metadata.topic_id, doc.metadata.topic_id);
    }

    #[test]
    fn test_record_roundtrip_topic_document() {
        let topic_id = Uuid::new_v4();
        let doc = StoredDocument {
            id: topic_id,
            text: "reinforcement learning".to_string(),
            metadata: DocMetadata {
                document_type: DocumentType::Topic,
                paper_id: None,
                paper_url: None,
                code_url: None,
                topic_id,
            },
            created_at: Utc::now(),
        };
        let record = document_to_record(&doc, &vec![0.0f32; 8], 8).unwrap();
        let back = record_to_document(&record, 0).unwrap();
        assert_eq!(back.metadata.document_type, DocumentType::Topic);
        assert_eq!(back.metadata.paper_id, None);
        assert_eq!(back.metadata.topic_id, topic_id);
    }
}
