//! Store error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("LanceDB error: {0}")]
    LanceDb(String),

    #[error("Arrow error: {0}")]
    Arrow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl From<lancedb::Error> for StoreError {
    fn from(err: lancedb::Error) -> Self {
        StoreError::LanceDb(err.to_string())
    }
}

impl From<arrow_schema::ArrowError> for StoreError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        StoreError::Arrow(err.to_string())
    }
}
