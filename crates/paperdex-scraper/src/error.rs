//! Fetcher error types.

use thiserror::Error;

/// A whole-fetch failure. Per-record problems never raise this — they
/// degrade to absent fields on the record instead.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(String),

    #[error("Source returned status {0}")]
    Status(u16),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Unparseable listing page: {0}")]
    Parse(String),

    #[error("Invalid source URL: {0}")]
    Url(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.to_string())
    }
}

impl From<paperdex_common::PaperdexError> for FetchError {
    fn from(err: paperdex_common::PaperdexError) -> Self {
        FetchError::Http(err.to_string())
    }
}
