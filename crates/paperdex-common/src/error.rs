use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaperdexError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Domain not in allowlist for URL {0}")]
    Blocked(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PaperdexError>;
