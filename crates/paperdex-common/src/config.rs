//! Environment-driven application configuration.

use std::env;
use std::time::Duration;

use crate::error::PaperdexError;
use crate::http;

/// Which backing source the fetcher scrapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// arXiv topic-search API (Atom feed).
    Arxiv,
    /// Curated listing site, trending page.
    ListingTrending,
    /// Curated listing site, latest page.
    ListingLatest,
}

impl SourceKind {
    pub fn parse(s: &str) -> Result<Self, PaperdexError> {
        match s.to_lowercase().as_str() {
            "arxiv" => Ok(Self::Arxiv),
            "trending" => Ok(Self::ListingTrending),
            "latest" => Ok(Self::ListingLatest),
            other => Err(PaperdexError::Config(format!(
                "unsupported source '{other}' (expected arxiv, trending or latest)"
            ))),
        }
    }
}

/// Which embedding backend the document store uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Deterministic local feature-hashing embedder; no network.
    Local,
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    OpenAi { api_key: String, model: String },
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the embedded document store.
    pub data_dir: String,
    /// HTTP bind address for the transport layer.
    pub bind_addr: String,
    /// Source the fetcher pulls papers from.
    pub source: SourceKind,
    /// Embedding backend.
    pub embedder: EmbedderKind,
    /// Timeout applied to all outbound requests.
    pub http_timeout: Duration,
    /// Topics the background refresh task re-scrapes, if any.
    pub refresh_topics: Vec<String>,
    /// Refresh interval in hours; `None` disables the task.
    pub refresh_hours: Option<u64>,
}

impl AppConfig {
    /// Loads configuration from environment variables (a `.env` file is
    /// honoured when the binary calls `dotenvy::dotenv()` first).
    pub fn from_env() -> Result<Self, PaperdexError> {
        let data_dir =
            env::var("PAPERDEX_DATA_DIR").unwrap_or_else(|_| "./data/paperdex".to_string());
        let bind_addr =
            env::var("PAPERDEX_ADDR").unwrap_or_else(|_| "127.0.0.1:9001".to_string());

        let source_str = env::var("PAPERDEX_SOURCE").unwrap_or_else(|_| "arxiv".to_string());
        let source = SourceKind::parse(&source_str)?;

        let embedder = match env::var("PAPERDEX_EMBEDDER")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => EmbedderKind::Local,
            "openai" => {
                let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
                    PaperdexError::Config(
                        "OPENAI_API_KEY is required when PAPERDEX_EMBEDDER=openai".to_string(),
                    )
                })?;
                let model = env::var("PAPERDEX_EMBED_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string());
                EmbedderKind::OpenAi { api_key, model }
            }
            other => {
                return Err(PaperdexError::Config(format!(
                    "unsupported embedder '{other}' (expected local or openai)"
                )))
            }
        };

        let timeout_secs = env::var("PAPERDEX_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(http::DEFAULT_TIMEOUT_SECS)
            .min(http::MAX_TIMEOUT_SECS);

        let refresh_topics = env::var("PAPERDEX_REFRESH_TOPICS")
            .map(|v| parse_topic_list(&v))
            .unwrap_or_default();
        let refresh_hours = env::var("PAPERDEX_REFRESH_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|h| *h > 0);

        Ok(Self {
            data_dir,
            bind_addr,
            source,
            embedder,
            http_timeout: Duration::from_secs(timeout_secs),
            refresh_topics,
            refresh_hours,
        })
    }
}

/// Split a comma-separated topic list, dropping empty segments.
fn parse_topic_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
