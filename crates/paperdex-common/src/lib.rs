//! paperdex-common — Shared error type, HTTP client, and configuration
//! used across all paperdex crates.

pub mod config;
pub mod error;
pub mod http;

pub use config::{AppConfig, EmbedderKind, SourceKind};
pub use error::PaperdexError;
pub use http::HttpClient;
