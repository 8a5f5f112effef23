//! Data models for fetched papers.

use serde::{Deserialize, Serialize};

/// Placeholder shown when a record has no abstract.
pub const NO_ABSTRACT: &str = "No abstract";

/// Placeholder shown when a record has no code-repository link.
pub const NO_CODE_LINK: &str = "No code link";

/// A raw paper record as returned by one source, before normalization.
///
/// Only the title is guaranteed: abstract, paper URL and code URL may be
/// absent depending on what the source exposed for that record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPaper {
    pub title: String,
    pub abstract_text: Option<String>,
    pub url: Option<String>,
    pub code_url: Option<String>,
}

impl RawPaper {
    /// Single display line with guaranteed-non-empty abstract/code text,
    /// for consumers that cannot handle absent fields.
    pub fn display_line(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.abstract_text.as_deref().unwrap_or(NO_ABSTRACT),
            self.code_url.as_deref().unwrap_or(NO_CODE_LINK),
        )
    }
}

/// Which page of the curated listing site to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSelector {
    Trending,
    Latest,
}

impl PageSelector {
    /// Path under the listing site's base URL.
    pub fn as_path(&self) -> &'static str {
        match self {
            PageSelector::Trending => "/",
            PageSelector::Latest => "/latest",
        }
    }
}
