//! Curated listing site client (paperswithcode.com).
//!
//! The listing is page-scoped, not topic-scoped: the trending or latest
//! page is fetched and every `/paper/` anchor becomes a candidate. Each
//! paper page is then fetched for its abstract and code-repository link;
//! a failed per-paper fetch leaves those fields absent and the fetch
//! carries on.

use async_trait::async_trait;
use paperdex_common::HttpClient;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

use super::PaperSource;
use crate::error::FetchError;
use crate::models::{PageSelector, RawPaper};

const LISTING_BASE_URL: &str = "https://paperswithcode.com";

pub struct ListingClient {
    client: HttpClient,
    base_url: String,
    page: PageSelector,
}

impl ListingClient {
    pub fn new(client: HttpClient, page: PageSelector) -> Self {
        Self {
            client,
            base_url: LISTING_BASE_URL.to_string(),
            page,
        }
    }
}

#[async_trait]
impl PaperSource for ListingClient {
    #[instrument(skip(self))]
    async fn fetch(&self, _topic: &str, max_results: usize) -> Result<Vec<RawPaper>, FetchError> {
        let page_url = format!("{}{}", self.base_url, self.page.as_path());
        let resp = self.client.get(&page_url)?.send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await?;

        let anchors = parse_listing(&body, &self.base_url);
        if anchors.is_empty() {
            return Err(FetchError::Parse(format!(
                "no paper anchors found on {page_url}"
            )));
        }
        debug!(count = anchors.len(), page = ?self.page, "Listing page parsed");

        let mut papers = Vec::new();
        for (title, url) in anchors.into_iter().take(max_results) {
            let (abstract_text, code_url) = match self.fetch_paper_page(&url).await {
                Ok(details) => details,
                Err(e) => {
                    warn!(url = %url, error = %e, "Paper page fetch failed, keeping bare record");
                    (None, None)
                }
            };
            papers.push(RawPaper {
                title,
                abstract_text,
                url: Some(url),
                code_url,
            });
        }

        Ok(papers)
    }

    fn name(&self) -> &'static str {
        "listing"
    }
}

impl ListingClient {
    /// Fetch one paper page and pull out its abstract and code link.
    async fn fetch_paper_page(&self, url: &str) -> Result<(Option<String>, Option<String>), FetchError> {
        let resp = self.client.get(url)?.send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await?;
        Ok(extract_paper_details(&body))
    }
}

/// Collect `(title, absolute_url)` pairs from `/paper/` anchors on a
/// listing page.
fn parse_listing(html: &str, base_url: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href*='/paper/']").unwrap();

    document
        .select(&selector)
        .filter_map(|a| {
            let title: String = a.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                // Thumbnail anchors wrap images, not the title text.
                return None;
            }
            let href = a.value().attr("href")?;
            let url = if href.starts_with('/') {
                format!("{base_url}{href}")
            } else {
                href.to_string()
            };
            Some((title, url))
        })
        .collect()
}

/// Extract the abstract paragraph and the first code-repository link
/// from a paper page. Either may be absent.
fn extract_paper_details(html: &str) -> (Option<String>, Option<String>) {
    let document = Html::parse_document(html);

    let abstract_selector = Selector::parse("div.paper-abstract p").unwrap();
    let abstract_text = document
        .select(&abstract_selector)
        .next()
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty());

    let code_selector = Selector::parse("a[href*='github.com']").unwrap();
    let code_url = document
        .select(&code_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(String::from);

    (abstract_text, code_url)
}
