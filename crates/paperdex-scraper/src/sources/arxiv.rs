//! arXiv search API client.
//!
//! Endpoint: https://export.arxiv.org/api/query (Atom feed)
//!
//! One GET per fetch: `search_query=all:<topic>&start=0&max_results=<n>`.
//! Entries are parsed for `title`, `summary` and `link` elements; the PDF
//! link is preferred, the alternate HTML link is the fallback.

use async_trait::async_trait;
use paperdex_common::HttpClient;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument, warn};
use url::Url;

use super::PaperSource;
use crate::error::FetchError;
use crate::models::RawPaper;

const ARXIV_QUERY_URL: &str = "https://export.arxiv.org/api/query";

pub struct ArxivClient {
    client: HttpClient,
    base_url: String,
}

impl ArxivClient {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: ARXIV_QUERY_URL.to_string(),
        }
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    #[instrument(skip(self))]
    async fn fetch(&self, topic: &str, max_results: usize) -> Result<Vec<RawPaper>, FetchError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("search_query", format!("all:{topic}")),
                ("start", "0".to_string()),
                ("max_results", max_results.to_string()),
            ],
        )
        .map_err(|e| FetchError::Url(e.to_string()))?;

        let resp = self.client.get(url.as_str())?.send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        let xml = resp.text().await?;

        let papers = parse_arxiv_atom(&xml)?;
        debug!(count = papers.len(), "arXiv query returned entries");
        Ok(papers)
    }

    fn name(&self) -> &'static str {
        "arxiv"
    }
}

/// Parse an arXiv Atom feed into raw paper records.
/// Handles the `<feed><entry>` structure; feed-level elements (the feed
/// has its own `<title>`) are ignored.
fn parse_arxiv_atom(xml: &str) -> Result<Vec<RawPaper>, FetchError> {
    let mut papers = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // State machine for XML parsing
    let mut current: Option<RawPaper> = None;
    let mut pdf_url: Option<String> = None;
    let mut alt_url: Option<String> = None;
    let mut in_title = false;
    let mut in_summary = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"entry" => {
                    current = Some(RawPaper {
                        title: String::new(),
                        abstract_text: None,
                        url: None,
                        code_url: None,
                    });
                    pdf_url = None;
                    alt_url = None;
                }
                b"title" if current.is_some() => in_title = true,
                b"summary" if current.is_some() => in_summary = true,
                b"link" if current.is_some() => {
                    read_link(e, &mut pdf_url, &mut alt_url);
                }
                _ => {}
            },
            // Atom links are usually self-closing
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"link" && current.is_some() {
                    read_link(e, &mut pdf_url, &mut alt_url);
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut p) = current {
                    if in_title {
                        p.title = normalize_ws(&text);
                    }
                    if in_summary {
                        p.abstract_text = Some(normalize_ws(&text)).filter(|s| !s.is_empty());
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"title" => in_title = false,
                b"summary" => in_summary = false,
                b"entry" => {
                    if let Some(mut p) = current.take() {
                        p.url = pdf_url.take().or_else(|| alt_url.take());
                        if !p.title.is_empty() {
                            papers.push(p);
                        } else {
                            warn!("Skipping entry with empty title");
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(FetchError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(papers)
}

/// Pull the href out of a `<link>` element, classifying it as the PDF
/// link or the alternate HTML link.
fn read_link(e: &quick_xml::events::BytesStart<'_>, pdf_url: &mut Option<String>, alt_url: &mut Option<String>) {
    let mut href = None;
    let mut title = None;
    let mut rel = None;
    let mut link_type = None;

    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().unwrap_or_default().to_string();
        match attr.key.as_ref() {
            b"href" => href = Some(value),
            b"title" => title = Some(value),
            b"rel" => rel = Some(value),
            b"type" => link_type = Some(value),
            _ => {}
        }
    }

    let Some(href) = href else { return };
    if title.as_deref() == Some("pdf") && link_type.as_deref() == Some("application/pdf") {
        *pdf_url = Some(href);
    } else if rel.as_deref() == Some("alternate") && link_type.as_deref() == Some("text/html") {
        *alt_url = Some(href);
    }
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: search_query=all:reinforcement learning</title>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <title>Deep Reinforcement
      Learning at Scale</title>
    <summary>We study large-scale RL.</summary>
    <link href="http://arxiv.org/abs/2101.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2101.00001v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2101.00002v1</id>
    <title>Offline Policy Evaluation</title>
    <link href="http://arxiv.org/abs/2101.00002v1" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_atom_entries() {
        let papers = parse_arxiv_atom(FEED).unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].title, "Deep Reinforcement Learning at Scale");
        assert_eq!(papers[0].abstract_text.as_deref(), Some("We study large-scale RL."));
    }

    #[test]
    fn test_pdf_link_preferred() {
        let papers = parse_arxiv_atom(FEED).unwrap();
        assert_eq!(papers[0].url.as_deref(), Some("http://arxiv.org/pdf/2101.00001v1"));
    }

    #[test]
    fn test_missing_summary_degrades_to_none() {
        let papers = parse_arxiv_atom(FEED).unwrap();
        assert_eq!(papers[1].abstract_text, None);
        assert_eq!(papers[1].url.as_deref(), Some("http://arxiv.org/abs/2101.00002v1"));
        // arXiv never exposes a code link
        assert_eq!(papers[1].code_url, None);
    }

    #[test]
    fn test_feed_title_not_mistaken_for_entry() {
        let papers = parse_arxiv_atom(FEED).unwrap();
        assert!(papers.iter().all(|p| !p.title.contains("ArXiv Query")));
    }

    #[test]
    fn test_empty_feed_yields_no_papers() {
        let xml = r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_arxiv_atom(xml).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        let xml = "<feed><entry><title>Broken</summary></entry></feed>";
        assert!(parse_arxiv_atom(xml).is_err());
    }
}
