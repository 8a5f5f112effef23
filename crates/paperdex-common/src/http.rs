use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::PaperdexError;

/// Hard ceiling on the request timeout. The legacy deployments ran with
/// timeouts of up to ten minutes; anything above this is clamped.
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Default request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// An allowlist-capped HTTP client: requests are only permitted to the
/// hosts the scraping pipeline is expected to talk to.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl HttpClient {
    /// Creates a client with the default source allowlist and timeout.
    pub fn new() -> Result<Self, PaperdexError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a caller-supplied timeout, clamped to
    /// [`MAX_TIMEOUT_SECS`].
    pub fn with_timeout(timeout: Duration) -> Result<Self, PaperdexError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "paperswithcode.com", // curated listing site
            "export.arxiv.org",   // arXiv search API
            "api.openai.com",     // embedding backend
            "localhost",          // local embedding endpoints
            "127.0.0.1",          // localhost alt
        ];
        for d in domains {
            allowlist.insert(d.to_string());
        }

        let timeout = timeout.min(Duration::from_secs(MAX_TIMEOUT_SECS));
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("paperdex/", env!("CARGO_PKG_VERSION"), " (research)"))
            .build()?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current allowlist.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Exposes the inner `reqwest::Client` builder pattern for GET requests.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, PaperdexError> {
        if !self.is_allowed(url) {
            return Err(PaperdexError::Blocked(url.to_string()));
        }
        Ok(self.client.get(url))
    }

    /// Exposes the inner `reqwest::Client` builder pattern for POST requests.
    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, PaperdexError> {
        if !self.is_allowed(url) {
            return Err(PaperdexError::Blocked(url.to_string()));
        }
        Ok(self.client.post(url))
    }
}
