//! Embedding backends — turn document text into the vectors the store
//! ranks by.
//!
//! Two backends:
//!   - OpenAI  (text-embedding-3-small / text-embedding-3-large)
//!   - Local   (deterministic FNV feature hashing — no network)
//!
//! The local backend exists so the pipeline runs with zero credentials
//! and so tests are hermetic; its vectors are crude but stable, which is
//! all the topic-similarity policy needs.

use async_trait::async_trait;
use paperdex_common::HttpClient;

use crate::error::StoreError;

/// Produces a fixed-dimension vector for a piece of text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError>;

    fn dimension(&self) -> usize;
}

// ── OpenAI ────────────────────────────────────────────────────────────────────

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Default dimension of text-embedding-3-small.
pub const OPENAI_SMALL_DIM: usize = 1536;

pub struct OpenAiEmbedder {
    client: HttpClient,
    api_key: String,
    model: String,
    dim: usize,
}

impl OpenAiEmbedder {
    pub fn new(client: HttpClient, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
            dim: OPENAI_SMALL_DIM,
        }
    }

    pub fn with_dimension(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let body = serde_json::json!({
            "model": &self.model,
            "input": [text],
        });
        let resp: serde_json::Value = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .map_err(|e| StoreError::Embedding(e.to_string()))?
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Embedding(e.to_string()))?
            .json()
            .await
            .map_err(|e| StoreError::Embedding(e.to_string()))?;

        let vec: Vec<f32> = resp["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| StoreError::Embedding("malformed embeddings response".to_string()))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if vec.len() != self.dim {
            return Err(StoreError::Embedding(format!(
                "expected {}-dim vector, got {}",
                self.dim,
                vec.len()
            )));
        }
        Ok(l2_normalize(vec))
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

// ── Local feature hashing ─────────────────────────────────────────────────────

/// Default dimension of the local embedder.
pub const HASH_DIM: usize = 256;

/// Deterministic embedder: hashes word unigrams and character trigrams
/// into a fixed number of buckets, then L2-normalizes. Texts sharing
/// vocabulary land close under cosine, which is enough for approximate
/// topic matching.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dim: HASH_DIM }
    }

    pub fn with_dimension(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let mut v = vec![0f32; self.dim];
        let normalised = text.to_lowercase();

        for word in normalised.split_whitespace() {
            let bucket = (fnv64(word.as_bytes()) as usize) % self.dim;
            v[bucket] += 1.0;

            // Character trigrams make near-miss vocabulary overlap
            // ("vision" vs "visual") register as partial similarity.
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let gram: String = window.iter().collect();
                let bucket = (fnv64(gram.as_bytes()) as usize) % self.dim;
                v[bucket] += 1.0;
            }
        }

        Ok(l2_normalize(v))
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// FNV-1a 64-bit hash.
fn fnv64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

fn l2_normalize(v: Vec<f32>) -> Vec<f32> {
    let norm = l2_norm(&v);
    v.into_iter().map(|x| x / norm).collect()
}

fn l2_norm(v: &[f32]) -> f32 {
    let s: f32 = v.iter().map(|x| x * x).sum();
    s.sqrt().max(1e-10)
}

/// Cosine similarity of two equal-length vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (l2_norm(a) * l2_norm(b))
}
