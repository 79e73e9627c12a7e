//! Embedding-service collaborators.
//!
//! The embedding model itself is opaque to this crate: a provider turns a
//! batch of texts into fixed-length vectors, nothing more. Named
//! implementations stand behind the [`EmbeddingProvider`] trait:
//!
//! * [`openai::OpenAiEmbeddingProvider`] — hosted HTTP service.
//! * [`HashEmbeddingProvider`] — deterministic offline vectors for tests
//!   and demos.
//!
//! Failures are typed: [`EmbeddingError::RateLimited`] is retryable and
//! drives the batch-embedding backoff loop; [`EmbeddingError::Fatal`] is
//! not.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiEmbeddingProvider;

/// Errors from an embedding-service collaborator.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The service throttled the request (HTTP 429) or timed out.
    /// Safe to retry after a delay.
    #[error("embedding service throttled the request: {0}")]
    RateLimited(String),

    /// A non-transient failure: bad credentials, malformed response,
    /// dimension mismatch. Retrying will not help.
    #[error("embedding service failure: {0}")]
    Fatal(String),
}

impl EmbeddingError {
    /// Whether a retry with backoff is worthwhile.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Opaque `text → fixed-length vector` capability.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier recorded alongside stored documents and checkpoints.
    fn model_name(&self) -> &str;

    /// Length of every vector this provider produces.
    fn dimensions(&self) -> usize;

    /// Embeds a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Fatal("provider returned no vector".to_string()))
    }
}

/// Deterministic hash-based vectors, no network required.
///
/// Identical text always maps to the identical vector, which makes
/// pipelines exercising chunking, storage, and retrieval reproducible
/// without an embedding service. The vectors carry no semantic signal.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Creates a provider emitting vectors of the given length.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn model_name(&self) -> &str {
        "hash-embedding"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| hash_to_vec(text, self.dimensions))
            .collect())
    }
}

fn hash_to_vec(text: &str, dimensions: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..dimensions)
        .map(|i| {
            let bits = seed.rotate_left((i as u32 % 8) * 8) ^ ((i as u64) << 24);
            (bits as f32) / u32::MAX as f32
        })
        .collect()
}
