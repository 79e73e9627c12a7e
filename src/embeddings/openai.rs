//! Hosted embedding service reached over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{EmbeddingError, EmbeddingProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSIONS: usize = 1536;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI-compatible `/embeddings` endpoint client.
///
/// HTTP 429 responses and request timeouts surface as
/// [`EmbeddingError::RateLimited`] so the batch-embedding loop can retry
/// with backoff; everything else is [`EmbeddingError::Fatal`].
///
/// # Examples
///
/// ```rust,ignore
/// use passagesmith::embeddings::OpenAiEmbeddingProvider;
///
/// let provider = OpenAiEmbeddingProvider::from_env()?;
/// let vector = provider.embed_query("What are the core classes?").await?;
/// assert_eq!(vector.len(), 1536);
/// ```
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddingProvider {
    /// Creates a provider for the given key, model, and vector length.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Fatal`] when the HTTP client cannot be
    /// constructed.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| EmbeddingError::Fatal(err.to_string()))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        })
    }

    /// Builds a provider from the environment.
    ///
    /// Reads `OPENAI_API_KEY` (required) and `OPENAI_BASE_URL` (optional),
    /// loading a `.env` file first when one is present. Model defaults to
    /// `text-embedding-3-small` at 1536 dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Fatal`] when the API key is missing.
    pub fn from_env() -> Result<Self, EmbeddingError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EmbeddingError::Fatal("OPENAI_API_KEY is not set".to_string()))?;
        let mut provider = Self::new(api_key, DEFAULT_MODEL, DEFAULT_DIMENSIONS)?;
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            provider.base_url = base_url;
        }
        Ok(provider)
    }

    /// Overrides the endpoint base URL. Useful against mock servers and
    /// OpenAI-compatible gateways.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    EmbeddingError::RateLimited(format!("request timed out: {err}"))
                } else {
                    EmbeddingError::Fatal(err.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::RateLimited(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Fatal(format!(
                "unexpected status {status}: {body}"
            )));
        }

        let payload: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| EmbeddingError::Fatal(format!("undecodable response: {err}")))?;

        if payload.data.len() != texts.len() {
            return Err(EmbeddingError::Fatal(format!(
                "expected {} vectors, received {}",
                texts.len(),
                payload.data.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = payload.data.into_iter().map(|row| row.embedding).collect();
        if let Some(first) = vectors.first() {
            if first.len() != self.dimensions {
                return Err(EmbeddingError::Fatal(format!(
                    "model returned {}-dimensional vectors, expected {}",
                    first.len(),
                    self.dimensions
                )));
            }
        }

        Ok(vectors)
    }
}
