//! Crate-wide error type.

use thiserror::Error;

use crate::embeddings::EmbeddingError;

/// Errors surfaced by corpus ingestion, storage, and retrieval.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Filesystem failure while reading or writing corpus artifacts.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend failure (connection, schema, or query).
    #[error("storage failure: {0}")]
    Storage(String),

    /// A configuration value is out of range or missing.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An ingestion line could not be decoded.
    ///
    /// Streaming decoders skip such lines and continue; this variant is
    /// returned only from strict entry points.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Passage records and embedding vectors are out of step.
    #[error("corpus alignment error: {0}")]
    Alignment(String),

    /// The embedding collaborator failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
