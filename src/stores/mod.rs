//! Vector storage for embedded passages.
//!
//! The [`VectorStore`] trait abstracts over storage backends so retrieval
//! code never touches a concrete database:
//!
//! ```text
//!                    ┌──────────────────┐
//!                    │ VectorStore trait│
//!                    │  (async upsert/  │
//!                    │   search/count)  │
//!                    └────────┬─────────┘
//!                             │
//!                    ┌────────▼─────────┐
//!                    │      SQLite      │
//!                    │    sqlite-vec    │
//!                    └──────────────────┘
//! ```
//!
//! Rows decode into the typed structs below at the store boundary; no
//! loosely shaped maps escape this module.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chunking::dedup::content_id;
use crate::types::CorpusError;

pub use sqlite::SqliteDocumentStore;

/// A passage ready for storage: text, provenance, and its vector.
///
/// `id` derives deterministically from `content`, so re-ingesting
/// identical text upserts instead of duplicating.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Stable content hash, primary key in the store.
    pub id: String,
    /// Passage text.
    pub content: String,
    /// Source tag, e.g. `columbia_college_2026.json` or
    /// `culpa.info - Jane Smith`.
    pub source: String,
    /// Embedding model that produced the vector.
    pub model: String,
    /// Fixed-length embedding.
    pub embedding: Vec<f32>,
}

impl IndexedDocument {
    /// Builds a document, deriving the id from the content.
    pub fn from_content(
        content: impl Into<String>,
        source: impl Into<String>,
        model: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        let content = content.into();
        Self {
            id: content_id(&content),
            content,
            source: source.into(),
            model: model.into(),
            embedding,
        }
    }
}

/// One retrieval result. Ephemeral, produced per query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalMatch {
    pub id: String,
    pub content: String,
    /// Cosine similarity in `[0, 1]`, derived as `1 - distance`.
    pub similarity: f32,
    pub source: String,
}

/// Source predicates applied to a nearest-neighbor query.
///
/// Translation into SQL:
///
/// * `include` becomes an OR-group of `source LIKE` patterns.
/// * `exclude` becomes an AND-group of `source NOT LIKE` patterns.
/// * When both are present the two groups are OR-combined — the shape of a
///   tier backfill query ("anything not excluded, or the always-included
///   review sources").
/// * `entity` is AND-ed on top as a `content LIKE OR source LIKE`
///   substring match.
///
/// An empty filter places no restriction at all.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceFilter {
    /// SQL LIKE patterns a row's source may match (OR).
    pub include: Vec<String>,
    /// SQL LIKE patterns a row's source must not match (AND over NOT).
    pub exclude: Vec<String>,
    /// Substring that must appear in the row's content or source.
    pub entity: Option<String>,
}

impl SourceFilter {
    /// A filter with no restrictions.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Adds inclusion patterns.
    #[must_use]
    pub fn including<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds exclusion patterns.
    #[must_use]
    pub fn excluding<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Requires an entity-name substring match on content or source.
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Whether this filter restricts anything.
    pub fn is_unrestricted(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty() && self.entity.is_none()
    }
}

/// Storage backend for embedded passages.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts documents, overwriting any row with the same id.
    ///
    /// An upsert refreshes content, source, model, embedding, and the row
    /// timestamp, so re-ingestion of identical text is idempotent.
    async fn upsert(&self, documents: Vec<IndexedDocument>) -> Result<(), CorpusError>;

    /// Nearest-neighbor search by ascending cosine distance.
    ///
    /// Returns at most `limit` rows matching `filter`, each carrying
    /// `similarity = 1 - distance`. Zero rows is a valid outcome, not an
    /// error.
    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: &SourceFilter,
    ) -> Result<Vec<RetrievalMatch>, CorpusError>;

    /// Total number of stored documents.
    async fn count(&self) -> Result<usize, CorpusError>;
}
