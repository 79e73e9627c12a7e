//! ```text
//! JSONL pages ──► ingestion::pipeline ──┬─► chunking::splitter ──► sentences/clauses
//!                                       ├─► chunking::packer   ──► bounded passages
//!                                       └─► chunking::dedup    ──► unique PassageRecords
//!
//! PassageRecords ──► ingestion::embed ──► embeddings::EmbeddingProvider
//!                          │                      │
//!                          └─► ingestion::checkpoint (resumable batches)
//!                                                 │
//! IndexedDocuments ──► stores::sqlite::SqliteDocumentStore (sqlite-vec)
//!
//! Query ──► retrieval::comparison ──► retrieval::TieredRetriever
//!                                          │
//!                                          ├─► retrieval::policy (source tiers)
//!                                          └─► stores::VectorStore (filtered cosine search)
//! ```
//!
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod ingestion;
pub mod retrieval;
pub mod stores;
pub mod types;

pub use chunking::dedup::{ChunkDeduplicator, content_id};
pub use chunking::packer::ChunkPacker;
pub use config::{ChunkingConfig, EmbeddingConfig, RetrievalConfig};
pub use embeddings::{EmbeddingError, EmbeddingProvider, HashEmbeddingProvider};
pub use ingestion::pipeline::{IngestionPipeline, IngestionStats};
pub use ingestion::record::{PageRecord, PassageRecord};
pub use retrieval::comparison::ComparisonDetector;
pub use retrieval::policy::{SourceTier, SourceTierPolicy};
pub use retrieval::retriever::TieredRetriever;
pub use stores::{IndexedDocument, RetrievalMatch, SourceFilter, VectorStore};
pub use types::CorpusError;
