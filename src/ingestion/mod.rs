//! Turning raw documents into an embedded, stored corpus.
//!
//! * [`record`] — line-delimited JSON page and passage records.
//! * [`pipeline`] — pages through the chunking stages into passages.
//! * [`reviews`] — structured professor-review documents as a source.
//! * [`checkpoint`] — per-model resume artifacts for embedding runs.
//! * [`embed`] — batched, retrying, checkpointed corpus embedding.

pub mod checkpoint;
pub mod embed;
pub mod pipeline;
pub mod record;
pub mod reviews;

pub use checkpoint::{CheckpointStore, EmbeddingCheckpoint};
pub use embed::{EmbeddedCorpus, corpus_documents, embed_corpus};
pub use pipeline::{IngestionPipeline, IngestionStats};
pub use record::{PageRecord, PassageRecord};
pub use reviews::{ProfessorReviews, ReviewEntry};
