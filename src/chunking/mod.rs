//! Passage chunking: sentence segmentation, bounded packing, deduplication.
//!
//! The three stages compose into the ingestion-side half of the crate:
//!
//! * [`splitter`] — language-aware sentence boundaries plus clause splits.
//! * [`packer`] — packs clauses into passages obeying hard size bounds,
//!   a soft minimum, and inter-passage overlap.
//! * [`dedup`] — suppresses near-identical passages within one run and
//!   derives stable content ids.

pub mod dedup;
pub mod packer;
pub mod splitter;

pub use dedup::{ChunkDeduplicator, content_id, fingerprint};
pub use packer::ChunkPacker;
pub use splitter::{split_clauses, split_sentences};
