//! Run-scoped passage deduplication and stable content identity.
//!
//! Overlapping source pages (school bulletins republish shared pages per
//! school) produce near-identical passages. The deduplicator admits each
//! normalized text once per ingestion run, holding fixed-size digests
//! rather than raw text so memory stays bounded by passage count.

use std::collections::HashSet;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};

/// SHA-256 digest of the normalized (trimmed, case-folded) text.
///
/// Only used for within-run duplicate suppression; never persisted.
pub fn fingerprint(text: &str) -> [u8; 32] {
    let normalized = text.trim().to_lowercase();
    Sha256::digest(normalized.as_bytes()).into()
}

/// Stable identifier for a passage: the first 16 hex characters of the
/// SHA-256 of the raw text.
///
/// Identical content always produces the same id, which is what makes
/// store upserts idempotent across re-ingestion runs.
pub fn content_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut id = String::with_capacity(16);
    for byte in &digest[..8] {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// Tracks which normalized passages have been seen in the current run.
///
/// Admission order follows source iteration order, so when the same text
/// appears in two sources, whichever source was processed first wins the
/// slot. Deterministic, and relied upon by the ingestion pipeline.
#[derive(Debug, Default)]
pub struct ChunkDeduplicator {
    seen: HashSet<[u8; 32]>,
}

impl ChunkDeduplicator {
    /// Creates an empty deduplicator for a fresh run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time this normalized text is offered.
    pub fn admit(&mut self, text: &str) -> bool {
        self.seen.insert(fingerprint(text))
    }

    /// Number of distinct passages admitted so far.
    pub fn admitted(&self) -> usize {
        self.seen.len()
    }
}
