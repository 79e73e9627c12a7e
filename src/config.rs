//! Configuration structs passed into pipeline constructors.
//!
//! Every tunable lives in one of three structs with sensible defaults, so
//! callers write `ChunkingConfig { max_chars: 1200, ..Default::default() }`
//! instead of reaching for globals.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::CorpusError;

/// Size and overlap bounds for the passage packer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Soft lower bound on passage length, in characters.
    ///
    /// Enforced opportunistically: the final passage of a page may fall
    /// below it, and a clause longer than `max_chars - min_chars` can force
    /// an undersized close mid-page.
    pub min_chars: usize,
    /// Hard upper bound on passage length, in characters. Always holds.
    pub max_chars: usize,
    /// Characters of trailing context carried into the next passage.
    /// Zero disables overlap.
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_chars: 2000,
            max_chars: 3000,
            overlap_chars: 200,
        }
    }
}

impl ChunkingConfig {
    /// Checks the bounds are internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::InvalidConfig`] when `max_chars` is zero,
    /// `min_chars` exceeds `max_chars`, or the overlap is not strictly
    /// smaller than `max_chars`.
    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.max_chars == 0 {
            return Err(CorpusError::InvalidConfig(
                "max_chars must be at least 1".into(),
            ));
        }
        if self.min_chars > self.max_chars {
            return Err(CorpusError::InvalidConfig(format!(
                "min_chars {} exceeds max_chars {}",
                self.min_chars, self.max_chars
            )));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(CorpusError::InvalidConfig(format!(
                "overlap_chars {} must be smaller than max_chars {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

/// Batch sizing, retry, and checkpoint settings for corpus embedding runs.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Number of passages sent to the provider per request.
    pub batch_size: usize,
    /// Attempts per batch before the run aborts with a checkpoint.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent attempt.
    pub initial_backoff: Duration,
    /// Directory holding the per-model checkpoint artifact pair.
    pub checkpoint_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            max_retries: 5,
            initial_backoff: Duration::from_secs(2),
            checkpoint_dir: PathBuf::from("./emb_out"),
        }
    }
}

/// Settings for query-time retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of matches returned when the caller does not specify.
    pub top_k: usize,
    /// Template for the synthetic sub-query issued per compared entity;
    /// `{}` is replaced with the entity name.
    pub entity_query_template: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            entity_query_template: "Overview, reviews, and course information for {}".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chunking_config_is_valid() {
        assert!(ChunkingConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_chars_rejected() {
        let config = ChunkingConfig {
            max_chars: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_above_max_rejected() {
        let config = ChunkingConfig {
            min_chars: 500,
            max_chars: 100,
            overlap_chars: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_stay_below_max() {
        let config = ChunkingConfig {
            min_chars: 10,
            max_chars: 100,
            overlap_chars: 100,
        };
        assert!(config.validate().is_err());
    }
}
