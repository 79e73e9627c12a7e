//! Pages through the chunking stages into deduplicated passages.

use std::path::Path;

use tracing::info;

use crate::chunking::dedup::ChunkDeduplicator;
use crate::chunking::packer::ChunkPacker;
use crate::config::ChunkingConfig;
use crate::types::CorpusError;

use super::record::{self, PageRecord, PassageRecord};

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Pages consumed.
    pub pages: usize,
    /// Unique passages emitted.
    pub passages: usize,
    /// Passages dropped as duplicates of earlier-processed text.
    pub duplicates_suppressed: usize,
}

/// Chunks page records into passage records.
///
/// The deduplicator is scoped to a run, not a page: the same text arriving
/// from two sources is admitted only for whichever source is processed
/// first.
pub struct IngestionPipeline {
    packer: ChunkPacker,
}

impl IngestionPipeline {
    /// Creates a pipeline with the given chunking bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::InvalidConfig`] for inconsistent bounds.
    pub fn new(config: ChunkingConfig) -> Result<Self, CorpusError> {
        config.validate()?;
        Ok(Self {
            packer: ChunkPacker::new(config),
        })
    }

    /// Chunks pages into a fresh run's worth of passages.
    pub fn chunk_pages(&self, pages: &[PageRecord]) -> (Vec<PassageRecord>, IngestionStats) {
        let mut dedup = ChunkDeduplicator::new();
        let mut passages = Vec::new();
        let mut stats = IngestionStats::default();
        self.chunk_pages_into(&mut dedup, pages, &mut passages, &mut stats);
        (passages, stats)
    }

    /// Chunks pages into an ongoing run, sharing its deduplicator.
    ///
    /// `chunk_id` is the 1-indexed packer position within the page; a
    /// suppressed duplicate leaves a gap rather than renumbering later
    /// passages.
    pub fn chunk_pages_into(
        &self,
        dedup: &mut ChunkDeduplicator,
        pages: &[PageRecord],
        passages: &mut Vec<PassageRecord>,
        stats: &mut IngestionStats,
    ) {
        for page in pages {
            stats.pages += 1;
            for (position, text) in self.packer.pack(&page.text).into_iter().enumerate() {
                if dedup.admit(&text) {
                    passages.push(PassageRecord {
                        source: page.source.clone(),
                        page_index: page.page_index,
                        chunk_id: position as u32 + 1,
                        text,
                    });
                    stats.passages += 1;
                } else {
                    stats.duplicates_suppressed += 1;
                }
            }
        }
    }

    /// Chunks several JSONL page files into one passage file.
    ///
    /// One deduplicator spans all inputs, in argument order.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Io`] when a file cannot be read or the output
    /// cannot be written. Malformed lines inside readable files are
    /// skipped.
    pub async fn process_files(
        &self,
        inputs: &[impl AsRef<Path>],
        output: impl AsRef<Path>,
    ) -> Result<IngestionStats, CorpusError> {
        let mut dedup = ChunkDeduplicator::new();
        let mut passages = Vec::new();
        let mut stats = IngestionStats::default();

        for input in inputs {
            let pages = record::read_page_records(input).await?;
            self.chunk_pages_into(&mut dedup, &pages, &mut passages, &mut stats);
        }

        record::write_passage_records(output, &passages).await?;
        info!(
            pages = stats.pages,
            passages = stats.passages,
            duplicates = stats.duplicates_suppressed,
            "ingestion run complete"
        );
        Ok(stats)
    }
}
