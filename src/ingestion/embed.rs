//! Batched corpus embedding with retry, backoff, and checkpointed resume.

use tracing::{debug, info, warn};

use crate::chunking::dedup::content_id;
use crate::config::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use crate::stores::IndexedDocument;
use crate::types::CorpusError;

use super::checkpoint::CheckpointStore;
use super::record::PassageRecord;

/// Result of embedding a corpus: one vector and one stable id per text,
/// in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedCorpus {
    pub model: String,
    pub dimensions: usize,
    pub ids: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
}

/// Embeds `texts` through `provider` in fixed-size sequential batches.
///
/// After every successful batch the checkpoint pair is rewritten, so an
/// abort at any point resumes by skipping exactly the batches already
/// reflected in the processed-count marker. A retryable failure backs off
/// exponentially up to `max_retries` attempts; exhausting them (or hitting
/// a fatal failure) aborts the run with the checkpoint in place. The
/// checkpoint pair is cleared on success.
///
/// # Errors
///
/// Returns [`CorpusError::Embedding`] when the provider fails past the
/// retry ceiling, and [`CorpusError::Io`]/[`CorpusError::Storage`] for
/// checkpoint trouble.
pub async fn embed_corpus(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    config: &EmbeddingConfig,
) -> Result<EmbeddedCorpus, CorpusError> {
    let model = provider.model_name().to_string();
    let checkpoints = CheckpointStore::new(&config.checkpoint_dir);
    let batch_size = config.batch_size.max(1);

    let (mut vectors, mut processed) = match checkpoints.load(&model).await? {
        Some(checkpoint) => {
            info!(
                model,
                processed = checkpoint.processed,
                total = texts.len(),
                "resuming embedding run from checkpoint"
            );
            (checkpoint.vectors, checkpoint.processed)
        }
        None => (Vec::new(), 0),
    };

    let start_batch = processed / batch_size;
    let total_batches = texts.len().div_ceil(batch_size);

    for (batch_index, batch) in texts.chunks(batch_size).enumerate().skip(start_batch) {
        let mut attempt: u32 = 0;
        loop {
            match provider.embed_batch(batch).await {
                Ok(batch_vectors) => {
                    vectors.extend(batch_vectors);
                    processed += batch.len();
                    checkpoints.save(&model, &vectors, processed).await?;
                    debug!(
                        model,
                        batch = batch_index + 1,
                        total_batches,
                        processed,
                        "embedded batch"
                    );
                    break;
                }
                Err(err) if err.is_retryable() && attempt + 1 < config.max_retries => {
                    let wait = config.initial_backoff * 2u32.saturating_pow(attempt);
                    warn!(
                        model,
                        batch = batch_index + 1,
                        attempt = attempt + 1,
                        max_retries = config.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        "embedding batch throttled, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        model,
                        processed,
                        total = texts.len(),
                        "embedding run aborted, checkpoint covers completed batches"
                    );
                    return Err(err.into());
                }
            }
        }
    }

    checkpoints.clear(&model).await?;
    info!(model, embedded = vectors.len(), "embedding run complete");

    Ok(EmbeddedCorpus {
        dimensions: provider.dimensions(),
        ids: texts.iter().map(|text| content_id(text)).collect(),
        vectors,
        model,
    })
}

/// Pairs passage records with their embedded corpus into store documents.
///
/// # Errors
///
/// Returns [`CorpusError::Alignment`] when the record and vector counts
/// differ.
pub fn corpus_documents(
    records: &[PassageRecord],
    corpus: &EmbeddedCorpus,
) -> Result<Vec<IndexedDocument>, CorpusError> {
    if records.len() != corpus.vectors.len() {
        return Err(CorpusError::Alignment(format!(
            "{} passage records vs {} embedding vectors",
            records.len(),
            corpus.vectors.len()
        )));
    }

    Ok(records
        .iter()
        .zip(corpus.vectors.iter())
        .map(|(record, vector)| {
            IndexedDocument::from_content(
                record.text.clone(),
                record.source.clone(),
                corpus.model.clone(),
                vector.clone(),
            )
        })
        .collect())
}
