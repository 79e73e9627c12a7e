//! Resume artifacts for interrupted embedding runs.
//!
//! Each model gets a pair of files in the checkpoint directory: a vector
//! artifact (`{model}.checkpoint.json`) and a processed-count marker
//! (`{model}.progress.txt`). Both present means a prior run is resumable;
//! either missing means start from zero.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::types::CorpusError;

/// Vectors produced so far plus how many texts they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingCheckpoint {
    pub vectors: Vec<Vec<f32>>,
    pub processed: usize,
}

/// Reads and writes per-model checkpoint pairs.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Checkpoint directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_path(&self, model: &str) -> PathBuf {
        self.dir
            .join(format!("{}.checkpoint.json", sanitize_model_name(model)))
    }

    fn marker_path(&self, model: &str) -> PathBuf {
        self.dir
            .join(format!("{}.progress.txt", sanitize_model_name(model)))
    }

    /// Persists the current vectors and processed count for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Io`] on filesystem failure.
    pub async fn save(
        &self,
        model: &str,
        vectors: &[Vec<f32>],
        processed: usize,
    ) -> Result<(), CorpusError> {
        fs::create_dir_all(&self.dir).await?;
        let serialized = serde_json::to_string(vectors)
            .map_err(|err| CorpusError::Storage(err.to_string()))?;
        fs::write(self.artifact_path(model), serialized).await?;
        fs::write(self.marker_path(model), format!("{processed}\n")).await?;
        Ok(())
    }

    /// Loads the checkpoint for `model`, or `None` when either file of the
    /// pair is missing.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Io`] on read failure or
    /// [`CorpusError::Storage`] when an existing pair cannot be decoded.
    pub async fn load(&self, model: &str) -> Result<Option<EmbeddingCheckpoint>, CorpusError> {
        let artifact = self.artifact_path(model);
        let marker = self.marker_path(model);
        if !artifact.exists() || !marker.exists() {
            return Ok(None);
        }

        let vectors: Vec<Vec<f32>> = serde_json::from_str(&fs::read_to_string(&artifact).await?)
            .map_err(|err| CorpusError::Storage(format!("undecodable checkpoint: {err}")))?;
        let processed = fs::read_to_string(&marker)
            .await?
            .trim()
            .parse::<usize>()
            .map_err(|err| CorpusError::Storage(format!("undecodable progress marker: {err}")))?;

        Ok(Some(EmbeddingCheckpoint { vectors, processed }))
    }

    /// Removes the checkpoint pair after a successful run. Missing files
    /// are fine.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Io`] on removal failure.
    pub async fn clear(&self, model: &str) -> Result<(), CorpusError> {
        for path in [self.artifact_path(model), self.marker_path(model)] {
            if path.exists() {
                fs::remove_file(path).await?;
            }
        }
        Ok(())
    }
}

/// Model names contain `:` and `/`; both are unusable in file names.
fn sanitize_model_name(name: &str) -> String {
    name.replace([':', '/'], "_")
}
