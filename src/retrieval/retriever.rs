//! Orchestrates store queries per request and merges results.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingProvider;
use crate::stores::{RetrievalMatch, SourceFilter, VectorStore};
use crate::types::CorpusError;

use super::comparison::ComparisonDetector;
use super::policy::SourceTierPolicy;

/// Similarity-ranked retrieval under source tiering and comparison fan-out.
///
/// A request issues between one and four nearest-neighbor queries:
///
/// * no tier, no comparison — one unrestricted query;
/// * tiered — an in-tier query, plus a backfill query when the tier alone
///   cannot fill `k`;
/// * comparison — one scoped query per entity, dispatched concurrently.
///
/// All paths end in the same merge: duplicate ids suppressed, sorted by
/// similarity descending, truncated to `k`.
///
/// # Examples
///
/// ```rust,ignore
/// use passagesmith::TieredRetriever;
///
/// let retriever = TieredRetriever::builder()
///     .store(store)
///     .embedder(embedder)
///     .build()?;
/// let matches = retriever
///     .retrieve("What are the core classes?", Some("columbia_college"), 10)
///     .await?;
/// ```
pub struct TieredRetriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    policy: SourceTierPolicy,
    detector: ComparisonDetector,
    config: RetrievalConfig,
}

impl TieredRetriever {
    /// Starts building a retriever.
    pub fn builder() -> TieredRetrieverBuilder {
        TieredRetrieverBuilder::default()
    }

    /// Returns the top matches for a query, at most `k` of them.
    ///
    /// `context_key` selects a source tier; unknown or absent keys fall
    /// back to unfiltered retrieval. Zero matches is a valid empty result.
    ///
    /// # Errors
    ///
    /// Propagates store and embedding failures. A missing tier is never an
    /// error.
    pub async fn retrieve(
        &self,
        query_text: &str,
        context_key: Option<&str>,
        k: usize,
    ) -> Result<Vec<RetrievalMatch>, CorpusError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        if let Some((entity_a, entity_b)) = self.detector.detect(query_text) {
            debug!(%entity_a, %entity_b, "comparison intent detected");
            return self.retrieve_comparison(&entity_a, &entity_b, context_key, k).await;
        }
        self.retrieve_tiered(query_text, context_key, k).await
    }

    /// In-tier query with backfill, or a single unrestricted query.
    async fn retrieve_tiered(
        &self,
        query_text: &str,
        context_key: Option<&str>,
        k: usize,
    ) -> Result<Vec<RetrievalMatch>, CorpusError> {
        let query_vec = self.embedder.embed_query(query_text).await?;
        let tier = context_key.and_then(|key| self.policy.resolve(key));

        let Some(tier) = tier.filter(|t| !t.included.is_empty()) else {
            return self
                .store
                .search(&query_vec, k, &SourceFilter::unrestricted())
                .await;
        };

        let in_tier = SourceFilter::unrestricted()
            .including(tier.included.iter().cloned())
            .including(self.policy.review_sources().iter().cloned());
        let mut matches = self.store.search(&query_vec, k, &in_tier).await?;

        if matches.len() < k {
            // Tiering must not starve the response below k: anything not
            // explicitly excluded may backfill the remaining slots. The
            // backfill fetches a full k because its top rows can repeat the
            // in-tier rows already held.
            let backfill = SourceFilter::unrestricted()
                .including(self.policy.review_sources().iter().cloned())
                .excluding(tier.excluded.iter().cloned());
            let extra = self.store.search(&query_vec, k, &backfill).await?;

            let seen: HashSet<String> = matches.iter().map(|m| m.id.clone()).collect();
            for candidate in extra {
                if matches.len() >= k {
                    break;
                }
                if !seen.contains(&candidate.id) {
                    matches.push(candidate);
                }
            }
            debug!(total = matches.len(), "backfilled tiered result");
        }

        sort_by_similarity(&mut matches);
        matches.truncate(k);
        Ok(matches)
    }

    /// One scoped query per compared entity, merged with equal headroom.
    async fn retrieve_comparison(
        &self,
        entity_a: &str,
        entity_b: &str,
        context_key: Option<&str>,
        k: usize,
    ) -> Result<Vec<RetrievalMatch>, CorpusError> {
        let tier = context_key
            .and_then(|key| self.policy.resolve(key))
            .filter(|t| !t.included.is_empty());
        let base = match tier {
            Some(tier) => SourceFilter::unrestricted()
                .including(tier.included.iter().cloned())
                .including(self.policy.review_sources().iter().cloned()),
            None => SourceFilter::unrestricted(),
        };

        let per_entity = (k / 2).max(1);
        let (matches_a, matches_b) = tokio::join!(
            self.entity_matches(entity_a, &base, per_entity),
            self.entity_matches(entity_b, &base, per_entity),
        );

        let mut merged = matches_a?;
        let seen: HashSet<String> = merged.iter().map(|m| m.id.clone()).collect();
        merged.extend(matches_b?.into_iter().filter(|m| !seen.contains(&m.id)));

        sort_by_similarity(&mut merged);
        merged.truncate(k);
        Ok(merged)
    }

    async fn entity_matches(
        &self,
        entity: &str,
        base: &SourceFilter,
        limit: usize,
    ) -> Result<Vec<RetrievalMatch>, CorpusError> {
        let sub_query = self.config.entity_query_template.replace("{}", entity);
        let query_vec = self.embedder.embed_query(&sub_query).await?;
        let filter = base.clone().with_entity(entity);
        self.store.search(&query_vec, limit, &filter).await
    }
}

fn sort_by_similarity(matches: &mut [RetrievalMatch]) {
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
}

/// Builder for [`TieredRetriever`].
#[derive(Default)]
pub struct TieredRetrieverBuilder {
    store: Option<Arc<dyn VectorStore>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    policy: Option<SourceTierPolicy>,
    config: Option<RetrievalConfig>,
}

impl TieredRetrieverBuilder {
    /// Sets the vector store. Required.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the query embedder. Required.
    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Overrides the tier policy. Defaults to the bulletin school groups.
    #[must_use]
    pub fn policy(mut self, policy: SourceTierPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Overrides retrieval settings.
    #[must_use]
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the retriever.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::InvalidConfig`] when the store or embedder is
    /// missing, or when the comparison patterns fail to compile.
    pub fn build(self) -> Result<TieredRetriever, CorpusError> {
        let store = self
            .store
            .ok_or_else(|| CorpusError::InvalidConfig("retriever requires a store".into()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| CorpusError::InvalidConfig("retriever requires an embedder".into()))?;
        Ok(TieredRetriever {
            store,
            embedder,
            policy: self.policy.unwrap_or_default(),
            detector: ComparisonDetector::new()?,
            config: self.config.unwrap_or_default(),
        })
    }
}
