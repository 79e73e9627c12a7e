//! Tiering and comparison behavior of the retriever, exercised against a
//! scripted store with hand-picked similarities.

use std::sync::Arc;

use async_trait::async_trait;
use passagesmith::{
    CorpusError, HashEmbeddingProvider, IndexedDocument, RetrievalMatch, SourceFilter,
    TieredRetriever, VectorStore,
};

/// In-memory store that ranks rows by scripted similarity and honors the
/// same filter semantics as the SQL backend.
struct ScriptedStore {
    rows: Vec<RetrievalMatch>,
}

impl ScriptedStore {
    fn new(rows: Vec<RetrievalMatch>) -> Self {
        Self { rows }
    }
}

fn row(id: &str, content: &str, similarity: f32, source: &str) -> RetrievalMatch {
    RetrievalMatch {
        id: id.to_string(),
        content: content.to_string(),
        similarity,
        source: source.to_string(),
    }
}

/// SQL LIKE with `%` wildcards, case-insensitive.
fn like_match(pattern: &str, value: &str) -> bool {
    fn matches(pattern: &[u8], value: &[u8]) -> bool {
        match pattern.first() {
            None => value.is_empty(),
            Some(b'%') => (0..=value.len()).any(|i| matches(&pattern[1..], &value[i..])),
            Some(&c) => value.first() == Some(&c) && matches(&pattern[1..], &value[1..]),
        }
    }
    matches(pattern.to_lowercase().as_bytes(), value.to_lowercase().as_bytes())
}

fn filter_allows(filter: &SourceFilter, row: &RetrievalMatch) -> bool {
    let include_hit = filter.include.iter().any(|p| like_match(p, &row.source));
    let exclude_hit = filter.exclude.iter().all(|p| !like_match(p, &row.source));
    let tier_ok = match (filter.include.is_empty(), filter.exclude.is_empty()) {
        (true, true) => true,
        (false, true) => include_hit,
        (true, false) => exclude_hit,
        (false, false) => include_hit || exclude_hit,
    };
    let entity_ok = filter.entity.as_ref().is_none_or(|entity| {
        let needle = entity.to_lowercase();
        row.content.to_lowercase().contains(&needle) || row.source.to_lowercase().contains(&needle)
    });
    tier_ok && entity_ok
}

#[async_trait]
impl VectorStore for ScriptedStore {
    async fn upsert(&self, _documents: Vec<IndexedDocument>) -> Result<(), CorpusError> {
        Ok(())
    }

    async fn search(
        &self,
        _query: &[f32],
        limit: usize,
        filter: &SourceFilter,
    ) -> Result<Vec<RetrievalMatch>, CorpusError> {
        let mut hits: Vec<RetrievalMatch> = self
            .rows
            .iter()
            .filter(|row| filter_allows(filter, row))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, CorpusError> {
        Ok(self.rows.len())
    }
}

fn retriever(rows: Vec<RetrievalMatch>) -> TieredRetriever {
    TieredRetriever::builder()
        .store(Arc::new(ScriptedStore::new(rows)))
        .embedder(Arc::new(HashEmbeddingProvider::new(4)))
        .build()
        .unwrap()
}

fn bulletin_rows() -> Vec<RetrievalMatch> {
    vec![
        row("cc1", "Core curriculum overview.", 0.95, "columbia_college_2026.json"),
        row("cc2", "Literature humanities.", 0.90, "columbia_college_2026.json"),
        row("cc3", "Contemporary civilization.", 0.85, "columbia_college_2026.json"),
        row("gs1", "GS degree requirements.", 0.80, "columbia_gs_2026.json"),
        row("cu1", "Professor ratings digest.", 0.70, "culpa.info - Various"),
        row("se1", "Engineering core.", 0.93, "seas_2026.json"),
        row("ba1", "Barnard first-year program.", 0.92, "barnard_2026.json"),
        row("misc1", "General university catalog.", 0.60, "university_catalog.json"),
    ]
}

#[tokio::test]
async fn sufficient_tier_returns_only_in_tier_and_review_rows() {
    let retriever = retriever(bulletin_rows());
    let matches = retriever
        .retrieve("What are the core classes?", Some("columbia_college"), 4)
        .await
        .unwrap();

    assert_eq!(matches.len(), 4);
    for m in &matches {
        assert!(
            m.source.contains("columbia_college")
                || m.source.contains("columbia_gs")
                || m.source.contains("culpa"),
            "out-of-tier source leaked: {}",
            m.source
        );
    }
    // Sorted by similarity descending.
    for pair in matches.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
    // The strong SEAS and Barnard rows must not displace in-tier rows.
    assert!(matches.iter().all(|m| m.id != "se1" && m.id != "ba1"));
}

#[tokio::test]
async fn short_tier_backfills_without_duplicates_or_excluded_sources() {
    let retriever = retriever(bulletin_rows());
    // Only five rows qualify for the columbia_college tier (4 in-tier +
    // review); asking for seven forces a backfill pass.
    let matches = retriever
        .retrieve("What are the core classes?", Some("columbia_college"), 7)
        .await
        .unwrap();

    assert!(matches.len() <= 7);
    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    let unique: std::collections::HashSet<&&str> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate ids in {ids:?}");

    // Backfill admits the general catalog but never the excluded siblings.
    assert!(ids.contains(&"misc1"));
    assert!(!ids.contains(&"ba1"));
    assert!(!ids.contains(&"se1"));
    // All five tier-eligible rows are present.
    for id in ["cc1", "cc2", "cc3", "gs1", "cu1"] {
        assert!(ids.contains(&id), "missing tier row {id}");
    }
}

#[tokio::test]
async fn unknown_context_falls_back_to_unfiltered_retrieval() {
    let retriever = retriever(bulletin_rows());
    let matches = retriever
        .retrieve("What are the core classes?", Some("juilliard"), 3)
        .await
        .unwrap();

    // Global top three regardless of school.
    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["cc1", "se1", "ba1"]);
}

#[tokio::test]
async fn missing_context_key_is_unfiltered_too() {
    let retriever = retriever(bulletin_rows());
    let matches = retriever
        .retrieve("What are the core classes?", None, 2)
        .await
        .unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].id, "cc1");
}

#[tokio::test]
async fn empty_corpus_yields_empty_result_not_error() {
    let retriever = retriever(Vec::new());
    let matches = retriever
        .retrieve("Anything at all?", Some("columbia_college"), 5)
        .await
        .unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn zero_k_short_circuits() {
    let retriever = retriever(bulletin_rows());
    let matches = retriever
        .retrieve("What are the core classes?", None, 0)
        .await
        .unwrap();
    assert!(matches.is_empty());
}

fn comparison_rows() -> Vec<RetrievalMatch> {
    vec![
        // Smith has the stronger matches across the board.
        row("s1", "Smith grades fairly.", 0.99, "culpa.info - Jane Smith"),
        row("s2", "Smith lectures clearly.", 0.98, "culpa.info - Jane Smith"),
        row("s3", "Professor Smith runs great office hours.", 0.97, "columbia_college_2026.json"),
        row("s4", "Smith workload is heavy.", 0.96, "culpa.info - Jane Smith"),
        // Lee's matches are weaker and would be crowded out by a single
        // ranked query.
        row("l1", "Lee assigns weekly essays.", 0.50, "culpa.info - David Lee"),
        row("l2", "Lee curves generously.", 0.45, "culpa.info - David Lee"),
        row("l3", "Professor Lee advises the robotics club.", 0.40, "columbia_college_2026.json"),
        // Unrelated noise.
        row("n1", "Registration deadlines.", 0.94, "columbia_college_2026.json"),
    ]
}

#[tokio::test]
async fn comparison_splits_headroom_between_entities() {
    let retriever = retriever(comparison_rows());
    let matches = retriever
        .retrieve(
            "Compare Professor Smith and Professor Lee",
            Some("columbia_college"),
            6,
        )
        .await
        .unwrap();

    assert_eq!(matches.len(), 6);

    let smith = matches
        .iter()
        .filter(|m| m.content.contains("Smith") || m.source.contains("Smith"))
        .count();
    let lee = matches
        .iter()
        .filter(|m| m.content.contains("Lee") || m.source.contains("Lee"))
        .count();
    assert!(smith <= 3, "Smith crowded the result: {smith}");
    assert!(lee <= 3, "Lee overrepresented: {lee}");
    assert_eq!(smith, 3);
    assert_eq!(lee, 3);

    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    let unique: std::collections::HashSet<&&str> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());

    // The noise row matches neither entity filter.
    assert!(!ids.contains(&"n1"));
}

#[tokio::test]
async fn comparison_suppresses_rows_shared_by_both_entities() {
    let mut rows = vec![
        row("s1", "Smith grades fairly.", 0.99, "culpa.info - Jane Smith"),
        row("s2", "Smith lectures clearly.", 0.98, "culpa.info - Jane Smith"),
        row("l1", "Lee assigns weekly essays.", 0.50, "culpa.info - David Lee"),
        row("l2", "Lee curves generously.", 0.45, "culpa.info - David Lee"),
    ];
    rows.push(row(
        "shared",
        "Professor Smith and Professor Lee co-teach the seminar.",
        0.95,
        "columbia_college_2026.json",
    ));

    let retriever = retriever(rows);
    let matches = retriever
        .retrieve("Compare Professor Smith and Professor Lee", None, 6)
        .await
        .unwrap();

    let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids.iter().filter(|id| **id == "shared").count(), 1);
    assert_eq!(matches.len(), 5);
}

#[tokio::test]
async fn comparison_respects_the_tier_filter() {
    let mut rows = comparison_rows();
    // A strong Smith row in an excluded sibling source must not appear.
    rows.push(row(
        "sx",
        "Smith teaches at Barnard too.",
        0.995,
        "barnard_2026.json",
    ));

    let retriever = retriever(rows);
    let matches = retriever
        .retrieve(
            "Compare Professor Smith and Professor Lee",
            Some("columbia_college"),
            6,
        )
        .await
        .unwrap();

    assert!(matches.iter().all(|m| m.id != "sx"));
}
