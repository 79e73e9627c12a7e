//! End-to-end corpus demo: chunk bulletin pages and professor reviews,
//! embed them offline, store them in SQLite, and run tiered and
//! comparison queries.
//!
//! Uses the deterministic hash embedder, so it runs without any network
//! access or API keys:
//!
//! ```bash
//! cargo run --example bulletin_pipeline
//! ```

use std::sync::Arc;

use tracing_subscriber::FmtSubscriber;

use passagesmith::chunking::{ChunkDeduplicator, ChunkPacker};
use passagesmith::ingestion::embed::{corpus_documents, embed_corpus};
use passagesmith::ingestion::reviews::{ProfessorReviews, ReviewEntry, chunk_reviews};
use passagesmith::stores::SqliteDocumentStore;
use passagesmith::{
    ChunkingConfig, CorpusError, EmbeddingConfig, HashEmbeddingProvider, IngestionPipeline,
    PageRecord, TieredRetriever, VectorStore,
};

#[tokio::main]
async fn main() -> Result<(), CorpusError> {
    init_tracing();

    let config = ChunkingConfig {
        min_chars: 60,
        max_chars: 200,
        overlap_chars: 30,
    };

    // 1. Chunk bulletin pages.
    let pipeline = IngestionPipeline::new(config.clone())?;
    let (mut passages, stats) = pipeline.chunk_pages(&sample_pages());
    println!(
        "Chunked {} pages into {} passages ({} duplicates suppressed)",
        stats.pages, stats.passages, stats.duplicates_suppressed
    );

    // 2. Add professor reviews to the same run.
    let packer = ChunkPacker::new(config);
    let mut dedup = ChunkDeduplicator::new();
    let review_passages = chunk_reviews(&packer, &mut dedup, &sample_reviews());
    println!("Added {} review passages", review_passages.len());
    passages.extend(review_passages);

    // 3. Embed with the offline provider.
    let provider = HashEmbeddingProvider::new(16);
    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    let tmp = std::env::temp_dir().join("bulletin_pipeline_demo");
    let corpus = embed_corpus(
        &provider,
        &texts,
        &EmbeddingConfig {
            batch_size: 8,
            checkpoint_dir: tmp.join("emb_out"),
            ..Default::default()
        },
    )
    .await?;
    println!(
        "Embedded {} passages with {} ({} dims)",
        corpus.vectors.len(),
        corpus.model,
        corpus.dimensions
    );

    // 4. Store.
    let store = Arc::new(SqliteDocumentStore::open_in_memory(16).await?);
    store.upsert(corpus_documents(&passages, &corpus)?).await?;
    println!("Stored {} documents\n", store.count().await.unwrap_or(0));

    // 5. Query.
    let retriever = TieredRetriever::builder()
        .store(store)
        .embedder(Arc::new(provider))
        .build()?;

    for (question, school) in [
        ("What are the core classes?", Some("columbia_college")),
        ("What are the core classes?", None),
        ("Compare Professor Smith and Professor Lee", Some("columbia_college")),
    ] {
        println!("Q: {question}  [school: {}]", school.unwrap_or("none"));
        let matches = retriever.retrieve(question, school, 4).await?;
        if matches.is_empty() {
            println!("   (no matches)");
        }
        for m in &matches {
            let preview: String = m.content.chars().take(60).collect();
            println!("   {:.3}  {:<30}  {preview}…", m.similarity, m.source);
        }
        println!();
    }

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn sample_pages() -> Vec<PageRecord> {
    let college = "The core curriculum spans the first two years. Literature Humanities \
                   meets four hours weekly in small seminars. Contemporary Civilization \
                   follows in the second year, covering political thought from antiquity \
                   onward. Frontiers of Science completes the first-year requirements.";
    let seas = "Engineering students complete the Gateway design course in the first \
                year. The technical core includes calculus, physics, and chemistry. \
                Majors declare at the end of the sophomore year.";
    let barnard = "Barnard's Foundations curriculum emphasizes modes of thinking. \
                   First-year students take a seminar and a writing workshop. \
                   Distributional requirements span the arts, sciences, and languages.";
    vec![
        PageRecord {
            source: "columbia_college_2026.json".to_string(),
            page_index: 1,
            text: college.to_string(),
        },
        PageRecord {
            source: "seas_2026.json".to_string(),
            page_index: 1,
            text: seas.to_string(),
        },
        PageRecord {
            source: "barnard_2026.json".to_string(),
            page_index: 1,
            text: barnard.to_string(),
        },
    ]
}

fn sample_reviews() -> Vec<ProfessorReviews> {
    vec![
        ProfessorReviews {
            name: "Jane Smith".to_string(),
            department: Some("Computer Science".to_string()),
            overall_rating: Some(4.5),
            courses: vec!["COMS 3134".to_string()],
            reviews: vec![ReviewEntry {
                course: Some("COMS 3134".to_string()),
                date: Some("2025-05-01".to_string()),
                text: Some(
                    "Clear lectures and fair exams. Office hours were genuinely \
                     helpful and the problem sets built on each other well."
                        .to_string(),
                ),
                workload: Some("Moderate".to_string()),
            }],
        },
        ProfessorReviews {
            name: "David Lee".to_string(),
            department: Some("Computer Science".to_string()),
            overall_rating: Some(3.8),
            courses: vec!["COMS 3137".to_string()],
            reviews: vec![ReviewEntry {
                course: Some("COMS 3137".to_string()),
                date: Some("2025-04-12".to_string()),
                text: Some(
                    "Tough grader but you learn a lot. Weekly essays add up, \
                     so budget time for the reading."
                        .to_string(),
                ),
                workload: Some("Heavy".to_string()),
            }],
        },
    ]
}
