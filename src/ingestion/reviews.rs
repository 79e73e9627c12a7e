//! Professor-review documents as an ingestion source.
//!
//! Review sites ship structured JSON rather than page text. Each
//! professor's record is rendered into one canonical text block, then
//! chunked like any other document, with the source tagged
//! `culpa.info - {name}` so review passages stay recognizable to the
//! tiering rules.

use serde::{Deserialize, Serialize};

use crate::chunking::dedup::ChunkDeduplicator;
use crate::chunking::packer::ChunkPacker;

use super::record::PassageRecord;

/// Formatted review blocks shorter than this carry no useful signal.
const MIN_REVIEW_TEXT_CHARS: usize = 100;

/// Reviews are unpaginated; passages carry this reserved page index.
const REVIEW_PAGE_INDEX: u32 = 0;

/// One student review of a professor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub workload: Option<String>,
}

/// A professor's profile with collected reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessorReviews {
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub overall_rating: Option<f32>,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<ReviewEntry>,
}

/// Renders a professor record into the canonical chunkable text block.
pub fn format_review_text(professor: &ProfessorReviews) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("Professor: {}", professor.name));
    if let Some(department) = &professor.department {
        lines.push(format!("Department: {department}"));
    }
    if let Some(rating) = professor.overall_rating {
        lines.push(format!("Overall Rating: {rating}/5.0"));
    }
    if !professor.courses.is_empty() {
        lines.push(format!("Courses: {}", professor.courses.join(", ")));
    }
    lines.push(String::new());

    if !professor.reviews.is_empty() {
        lines.push(format!(
            "Student Reviews ({} total):",
            professor.reviews.len()
        ));
        lines.push(String::new());

        for (index, review) in professor.reviews.iter().enumerate() {
            match &review.course {
                Some(course) => lines.push(format!("Review {} - {course}", index + 1)),
                None => lines.push(format!("Review {}", index + 1)),
            }
            if let Some(date) = &review.date {
                lines.push(format!("Date: {date}"));
            }
            if let Some(text) = &review.text {
                lines.push(text.clone());
            }
            if let Some(workload) = &review.workload {
                lines.push(format!("Workload: {workload}"));
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Source tag for a professor's review passages.
pub fn review_source(professor_name: &str) -> String {
    format!("culpa.info - {professor_name}")
}

/// Chunks professor records into passage records.
///
/// Records whose formatted text falls under the signal floor are skipped.
/// The shared deduplicator keeps review passages in the same run-wide
/// duplicate scope as bulletin passages.
pub fn chunk_reviews(
    packer: &ChunkPacker,
    dedup: &mut ChunkDeduplicator,
    professors: &[ProfessorReviews],
) -> Vec<PassageRecord> {
    let mut passages = Vec::new();

    for professor in professors {
        let text = format_review_text(professor);
        if text.trim().chars().count() < MIN_REVIEW_TEXT_CHARS {
            continue;
        }

        let source = review_source(&professor.name);
        for (position, chunk) in packer.pack(&text).into_iter().enumerate() {
            if dedup.admit(&chunk) {
                passages.push(PassageRecord {
                    source: source.clone(),
                    page_index: REVIEW_PAGE_INDEX,
                    chunk_id: position as u32 + 1,
                    text: chunk,
                });
            }
        }
    }

    passages
}
