//! Line-delimited JSON records at the ingestion boundary.
//!
//! Decoding is tolerant: a line that is not valid JSON, or lacks a
//! required field, is logged and skipped rather than aborting the run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;

use crate::types::CorpusError;

/// One extracted page of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Source tag, e.g. `columbia_college_2026.json`.
    pub source: String,
    /// Position of the page within the source.
    pub page_index: u32,
    /// Raw page text. Accepts the legacy `page_content` field name.
    #[serde(alias = "page_content")]
    pub text: String,
}

/// One packed passage, ready for embedding.
///
/// `chunk_id` is the 1-indexed position of the passage within its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageRecord {
    pub source: String,
    pub page_index: u32,
    pub chunk_id: u32,
    pub text: String,
}

/// Decodes page records from JSONL text, skipping malformed lines.
pub fn parse_page_lines(input: &str) -> Vec<PageRecord> {
    parse_lines(input)
}

/// Decodes passage records from JSONL text, skipping malformed lines.
pub fn parse_passage_lines(input: &str) -> Vec<PassageRecord> {
    parse_lines(input)
}

fn parse_lines<T: serde::de::DeserializeOwned>(input: &str) -> Vec<T> {
    let mut records = Vec::new();
    for (line_number, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(line = line_number + 1, %err, "skipping malformed record");
            }
        }
    }
    records
}

/// Reads page records from a JSONL file.
///
/// # Errors
///
/// Returns [`CorpusError::Io`] when the file cannot be read; malformed
/// lines inside a readable file are skipped, not errors.
pub async fn read_page_records(path: impl AsRef<Path>) -> Result<Vec<PageRecord>, CorpusError> {
    let content = fs::read_to_string(path).await?;
    Ok(parse_page_lines(&content))
}

/// Reads passage records from a JSONL file.
///
/// # Errors
///
/// Returns [`CorpusError::Io`] when the file cannot be read.
pub async fn read_passage_records(
    path: impl AsRef<Path>,
) -> Result<Vec<PassageRecord>, CorpusError> {
    let content = fs::read_to_string(path).await?;
    Ok(parse_passage_lines(&content))
}

/// Writes passage records as JSONL: one object per line, UTF-8, no
/// trailing structure.
///
/// # Errors
///
/// Returns [`CorpusError::Io`] on write failure or
/// [`CorpusError::MalformedRecord`] if a record cannot be serialized.
pub async fn write_passage_records(
    path: impl AsRef<Path>,
    records: &[PassageRecord],
) -> Result<(), CorpusError> {
    let mut out = String::new();
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|err| CorpusError::MalformedRecord(err.to_string()))?;
        out.push_str(&line);
        out.push('\n');
    }
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, out).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_page_lines() {
        let input = r#"{"source": "barnard_2026.json", "page_index": 3, "text": "Page text."}
{"source": "seas_2026.json", "page_index": 1, "page_content": "Legacy field name."}"#;
        let records = parse_page_lines(input);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].page_index, 3);
        assert_eq!(records[1].text, "Legacy field name.");
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let input = "not json at all\n\
                     {\"source\": \"a\", \"page_index\": 1, \"text\": \"ok\"}\n\
                     {\"source\": \"missing text field\", \"page_index\": 2}\n\
                     \n\
                     {\"source\": \"b\", \"page_index\": 2, \"text\": \"also ok\"}";
        let records = parse_page_lines(input);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "ok");
        assert_eq!(records[1].text, "also ok");
    }

    #[test]
    fn passage_record_round_trips_the_wire_shape() {
        let record = PassageRecord {
            source: "columbia_college_2026.json".to_string(),
            page_index: 7,
            chunk_id: 2,
            text: "The core curriculum spans two years.".to_string(),
        };
        let line = serde_json::to_string(&record).unwrap();
        let decoded: PassageRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, record);
    }

    #[tokio::test]
    async fn writes_and_reads_jsonl_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passages.jsonl");
        let records = vec![
            PassageRecord {
                source: "a".into(),
                page_index: 1,
                chunk_id: 1,
                text: "first".into(),
            },
            PassageRecord {
                source: "a".into(),
                page_index: 1,
                chunk_id: 2,
                text: "second".into(),
            },
        ];
        write_passage_records(&path, &records).await.unwrap();
        let read_back = read_passage_records(&path).await.unwrap();
        assert_eq!(read_back, records);

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));
    }
}
