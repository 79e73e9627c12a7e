//! Two-entity comparison intent detection.
//!
//! An ordered set of regex templates, most specific first; the first
//! pattern whose captures survive entity validation wins. Queries that
//! match fan out into one scoped retrieval per entity instead of a single
//! ranked query, so the stronger entity cannot crowd out the weaker one.

use regex::Regex;

use crate::types::CorpusError;

/// Entities longer than this many words are treated as false positives.
const MAX_ENTITY_WORDS: usize = 4;

/// Honorifics stripped from the front of a captured entity.
const HONORIFICS: [&str; 5] = ["professor ", "prof. ", "prof ", "dr. ", "dr "];

/// Recognizes "compare A and B" style queries.
///
/// # Examples
///
/// ```rust
/// use passagesmith::ComparisonDetector;
///
/// let detector = ComparisonDetector::new().unwrap();
/// let pair = detector.detect("Compare Professor Smith and Professor Lee");
/// assert_eq!(pair, Some(("Smith".to_string(), "Lee".to_string())));
/// assert_eq!(detector.detect("What is COMS 3134 about?"), None);
/// ```
#[derive(Debug, Clone)]
pub struct ComparisonDetector {
    patterns: Vec<Regex>,
}

impl ComparisonDetector {
    /// Compiles the built-in pattern set.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::InvalidConfig`] if a pattern fails to
    /// compile.
    pub fn new() -> Result<Self, CorpusError> {
        let sources = [
            // "compare A and B" / "compare A with B" / "compare A vs B"
            r"(?i)\bcompare\s+(.{1,60}?)\s+(?:and|with|to|versus|vs\.?)\s+(.{1,60}?)\s*[?.!]*\s*$",
            // "which (one) is better, A or B"
            r"(?i)\bwhich\s+(?:one\s+)?is\s+better\s*[,:]?\s+(.{1,60}?)\s+or\s+(.{1,60}?)\s*[?.!]*\s*$",
            // "difference(s) between A and B"
            r"(?i)\bdifferences?\s+between\s+(.{1,60}?)\s+and\s+(.{1,60}?)\s*[?.!]*\s*$",
            // bare "A versus B"
            r"(?i)^(.{1,60}?)\s+(?:versus|vs\.?)\s+(.{1,60}?)\s*[?.!]*\s*$",
        ];

        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source).map_err(|err| {
                    CorpusError::InvalidConfig(format!("comparison pattern failed to compile: {err}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns the two compared entities, or `None` for a regular query.
    ///
    /// A pattern only counts as a match when both captured entities survive
    /// validation: non-empty after honorific stripping, at most
    /// [`MAX_ENTITY_WORDS`] words, and distinct from each other.
    pub fn detect(&self, query_text: &str) -> Option<(String, String)> {
        for pattern in &self.patterns {
            let Some(captures) = pattern.captures(query_text) else {
                continue;
            };
            let Some(a) = clean_entity(captures.get(1)?.as_str()) else {
                continue;
            };
            let Some(b) = clean_entity(captures.get(2)?.as_str()) else {
                continue;
            };
            if a.to_lowercase() == b.to_lowercase() {
                continue;
            }
            return Some((a, b));
        }
        None
    }
}

/// Normalizes a captured entity span; `None` rejects the candidate.
fn clean_entity(raw: &str) -> Option<String> {
    let mut entity = raw.trim().trim_end_matches(['?', '.', '!', ',', ';']).trim();

    loop {
        let lowered = entity.to_lowercase();
        let Some(honorific) = HONORIFICS.iter().find(|h| lowered.starts_with(*h)) else {
            break;
        };
        entity = entity[honorific.len()..].trim_start();
    }

    if entity.is_empty() {
        return None;
    }
    let words = entity.split_whitespace().count();
    if words > MAX_ENTITY_WORDS {
        return None;
    }
    Some(entity.to_string())
}
