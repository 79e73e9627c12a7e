//! Sentence and clause segmentation.
//!
//! Sentences come from `unicode-segmentation`'s UAX #29 sentence
//! boundaries, which handle abbreviations and closing punctuation far
//! better than a naive `. ` split. Clauses are sub-sentence spans cut
//! after `,` and `;` so the packer can fit long sentences tightly without
//! breaking mid-clause.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into trimmed, non-empty sentences in document order.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split_sentence_bounds()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Splits a sentence into clauses on `,` and `;`.
///
/// The delimiter stays attached to the preceding clause, so rejoining the
/// parts with single spaces reads naturally. Empty parts are dropped.
pub fn split_clauses(sentence: &str) -> Vec<&str> {
    sentence
        .split_inclusive([',', ';'])
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_basic_sentences() {
        let sentences = split_sentences("First sentence. Second one! And a third?");
        assert_eq!(
            sentences,
            vec!["First sentence.", "Second one!", "And a third?"]
        );
    }

    #[test]
    fn empty_text_yields_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t ").is_empty());
    }

    #[test]
    fn clause_delimiters_stay_attached() {
        let clauses = split_clauses("calculus is required, statistics is optional; both count");
        assert_eq!(
            clauses,
            vec![
                "calculus is required,",
                "statistics is optional;",
                "both count"
            ]
        );
    }

    #[test]
    fn clause_split_without_delimiters_is_identity() {
        assert_eq!(split_clauses("no punctuation here"), vec!["no punctuation here"]);
    }

    #[test]
    fn consecutive_delimiters_drop_empty_clauses() {
        assert_eq!(split_clauses("a,, b"), vec!["a,", ",", "b"]);
        assert_eq!(split_clauses(", "), vec![","]);
    }
}
