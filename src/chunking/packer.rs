//! Packs sentences and clauses into bounded, overlapping passages.

use crate::config::ChunkingConfig;

use super::splitter::{split_clauses, split_sentences};

/// Seeds shorter than this are discarded as meaningless fragments.
/// Capped by the configured overlap so tiny overlaps still produce seeds.
const MIN_OVERLAP_SEED: usize = 20;

/// Packs text into passages of at most `max_chars` characters.
///
/// The packer walks sentences, then clauses within each sentence, growing a
/// buffer until the next clause would overflow `max_chars`. Closed passages
/// seed the next buffer with their trailing `overlap_chars` characters so
/// context survives the cut. `min_chars` is a soft floor: passages close
/// below it only when the incoming clause could not otherwise fit, and the
/// final passage of a page merges backward when the merge stays within
/// bounds.
///
/// All lengths are measured in characters, never bytes, so multi-byte text
/// packs the same as ASCII.
///
/// # Examples
///
/// ```rust
/// use passagesmith::{ChunkPacker, ChunkingConfig};
///
/// let packer = ChunkPacker::new(ChunkingConfig {
///     min_chars: 20,
///     max_chars: 60,
///     overlap_chars: 0,
/// });
/// let passages = packer.pack("One short sentence. Another short sentence follows it.");
/// assert!(passages.iter().all(|p| p.chars().count() <= 60));
/// ```
#[derive(Debug, Clone)]
pub struct ChunkPacker {
    config: ChunkingConfig,
}

impl ChunkPacker {
    /// Creates a packer with the given bounds.
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Bounds this packer was built with.
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Splits `text` into passages.
    ///
    /// Returns an empty vector for empty or whitespace-only input. Output is
    /// deterministic for identical input and configuration.
    pub fn pack(&self, text: &str) -> Vec<String> {
        let ChunkingConfig {
            min_chars,
            max_chars,
            overlap_chars,
        } = self.config;

        let mut passages: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in split_sentences(text) {
            for clause in split_clauses(sentence) {
                let mut part = clause.trim();
                let mut part_len = char_len(part);

                // Oversized clause: flush the buffer to keep passage order,
                // then emit full-width slices until the remainder fits.
                while part_len > max_chars {
                    if !current.is_empty() {
                        passages.push(std::mem::take(&mut current));
                        current_len = 0;
                    }
                    let (head, rest) = split_at_chars(part, max_chars);
                    passages.push(head.trim_end().to_string());
                    part = rest.trim_start();
                    part_len = char_len(part);
                }
                if part.is_empty() {
                    continue;
                }

                if current.is_empty() {
                    current.push_str(part);
                    current_len = part_len;
                } else if current_len + 1 + part_len <= max_chars {
                    current.push(' ');
                    current.push_str(part);
                    current_len += 1 + part_len;
                } else {
                    // Close the buffer. When it is still below min_chars the
                    // clause simply cannot fit; closing undersized keeps the
                    // max bound intact and the packer moving forward.
                    let closed = std::mem::take(&mut current);
                    let seed = if overlap_chars > 0 {
                        overlap_seed(&closed, overlap_chars, max_chars, part_len)
                    } else {
                        None
                    };
                    passages.push(closed);
                    match seed {
                        Some(seed) => {
                            current_len = char_len(&seed) + 1 + part_len;
                            current = seed;
                            current.push(' ');
                            current.push_str(part);
                        }
                        None => {
                            current.push_str(part);
                            current_len = part_len;
                        }
                    }
                }
            }
        }

        if !current.is_empty() {
            if current_len >= min_chars || passages.is_empty() {
                passages.push(current);
            } else {
                // Undersized tail: merge backward when the result still fits.
                let previous_len = char_len(passages.last().map(String::as_str).unwrap_or(""));
                if previous_len + 1 + current_len <= max_chars {
                    let mut merged = passages.pop().unwrap_or_default();
                    merged.push(' ');
                    merged.push_str(&current);
                    passages.push(merged);
                } else {
                    passages.push(current);
                }
            }
        }

        passages
    }
}

/// Builds the overlap seed carried from a closed passage into the next one.
///
/// Takes the trailing `overlap_chars` characters, advances past the first
/// whitespace so the seed never starts mid-word, and shrinks it further so
/// `seed + " " + next_part` still fits `max_chars`. Returns `None` when the
/// surviving seed is shorter than the fragment floor.
fn overlap_seed(
    closed: &str,
    overlap_chars: usize,
    max_chars: usize,
    next_part_len: usize,
) -> Option<String> {
    let room = max_chars.checked_sub(next_part_len + 1)?;
    if room == 0 {
        return None;
    }

    let tail_budget = overlap_chars.min(room);
    let mut tail = last_chars(closed, tail_budget);
    // A tail shorter than the whole passage starts at an arbitrary offset;
    // cut forward to the next word start.
    if char_len(closed) > char_len(tail) {
        tail = match tail.find(char::is_whitespace) {
            Some(idx) => tail[idx..].trim_start(),
            None => return None,
        };
    }
    let tail = tail.trim();

    let floor = MIN_OVERLAP_SEED.min(overlap_chars);
    if char_len(tail) < floor || tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Splits at a character count, never inside a UTF-8 sequence.
fn split_at_chars(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((byte_idx, _)) => s.split_at(byte_idx),
        None => (s, ""),
    }
}

/// Returns the suffix of `s` holding its last `n` characters.
fn last_chars(s: &str, n: usize) -> &str {
    let total = char_len(s);
    if total <= n {
        return s;
    }
    let (_, tail) = split_at_chars(s, total - n);
    tail
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packer(min: usize, max: usize, overlap: usize) -> ChunkPacker {
        ChunkPacker::new(ChunkingConfig {
            min_chars: min,
            max_chars: max,
            overlap_chars: overlap,
        })
    }

    #[test]
    fn empty_input_produces_no_passages() {
        assert!(packer(20, 100, 10).pack("").is_empty());
        assert!(packer(20, 100, 10).pack("  \n ").is_empty());
    }

    #[test]
    fn short_text_is_a_single_passage() {
        let passages = packer(5, 100, 10).pack("Just one small sentence.");
        assert_eq!(passages, vec!["Just one small sentence."]);
    }

    #[test]
    fn every_passage_respects_max_chars() {
        let text = "Data structures are fundamental. Algorithms build on them, \
                    complexity analysis guides choices; recursion appears everywhere. \
                    Students practice with trees, graphs, heaps, and hash tables.";
        for max in [1, 7, 25, 60, 200] {
            let passages = packer(0, max, 0).pack(text);
            for passage in &passages {
                assert!(
                    passage.chars().count() <= max,
                    "passage {passage:?} exceeds {max}"
                );
            }
        }
    }

    #[test]
    fn oversized_sentence_is_hard_sliced_without_losing_text() {
        let word = "x".repeat(250);
        let passages = packer(10, 100, 0).pack(&word);
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].len(), 100);
        assert_eq!(passages[1].len(), 100);
        assert_eq!(passages[2].len(), 50);
        assert_eq!(passages.concat(), word);
    }

    #[test]
    fn buffer_flushes_before_hard_slices_to_keep_order() {
        let long = "Y".repeat(120);
        let text = format!("Intro clause here. {long}");
        let passages = packer(5, 100, 0).pack(&text);
        assert_eq!(passages[0], "Intro clause here.");
        assert_eq!(passages[1], "Y".repeat(100));
        assert_eq!(passages[2], "Y".repeat(20));
    }

    #[test]
    fn packing_is_deterministic() {
        let text = "Alpha beta gamma. Delta epsilon, zeta eta; theta iota. Kappa lambda mu nu.";
        let p = packer(10, 30, 8);
        assert_eq!(p.pack(text), p.pack(text));
    }

    #[test]
    fn clauses_pack_together_until_the_bound() {
        let passages = packer(0, 40, 0)
            .pack("one two three, four five six; seven eight nine ten eleven twelve.");
        assert!(passages.len() >= 2);
        // No mid-clause breaks: each passage ends at a clause boundary or
        // the end of input.
        for passage in &passages {
            assert!(passage.chars().count() <= 40);
        }
    }

    #[test]
    fn overlap_seed_carries_trailing_context() {
        // Two sentences that cannot share a passage; the second passage
        // should start with the tail of the first.
        let first = "The prerequisite sequence covers discrete mathematics and linear algebra.";
        let second = "The capstone course requires all of the prerequisite sequence courses.";
        let text = format!("{first} {second}");
        let passages = packer(10, 120, 40).pack(&text);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0], first);
        assert!(
            passages[1].starts_with("mathematics and linear algebra."),
            "expected seeded start, got {:?}",
            passages[1]
        );
        assert!(passages[1].ends_with(second));
    }

    #[test]
    fn zero_overlap_disables_seeding() {
        let first = "The prerequisite sequence covers discrete mathematics and linear algebra.";
        let second = "The capstone course requires all of the prerequisite sequence courses.";
        let passages = packer(10, 80, 0).pack(&format!("{first} {second}"));
        assert_eq!(passages, vec![first.to_string(), second.to_string()]);
    }

    #[test]
    fn seed_never_starts_mid_word() {
        let text = "Supercalifragilistic expialidocious arrangements delight everybody involved. \
                    Another complete sentence arrives right afterwards to force a close.";
        let passages = packer(10, 100, 35).pack(text);
        assert_eq!(passages.len(), 2);
        for passage in passages.iter().skip(1) {
            let first_word = passage.split_whitespace().next().unwrap_or("");
            assert!(
                text.split_whitespace().any(|w| w == first_word),
                "seed split a word: {first_word:?}"
            );
        }
    }

    #[test]
    fn tiny_seeds_are_discarded() {
        // A four-character overlap lands mid-word with no boundary to cut
        // to, so no seed survives.
        let first = "Short first sentence that fills up the available passage room fully.";
        let second = "Second sentence follows.";
        let passages = packer(10, 70, 4).pack(&format!("{first} {second}"));
        assert_eq!(passages, vec![first.to_string(), second.to_string()]);
    }

    #[test]
    fn small_tail_joins_the_final_passage() {
        let passages =
            packer(30, 80, 0).pack("A full sentence with plenty of characters in it. Tiny tail.");
        assert_eq!(passages.len(), 1);
        assert!(passages[0].ends_with("Tiny tail."));
    }

    #[test]
    fn trailing_passage_stays_separate_when_merge_would_overflow() {
        let first = "E".repeat(78);
        let text = format!("{first}. Tail under the floor.");
        let passages = packer(30, 80, 0).pack(&text);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[1], "Tail under the floor.");
    }

    #[test]
    fn oversized_clause_after_near_full_buffer_closes_undersized() {
        // A clause longer than max - min arriving when the buffer holds only
        // a short remainder forces an undersized close; the undersized
        // passage is never merged. Deliberate, load-bearing behavior.
        let filler = "F".repeat(55);
        let small = "Tiny bit";
        let big = "G".repeat(50);
        let text = format!("{filler}. {small}. {big}.");
        let passages = packer(40, 60, 0).pack(&text);
        assert!(passages.iter().any(|p| p.chars().count() < 40));
        for passage in &passages {
            assert!(passage.chars().count() <= 60);
        }
    }

    #[test]
    fn multibyte_text_slices_on_char_boundaries() {
        let text = "é".repeat(150);
        let passages = packer(10, 60, 0).pack(&text);
        assert!(passages.iter().all(|p| p.chars().count() <= 60));
        assert_eq!(
            passages.iter().map(|p| p.chars().count()).sum::<usize>(),
            150
        );
    }
}
