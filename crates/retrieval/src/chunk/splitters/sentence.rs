//! Sentence splitter: packs whole sentences with `text-splitter`.

use super::{trimmed_ranges, ChunkSplitter};
use std::borrow::Cow;
use std::ops::Range;
use text_splitter::TextSplitter;

/// Line breaks are flattened to spaces first, so sentence boundaries are
/// the strongest split points left.
pub struct SentenceSplitter {
    max_chunk_size: usize,
}

impl SentenceSplitter {
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}

impl ChunkSplitter for SentenceSplitter {
    fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Cow::Owned(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn split(&self, text: &str) -> Vec<Range<usize>> {
        let splitter = TextSplitter::new(self.max_chunk_size);
        trimmed_ranges(splitter.chunk_indices(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(max: usize, text: &str) -> Vec<String> {
        let splitter = SentenceSplitter::new(max);
        let prepared = splitter.prepare(text);
        splitter
            .split(&prepared)
            .into_iter()
            .map(|range| prepared[range].to_string())
            .collect()
    }

    #[test]
    fn test_sentences_are_kept_whole() {
        let text = "Use EXPLAIN first. Then add an index! Does it help? Measure again.";
        let chunks = chunks(40, text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40);
            assert!(
                chunk.ends_with(|c: char| matches!(c, '.' | '!' | '?')),
                "cut mid-sentence: {:?}",
                chunk
            );
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_line_breaks_are_flattened() {
        let chunks = chunks(200, "One line\nwraps here.\n\nNext.");
        assert_eq!(chunks, vec!["One line wraps here. Next."]);
    }

    #[test]
    fn test_utf8() {
        let text = "Gamedex é um aplicativo 🎮 brasileiro. Acentuação: ã, õ, ç. ".repeat(10);
        for chunk in chunks(60, &text) {
            assert!(chunk.chars().count() <= 60);
        }
    }
}
