//! Paragraph splitter: `text-splitter` over the raw text, where blank-line
//! runs outrank single line breaks and sentences.

use super::{trimmed_ranges, ChunkSplitter};
use std::ops::Range;
use text_splitter::TextSplitter;

pub struct ParagraphSplitter {
    max_chunk_size: usize,
}

impl ParagraphSplitter {
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}

impl ChunkSplitter for ParagraphSplitter {
    fn split(&self, text: &str) -> Vec<Range<usize>> {
        let splitter = TextSplitter::new(self.max_chunk_size);
        trimmed_ranges(splitter.chunk_indices(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(max: usize, text: &str) -> Vec<&str> {
        ParagraphSplitter::new(max)
            .split(text)
            .into_iter()
            .map(|range| &text[range])
            .collect()
    }

    #[test]
    fn test_paragraphs() {
        let text = "First paragraph\nstill first.\n\nSecond one is here.\n\n\nThird.";
        let chunks = chunks(30, text);

        assert_eq!(chunks[0], "First paragraph\nstill first.");
        assert!(chunks.last().unwrap().ends_with("Third."));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30);
            assert!(["First", "Second", "Third"].iter().any(|p| chunk.starts_with(p)));
        }
    }

    #[test]
    fn test_fitting_text_is_one_chunk() {
        let text = "a b c\n\nd e f";
        assert_eq!(chunks(100, text), vec![text]);
    }

    #[test]
    fn test_empty() {
        assert!(chunks(10, "\n\n \n").is_empty());
    }
}
