//! Markdown-aware splitter backed by the CommonMark parser in
//! `text-splitter`: headings, fenced code and lists are split points
//! only where the parser sees them.

use super::{trimmed_ranges, ChunkSplitter};
use std::ops::Range;
use text_splitter::MarkdownSplitter as CommonMarkSplitter;

pub struct MarkdownSplitter {
    max_chunk_size: usize,
}

impl MarkdownSplitter {
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}

impl ChunkSplitter for MarkdownSplitter {
    fn split(&self, text: &str) -> Vec<Range<usize>> {
        let splitter = CommonMarkSplitter::new(self.max_chunk_size);
        trimmed_ranges(splitter.chunk_indices(text))
    }
}
