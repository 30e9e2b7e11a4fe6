//! Splitter implementations: each cuts text into sized chunks.

mod fixed;
mod markdown;
mod paragraph;
mod sentence;

pub use fixed::FixedSplitter;
pub use markdown::MarkdownSplitter;
pub use paragraph::ParagraphSplitter;
pub use sentence::SentenceSplitter;

use std::borrow::Cow;
use std::ops::Range;

/// Trait for chunk splitters.
///
/// Chunks are returned as byte ranges into the prepared text so that
/// neighbours can later be merged without repeating or losing content.
pub trait ChunkSplitter {
    /// Text the returned ranges refer to.
    fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }

    /// Cut prepared text into ordered, trimmed, non-empty ranges.
    fn split(&self, text: &str) -> Vec<Range<usize>>;
}

/// Ranges of the non-blank chunks yielded by a `text-splitter` splitter.
pub(crate) fn trimmed_ranges<'a>(
    chunks: impl Iterator<Item = (usize, &'a str)>,
) -> Vec<Range<usize>> {
    chunks
        .filter_map(|(offset, chunk)| {
            let trimmed = chunk.trim();
            if trimmed.is_empty() {
                return None;
            }
            let start = offset + (chunk.len() - chunk.trim_start().len());
            Some(start..start + trimmed.len())
        })
        .collect()
}
