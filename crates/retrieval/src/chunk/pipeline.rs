//! Chunking pipeline: split, absorb remainders, annotate.

use super::{
    merging::absorb_undersized,
    splitters::{ChunkSplitter, FixedSplitter, MarkdownSplitter, ParagraphSplitter, SentenceSplitter},
    ChunkConfig, ChunkStrategy, TextChunk,
};
use querywise_core::AppResult;

/// Splits oversized documents with a fixed, caller-chosen strategy.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a chunker; the configuration is validated up front.
    pub fn new(config: ChunkConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Whether `text` is larger than one chunk.
    pub fn needs_chunking(&self, text: &str) -> bool {
        text.trim().chars().count() > self.config.max_chunk_size
    }

    /// Split a document into ordered chunks.
    ///
    /// Text that already fits is returned as a single chunk under the
    /// original title. Blank text yields no chunks.
    pub fn chunk(&self, title: &str, text: &str) -> Vec<TextChunk> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if !self.needs_chunking(text) {
            return vec![TextChunk {
                title: title.to_string(),
                text: text.to_string(),
                chunk_index: 0,
                total_chunks: 1,
            }];
        }

        let splitter = self.dispatch_splitter();
        let prepared = splitter.prepare(text);
        let ranges = absorb_undersized(
            &prepared,
            splitter.split(&prepared),
            self.config.min_chunk_size,
        );
        let pieces: Vec<String> = ranges
            .into_iter()
            .map(|range| prepared[range].to_string())
            .collect();

        let total_chunks = pieces.len();
        let chunks: Vec<TextChunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| TextChunk {
                title: format!("{} (part {}/{})", title, chunk_index + 1, total_chunks),
                text,
                chunk_index,
                total_chunks,
            })
            .collect();

        tracing::debug!(
            "Chunked '{}' into {} chunks ({} strategy, {} chars)",
            title,
            chunks.len(),
            self.config.strategy,
            text.chars().count()
        );

        chunks
    }

    fn dispatch_splitter(&self) -> Box<dyn ChunkSplitter> {
        match self.config.strategy {
            ChunkStrategy::Sentence => Box::new(SentenceSplitter::new(self.config.max_chunk_size)),
            ChunkStrategy::Paragraph => Box::new(ParagraphSplitter::new(self.config.max_chunk_size)),
            ChunkStrategy::Markdown => Box::new(MarkdownSplitter::new(self.config.max_chunk_size)),
            ChunkStrategy::Fixed => Box::new(FixedSplitter::new(
                self.config.max_chunk_size,
                self.config.overlap,
            )),
        }
    }
}
