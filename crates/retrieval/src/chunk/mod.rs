//! Document chunking for oversized reference documents.
//!
//! This module splits long documents into retrieval-sized chunks:
//! - The caller picks a strategy (sentence, paragraph, fixed-width, markdown)
//! - `text-splitter` packs semantic units up to `max_chunk_size` characters
//! - Fixed-width windows are cut on whitespace with optional overlap
//! - Undersized remainders are folded into a neighbour, never dropped

mod merging;
mod pipeline;
pub mod splitters;

pub use pipeline::Chunker;

use querywise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a document is cut into units before packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Sentence boundaries, line breaks flattened
    #[default]
    Sentence,
    /// Paragraph and line breaks first, then sentences
    Paragraph,
    /// Fixed-width windows ending on whitespace
    Fixed,
    /// CommonMark structure: headings, blocks, then sentences
    Markdown,
}

impl ChunkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::Sentence => "sentence",
            ChunkStrategy::Paragraph => "paragraph",
            ChunkStrategy::Fixed => "fixed",
            ChunkStrategy::Markdown => "markdown",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sentence" => Ok(ChunkStrategy::Sentence),
            "paragraph" => Ok(ChunkStrategy::Paragraph),
            "fixed" => Ok(ChunkStrategy::Fixed),
            "markdown" => Ok(ChunkStrategy::Markdown),
            other => Err(AppError::Config(format!(
                "Unknown chunk strategy: '{}'. Supported: sentence, paragraph, fixed, markdown",
                other
            ))),
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkConfig {
    #[serde(default)]
    pub strategy: ChunkStrategy,

    /// Maximum chunk size in characters; documents at or below it are not split
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Chunks smaller than this are merged into a neighbour
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Bytes shared by consecutive windows (fixed strategy only)
    #[serde(default)]
    pub overlap: usize,
}

fn default_max_chunk_size() -> usize {
    1000
}

fn default_min_chunk_size() -> usize {
    100
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::default(),
            max_chunk_size: default_max_chunk_size(),
            min_chunk_size: default_min_chunk_size(),
            overlap: 0,
        }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.max_chunk_size == 0 {
            return Err(AppError::Config(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.min_chunk_size > self.max_chunk_size {
            return Err(AppError::Config(format!(
                "min_chunk_size ({}) exceeds max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            )));
        }
        if self.overlap >= self.max_chunk_size {
            return Err(AppError::Config(format!(
                "overlap ({}) must be smaller than max_chunk_size ({})",
                self.overlap, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

/// One chunk of a document, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Parent title annotated with the chunk's position
    pub title: String,

    pub text: String,

    /// 0-based position
    pub chunk_index: usize,

    pub total_chunks: usize,
}
