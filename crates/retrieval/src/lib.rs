//! Hybrid retrieval of reference documentation.
//!
//! An in-memory vector store with cosine-similarity and hybrid search, a
//! document chunker, a keyword-only fallback service, and an orchestrator
//! that degrades to keyword retrieval when embeddings are unavailable.

pub mod chunk;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod fallback;
pub mod keyword;
pub mod service;
pub mod snapshot;
pub mod types;
pub mod vector_store;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::RetrievalConfig;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use fallback::{KeywordMatch, KeywordRetrievalService};
pub use service::{
    DegradeReason, IndexOptions, RetrievalMode, RetrievalPath, RetrievalService, RetrieveOptions,
    ServiceStats,
};
pub use types::{Dialect, IndexReport, ReferenceDoc, RetrievedDoc, VectorDocument};
pub use vector_store::{cosine_similarity, StoreSnapshot, VectorStore};
