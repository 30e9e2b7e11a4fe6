//! Embedding providers for the retrieval engine.
//!
//! The engine treats embedding generation as an interchangeable capability
//! with an availability check. Providers are selected per configuration.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
