//! Provider used when embeddings are switched off.

use crate::embeddings::provider::EmbeddingProvider;
use querywise_core::{AppError, AppResult};

/// Always unavailable; every embedding request fails.
#[derive(Debug, Clone, Default)]
pub struct DisabledProvider;

impl DisabledProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn provider_name(&self) -> &str {
        "none"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        0
    }

    async fn is_available(&self) -> bool {
        false
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding(
            "Embeddings are disabled by configuration".to_string(),
        ))
    }
}
