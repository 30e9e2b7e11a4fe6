//! Offline embedding provider built from hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use crate::keyword::tokenize;
use querywise_core::AppResult;
use std::collections::HashMap;

/// Deterministic, content-aware embeddings that need no model or network.
///
/// Each distinct token contributes its character trigrams and the whole
/// token to hashed dimensions. Texts sharing vocabulary land close together;
/// it is a lexical proxy, not a semantic model.
#[derive(Debug, Clone)]
pub struct TrigramProvider {
    dimensions: usize,
    normalize: bool,
}

impl TrigramProvider {
    pub fn new(dimensions: usize, normalize: bool) -> Self {
        Self {
            dimensions: dimensions.max(1),
            normalize,
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let mut frequencies: HashMap<String, u32> = HashMap::new();
        for token in tokenize(text) {
            *frequencies.entry(token).or_insert(0) += 1;
        }

        for (token, frequency) in &frequencies {
            let chars: Vec<char> = token.chars().collect();
            let weight = (*frequency as f32).sqrt();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 37)] += weight;
            }
            embedding[self.bucket(token, 31)] += *frequency as f32;
        }

        if self.normalize {
            let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                embedding.iter_mut().for_each(|v| *v /= norm);
            }
        }

        embedding
    }

    fn bucket(&self, feature: &str, multiplier: u64) -> usize {
        let hash = feature
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::cosine_similarity;

    #[tokio::test]
    async fn test_dimensions_and_order() {
        let provider = TrigramProvider::new(128, true);
        let texts = vec![
            "composite index column order".to_string(),
            "vacuum full locks the table".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.len() == 128));
        assert_eq!(embeddings[0], provider.embed(&texts[0]).await.unwrap());
    }

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let provider = TrigramProvider::new(384, true);
        let a = provider.embed("slow query log analysis").await.unwrap();
        let b = provider.embed("slow query log analysis").await.unwrap();

        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let provider = TrigramProvider::new(384, true);
        let query = provider.embed("add an index to speed up joins").await.unwrap();
        let related = provider
            .embed("indexes speed up joins on large tables")
            .await
            .unwrap();
        let unrelated = provider
            .embed("replication lag between primary and replica")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = TrigramProvider::new(16, true);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|v| *v == 0.0));
        assert!(provider.is_available().await);
    }
}
