//! Retrieval orchestration.
//!
//! Owns the indexing pipeline (dedup, chunking, batch embedding, insertion)
//! and decides per query between hybrid semantic search and keyword-only
//! retrieval. Failures on the embedding path never reach the caller of
//! [`RetrievalService::retrieve_relevant_docs`]; they degrade to keyword
//! results and move the service into keyword-only mode.

use crate::chunk::Chunker;
use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingProvider;
use crate::fallback::KeywordRetrievalService;
use crate::snapshot;
use crate::types::{
    chunk_id, ChunkLink, Dialect, DocumentMetadata, IndexReport, ParentRef, ReferenceDoc,
    RetrievedDoc, VectorDocument,
};
use crate::vector_store::{
    HybridMatch, HybridSearchOptions, StoreSnapshot, StoreStats, VectorStore,
};
use chrono::{DateTime, Utc};
use querywise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Which retrieval path the service uses by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    SemanticEnabled,
    KeywordOnly,
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalMode::SemanticEnabled => f.write_str("semantic"),
            RetrievalMode::KeywordOnly => f.write_str("keyword-only"),
        }
    }
}

/// Why a query was served by keyword-only retrieval.
#[derive(Debug, Clone, PartialEq)]
pub enum DegradeReason {
    /// Semantic search is switched off by configuration or by the caller
    Disabled,
    /// The provider was unavailable, now or earlier in the session
    ProviderUnavailable,
    /// Embedding the query failed
    QueryEmbedding(String),
    /// The vector search could not run
    Search(String),
    /// Nothing has been indexed yet
    EmptyIndex,
}

impl DegradeReason {
    /// Runtime failures move the service to keyword-only mode.
    pub fn demotes(&self) -> bool {
        matches!(
            self,
            DegradeReason::ProviderUnavailable
                | DegradeReason::QueryEmbedding(_)
                | DegradeReason::Search(_)
        )
    }
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::Disabled => f.write_str("semantic search disabled"),
            DegradeReason::ProviderUnavailable => f.write_str("embedding provider unavailable"),
            DegradeReason::QueryEmbedding(e) => write!(f, "query embedding failed: {}", e),
            DegradeReason::Search(e) => write!(f, "vector search failed: {}", e),
            DegradeReason::EmptyIndex => f.write_str("vector store is empty"),
        }
    }
}

/// Outcome of the primary (semantic) path.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalPath<T> {
    Semantic(T),
    Degraded(DegradeReason),
}

impl<T> RetrievalPath<T> {
    pub fn is_semantic(&self) -> bool {
        matches!(self, RetrievalPath::Semantic(_))
    }

    pub fn degrade_reason(&self) -> Option<&DegradeReason> {
        match self {
            RetrievalPath::Degraded(reason) => Some(reason),
            RetrievalPath::Semantic(_) => None,
        }
    }

    /// Chain another semantic step; a degraded path stays degraded.
    pub fn and_then<U>(self, next: impl FnOnce(T) -> RetrievalPath<U>) -> RetrievalPath<U> {
        match self {
            RetrievalPath::Semantic(value) => next(value),
            RetrievalPath::Degraded(reason) => RetrievalPath::Degraded(reason),
        }
    }

    /// The semantic value, or the fallback computed for the degrade reason.
    pub fn or_fallback(self, fallback: impl FnOnce(DegradeReason) -> T) -> T {
        match self {
            RetrievalPath::Semantic(value) => value,
            RetrievalPath::Degraded(reason) => fallback(reason),
        }
    }
}

/// Per-call retrieval options.
#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    /// Force (`Some(true)`) or skip (`Some(false)`) semantic search for this
    /// call regardless of the cached mode
    pub use_semantic: Option<bool>,

    /// Override the configured semantic weight
    pub semantic_weight: Option<f32>,

    /// Override the configured keyword weight
    pub keyword_weight: Option<f32>,
}

impl RetrieveOptions {
    pub fn keyword_only() -> Self {
        Self {
            use_semantic: Some(false),
            ..Default::default()
        }
    }
}

/// Per-call indexing options.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Override `chunking.chunk_large_docs`
    pub chunk_large_docs: Option<bool>,

    /// Override `chunking.max_chunk_size`
    pub max_chunk_size: Option<usize>,
}

/// Service-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub mode: RetrievalMode,
    pub semantic_active: bool,
    pub provider: String,
    pub model: String,
    pub store: StoreStats,
    pub fallback_documents: usize,
    pub last_indexed_at: Option<DateTime<Utc>>,
}

struct PendingDocument {
    id: String,
    text: String,
    metadata: DocumentMetadata,
}

/// Hybrid retrieval over one vector store, with keyword-only fallback.
pub struct RetrievalService {
    config: RetrievalConfig,
    provider: Arc<dyn EmbeddingProvider>,
    fallback: KeywordRetrievalService,
    store: RwLock<VectorStore>,
    mode: RwLock<RetrievalMode>,
    last_indexed_at: RwLock<Option<DateTime<Utc>>>,
}

impl RetrievalService {
    /// Create a service in keyword-only mode; call [`initialize`] to probe
    /// the provider.
    ///
    /// [`initialize`]: RetrievalService::initialize
    pub fn new(
        config: RetrievalConfig,
        provider: Arc<dyn EmbeddingProvider>,
        fallback: KeywordRetrievalService,
    ) -> Self {
        Self {
            config,
            provider,
            fallback,
            store: RwLock::new(VectorStore::new()),
            mode: RwLock::new(RetrievalMode::KeywordOnly),
            last_indexed_at: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn fallback(&self) -> &KeywordRetrievalService {
        &self.fallback
    }

    pub async fn mode(&self) -> RetrievalMode {
        *self.mode.read().await
    }

    /// Decide whether semantic search is usable. The result is cached until
    /// the next call.
    pub async fn initialize(&self) -> RetrievalMode {
        let mode = if !self.config.semantic_enabled {
            tracing::info!("Semantic search disabled by configuration, using keyword retrieval");
            RetrievalMode::KeywordOnly
        } else if self.provider.is_available().await {
            tracing::info!(
                "Semantic search enabled ({} / {})",
                self.provider.provider_name(),
                self.provider.model_name()
            );
            RetrievalMode::SemanticEnabled
        } else {
            tracing::warn!(
                "Embedding provider '{}' unavailable, using keyword retrieval",
                self.provider.provider_name()
            );
            RetrievalMode::KeywordOnly
        };

        *self.mode.write().await = mode;
        mode
    }

    /// Chunk, embed and insert documents not already indexed.
    ///
    /// Embedding happens in one batch call. When semantic search is
    /// unavailable, or the batch fails, nothing is inserted and the report
    /// is marked skipped. A dimension mismatch on insert is returned as an
    /// error.
    pub async fn index_documents(
        &self,
        documents: &[ReferenceDoc],
        options: &IndexOptions,
    ) -> AppResult<IndexReport> {
        let mut report = IndexReport {
            documents_seen: documents.len(),
            ..Default::default()
        };

        if self.mode().await == RetrievalMode::KeywordOnly {
            tracing::info!(
                "Semantic search unavailable, not indexing {} documents",
                documents.len()
            );
            report.skipped = true;
            return Ok(report);
        }

        let mut chunk_config = self.config.chunking.chunk.clone();
        if let Some(max) = options.max_chunk_size {
            chunk_config.max_chunk_size = max;
            chunk_config.min_chunk_size = chunk_config.min_chunk_size.min(max);
            chunk_config.overlap = chunk_config.overlap.min(max.saturating_sub(1));
        }
        let chunker = Chunker::new(chunk_config)?;
        let chunk_large_docs = options
            .chunk_large_docs
            .unwrap_or(self.config.chunking.chunk_large_docs);

        let pending = {
            let store = self.store.read().await;
            let mut seen = HashSet::new();
            let mut pending = Vec::new();

            for document in documents {
                let id = document.content_id();
                let already_indexed = store.contains(&id) || store.contains(&chunk_id(&id, 0));
                if !seen.insert(id.clone()) || already_indexed {
                    report.duplicates_skipped += 1;
                    continue;
                }

                if chunk_large_docs && chunker.needs_chunking(&document.content) {
                    let chunks = chunker.chunk(&document.title, &document.content);
                    report.documents_chunked += 1;
                    report.chunks_created += chunks.len();

                    for chunk in chunks {
                        let mut metadata = DocumentMetadata::from_reference(document);
                        metadata.title = chunk.title;
                        metadata.chunk = Some(ChunkLink {
                            chunk_index: chunk.chunk_index,
                            total_chunks: chunk.total_chunks,
                            original_document_id: ParentRef::new(id.clone()),
                        });
                        pending.push(PendingDocument {
                            id: chunk_id(&id, chunk.chunk_index),
                            text: chunk.text,
                            metadata,
                        });
                    }
                } else {
                    pending.push(PendingDocument {
                        id,
                        text: document.content.clone(),
                        metadata: DocumentMetadata::from_reference(document),
                    });
                }
            }
            pending
        };

        if pending.is_empty() {
            tracing::info!(
                "Nothing new to index ({} duplicates)",
                report.duplicates_skipped
            );
            return Ok(report);
        }

        let texts: Vec<String> = pending.iter().map(|p| p.text.clone()).collect();
        let embeddings = match self.embed_for_indexing(&texts).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                self.demote(&format!("batch embedding failed: {}", e)).await;
                tracing::warn!("Indexing skipped, nothing inserted");
                report.skipped = true;
                return Ok(report);
            }
        };

        let vectors: Vec<VectorDocument> = pending
            .into_iter()
            .zip(embeddings)
            .map(|(p, embedding)| VectorDocument {
                id: p.id,
                text: p.text,
                embedding,
                metadata: p.metadata,
            })
            .collect();
        let inserted = vectors.len();

        self.store.write().await.add_batch(vectors)?;
        *self.last_indexed_at.write().await = Some(Utc::now());

        report.vectors_inserted = inserted;
        tracing::info!(
            "Indexed {} documents: {} vectors, {} chunked, {} duplicates",
            report.documents_seen,
            report.vectors_inserted,
            report.documents_chunked,
            report.duplicates_skipped
        );
        Ok(report)
    }

    async fn embed_for_indexing(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let embeddings = self.provider.embed_batch(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        if embeddings.iter().any(Vec::is_empty) {
            return Err(AppError::Embedding(
                "Provider returned an empty embedding".to_string(),
            ));
        }
        Ok(embeddings)
    }

    /// Documents relevant to `query` for `dialect`, best first.
    ///
    /// Never fails: any problem on the semantic path is logged and the
    /// keyword-only service answers instead.
    pub async fn retrieve_relevant_docs(
        &self,
        query: &str,
        dialect: Dialect,
        max_docs: usize,
        options: &RetrieveOptions,
    ) -> Vec<RetrievedDoc> {
        let path = self.semantic_path(query, dialect, max_docs, options).await;

        if let Some(reason) = path.degrade_reason() {
            if reason.demotes() {
                self.demote(reason).await;
            }
        }

        path.or_fallback(|reason| {
            tracing::debug!("Serving keyword results: {}", reason);
            self.keyword_results(query, dialect, max_docs)
        })
    }

    /// Keyword-only results for a query, as returned on fallback.
    pub fn keyword_results(
        &self,
        query: &str,
        dialect: Dialect,
        max_docs: usize,
    ) -> Vec<RetrievedDoc> {
        self.fallback
            .retrieve(query, dialect, max_docs)
            .into_iter()
            .map(RetrievedDoc::from)
            .collect()
    }

    async fn semantic_path(
        &self,
        query: &str,
        dialect: Dialect,
        max_docs: usize,
        options: &RetrieveOptions,
    ) -> RetrievalPath<Vec<RetrievedDoc>> {
        match options.use_semantic {
            Some(false) => return RetrievalPath::Degraded(DegradeReason::Disabled),
            Some(true) => {}
            None if !self.config.semantic_enabled => {
                return RetrievalPath::Degraded(DegradeReason::Disabled)
            }
            None => {
                if self.mode().await == RetrievalMode::KeywordOnly {
                    return RetrievalPath::Degraded(DegradeReason::ProviderUnavailable);
                }
            }
        }

        if self.store.read().await.is_empty() {
            return RetrievalPath::Degraded(DegradeReason::EmptyIndex);
        }

        let embedded = match self.provider.embed(query).await {
            Ok(embedding) => RetrievalPath::Semantic(embedding),
            Err(e) => RetrievalPath::Degraded(DegradeReason::QueryEmbedding(e.to_string())),
        };

        let store = self.store.read().await;
        embedded.and_then(|embedding| {
            self.hybrid(&store, &embedding, query, dialect, max_docs, options)
        })
    }

    fn hybrid(
        &self,
        store: &VectorStore,
        embedding: &[f32],
        query: &str,
        dialect: Dialect,
        max_docs: usize,
        options: &RetrieveOptions,
    ) -> RetrievalPath<Vec<RetrievedDoc>> {
        match store.dimension() {
            Some(expected) if expected != embedding.len() => {
                return RetrievalPath::Degraded(DegradeReason::Search(
                    AppError::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    }
                    .to_string(),
                ));
            }
            None => return RetrievalPath::Degraded(DegradeReason::EmptyIndex),
            Some(_) => {}
        }

        let search_options = HybridSearchOptions::new()
            .with_limit(max_docs)
            .with_weights(
                options.semantic_weight.unwrap_or(self.config.semantic_weight),
                options.keyword_weight.unwrap_or(self.config.keyword_weight),
            )
            .with_filter(Arc::new(move |document: &VectorDocument| {
                document.metadata.dialect.serves(dialect)
            }));

        let matches = store.hybrid_search(embedding, query, &search_options);
        tracing::debug!(
            "Semantic retrieval for {}: {} results, top score {:.3}",
            dialect,
            matches.len(),
            matches.first().map_or(0.0, |m| m.score)
        );

        RetrievalPath::Semantic(matches.into_iter().map(retrieved_from_match).collect())
    }

    async fn demote(&self, reason: &(dyn fmt::Display + Sync)) {
        let mut mode = self.mode.write().await;
        if *mode == RetrievalMode::SemanticEnabled {
            tracing::warn!("Switching to keyword-only retrieval: {}", reason);
            *mode = RetrievalMode::KeywordOnly;
        }
    }

    pub async fn export_vector_store(&self) -> StoreSnapshot {
        self.store.read().await.export()
    }

    /// Replace the store with a snapshot. A malformed snapshot is an error
    /// and leaves the store untouched.
    pub async fn import_vector_store(&self, snapshot: StoreSnapshot) -> AppResult<()> {
        let provider_dimensions = self.provider.dimensions();
        if snapshot.dimension > 0
            && provider_dimensions > 0
            && snapshot.dimension != provider_dimensions
        {
            tracing::warn!(
                "Snapshot dimension {} differs from provider '{}' ({}); semantic queries will fall back",
                snapshot.dimension,
                self.provider.provider_name(),
                provider_dimensions
            );
        }
        self.store.write().await.import(snapshot)
    }

    /// Drop every indexed vector.
    pub async fn reset_index(&self) {
        self.store.write().await.clear();
        *self.last_indexed_at.write().await = None;
        tracing::info!("Vector store cleared");
    }

    /// Write the store snapshot to `path`.
    pub async fn persist(&self, path: &Path) -> AppResult<()> {
        let snapshot = self.export_vector_store().await;
        snapshot::save_snapshot(path, &snapshot)
    }

    /// Load a snapshot written by [`persist`]. Returns false on a cold start
    /// (no file).
    ///
    /// [`persist`]: RetrievalService::persist
    pub async fn warm_from(&self, path: &Path) -> AppResult<bool> {
        match snapshot::load_snapshot(path)? {
            Some(snapshot) => {
                self.import_vector_store(snapshot).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn stats(&self) -> ServiceStats {
        let mode = self.mode().await;
        ServiceStats {
            mode,
            semantic_active: mode == RetrievalMode::SemanticEnabled,
            provider: self.provider.provider_name().to_string(),
            model: self.provider.model_name().to_string(),
            store: self.store.read().await.stats(),
            fallback_documents: self.fallback.document_count(),
            last_indexed_at: *self.last_indexed_at.read().await,
        }
    }
}

fn retrieved_from_match(hit: HybridMatch) -> RetrievedDoc {
    let VectorDocument { text, metadata, .. } = hit.document;
    RetrievedDoc {
        title: metadata.title,
        content: text,
        source: metadata.source,
        dialect: metadata.dialect,
        keywords: metadata.keywords,
        chunk: metadata.chunk,
        relevance_score: hit.score,
        semantic_score: Some(hit.semantic_score),
        keyword_score: Some(hit.keyword_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_fallback() {
        let semantic: RetrievalPath<u32> = RetrievalPath::Semantic(1);
        assert_eq!(semantic.or_fallback(|_| 2), 1);

        let degraded: RetrievalPath<u32> = RetrievalPath::Degraded(DegradeReason::EmptyIndex);
        assert_eq!(
            degraded.or_fallback(|reason| {
                assert_eq!(reason, DegradeReason::EmptyIndex);
                2
            }),
            2
        );
    }

    #[test]
    fn test_and_then_keeps_first_reason() {
        let path: RetrievalPath<u32> =
            RetrievalPath::Degraded(DegradeReason::QueryEmbedding("timeout".into()));
        let chained = path.and_then(|v| RetrievalPath::Semantic(v + 1));
        assert_eq!(
            chained.degrade_reason(),
            Some(&DegradeReason::QueryEmbedding("timeout".into()))
        );

        let ok = RetrievalPath::Semantic(1).and_then(|v| RetrievalPath::Semantic(v + 1));
        assert_eq!(ok, RetrievalPath::Semantic(2));
        assert!(ok.is_semantic());
    }

    #[test]
    fn test_which_reasons_demote() {
        assert!(DegradeReason::ProviderUnavailable.demotes());
        assert!(DegradeReason::QueryEmbedding("x".into()).demotes());
        assert!(DegradeReason::Search("x".into()).demotes());
        assert!(!DegradeReason::EmptyIndex.demotes());
        assert!(!DegradeReason::Disabled.demotes());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(RetrievalMode::SemanticEnabled.to_string(), "semantic");
        assert_eq!(RetrievalMode::KeywordOnly.to_string(), "keyword-only");
    }
}
