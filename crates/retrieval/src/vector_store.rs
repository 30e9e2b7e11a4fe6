//! In-memory vector store with brute-force cosine and hybrid search.
//!
//! The store is a flat map from id to [`VectorDocument`]. Every search is a
//! full scan; the corpus is a bounded, curated documentation set, so there
//! is no secondary index.
//!
//! The first inserted vector fixes the store's dimension. Any later vector
//! of a different length is rejected with [`AppError::DimensionMismatch`]
//! and leaves the store untouched. [`VectorStore::clear`] resets the
//! dimension.

use crate::keyword;
use crate::types::{Dialect, VectorDocument};
use querywise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Default number of results returned by a search.
pub const DEFAULT_LIMIT: usize = 10;

/// Default weight of the cosine similarity in hybrid search.
pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.7;

/// Default weight of the keyword score in hybrid search.
pub const DEFAULT_KEYWORD_WEIGHT: f32 = 0.3;

/// Predicate deciding which documents a search considers.
pub type DocumentFilter = Arc<dyn Fn(&VectorDocument) -> bool + Send + Sync>;

/// Options for [`VectorStore::search`].
#[derive(Clone)]
pub struct SearchOptions {
    /// Maximum number of results
    pub limit: usize,

    /// Minimum similarity to keep a result
    pub threshold: f32,

    /// Optional predicate; documents failing it are not scored
    pub filter: Option<DocumentFilter>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            threshold: f32::NEG_INFINITY,
            filter: None,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_filter(mut self, filter: DocumentFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl fmt::Debug for SearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("limit", &self.limit)
            .field("threshold", &self.threshold)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// Options for [`VectorStore::hybrid_search`].
///
/// Weights are used as given. They do not need to sum to 1 and are never
/// renormalized.
#[derive(Clone)]
pub struct HybridSearchOptions {
    pub limit: usize,
    pub semantic_weight: f32,
    pub keyword_weight: f32,
    pub filter: Option<DocumentFilter>,
}

impl Default for HybridSearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            keyword_weight: DEFAULT_KEYWORD_WEIGHT,
            filter: None,
        }
    }
}

impl HybridSearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_weights(mut self, semantic_weight: f32, keyword_weight: f32) -> Self {
        self.semantic_weight = semantic_weight;
        self.keyword_weight = keyword_weight;
        self
    }

    pub fn with_filter(mut self, filter: DocumentFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl fmt::Debug for HybridSearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridSearchOptions")
            .field("limit", &self.limit)
            .field("semantic_weight", &self.semantic_weight)
            .field("keyword_weight", &self.keyword_weight)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// A semantic search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: VectorDocument,
    pub similarity: f32,
}

/// A hybrid search hit with both halves of its score.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridMatch {
    pub document: VectorDocument,
    /// `semantic_score * semantic_weight + keyword_score * keyword_weight`
    pub score: f32,
    pub semantic_score: f32,
    pub keyword_score: f32,
}

/// Aggregate counts for a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub document_count: usize,
    pub dimension: Option<usize>,
    pub by_dialect: BTreeMap<Dialect, usize>,
}

/// Serializable, self-contained copy of a store's contents.
///
/// `dimension` is 0 for a store that never received a vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub dimension: usize,
    pub documents: Vec<VectorDocument>,
}

/// Cosine similarity of two vectors.
///
/// Defined as 0 when either vector has zero magnitude or the lengths
/// differ, so the result is never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    dot / denominator
}

/// In-memory collection of vectorized documents.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    documents: BTreeMap<String, VectorDocument>,
    dimension: Option<usize>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Dimension established by the first insert, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// Insert a document, overwriting any document with the same id.
    ///
    /// An empty embedding is rejected; it would fix the dimension at zero.
    pub fn add(&mut self, document: VectorDocument) -> AppResult<()> {
        if document.embedding.is_empty() {
            return Err(empty_embedding(&document.id));
        }
        self.check_dimension(document.embedding.len())?;
        self.dimension.get_or_insert(document.embedding.len());
        self.documents.insert(document.id.clone(), document);
        Ok(())
    }

    /// Insert many documents. Either all are inserted or, on a dimension
    /// mismatch, none are.
    pub fn add_batch(&mut self, documents: Vec<VectorDocument>) -> AppResult<()> {
        let Some(first) = documents.first() else {
            return Ok(());
        };
        if let Some(empty) = documents.iter().find(|d| d.embedding.is_empty()) {
            return Err(empty_embedding(&empty.id));
        }

        let expected = self.dimension.unwrap_or(first.embedding.len());
        if let Some(bad) = documents.iter().find(|d| d.embedding.len() != expected) {
            tracing::error!(
                "Rejecting batch of {} documents: '{}' has dimension {}, store expects {}",
                documents.len(),
                bad.id,
                bad.embedding.len(),
                expected
            );
            return Err(AppError::DimensionMismatch {
                expected,
                actual: bad.embedding.len(),
            });
        }

        self.dimension = Some(expected);
        for document in documents {
            self.documents.insert(document.id.clone(), document);
        }
        Ok(())
    }

    /// Remove a document. Returns false when the id is absent.
    ///
    /// Chunks referring to the removed document are left in place.
    pub fn remove(&mut self, id: &str) -> bool {
        self.documents.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&VectorDocument> {
        self.documents.get(id)
    }

    /// Resolve a chunk's parent reference, if the parent is stored.
    pub fn parent_of(&self, document: &VectorDocument) -> Option<&VectorDocument> {
        let link = document.metadata.chunk.as_ref()?;
        self.documents.get(link.original_document_id.as_str())
    }

    pub fn documents(&self) -> impl Iterator<Item = &VectorDocument> {
        self.documents.values()
    }

    /// Rank documents by cosine similarity to `query`.
    ///
    /// Results at or above the threshold are sorted descending and truncated
    /// to the limit. A query whose length differs from the store dimension
    /// matches nothing.
    pub fn search(&self, query: &[f32], options: &SearchOptions) -> Vec<ScoredDocument> {
        if !self.accepts_query(query) {
            return Vec::new();
        }

        let mut results: Vec<ScoredDocument> = self
            .candidates(options.filter.as_ref())
            .map(|document| ScoredDocument {
                similarity: cosine_similarity(query, &document.embedding),
                document: document.clone(),
            })
            .filter(|scored| scored.similarity >= options.threshold)
            .collect();

        results.sort_by(|a, b| descending(a.similarity, b.similarity));
        results.truncate(options.limit);

        tracing::debug!(
            "Semantic search returned {} of {} documents",
            results.len(),
            self.documents.len()
        );

        results
    }

    /// Rank documents by a weighted sum of cosine similarity and keyword score.
    pub fn hybrid_search(
        &self,
        query: &[f32],
        query_text: &str,
        options: &HybridSearchOptions,
    ) -> Vec<HybridMatch> {
        if !self.accepts_query(query) {
            return Vec::new();
        }

        let query_tokens = keyword::tokenize(query_text);

        let mut results: Vec<HybridMatch> = self
            .candidates(options.filter.as_ref())
            .map(|document| {
                let semantic_score = cosine_similarity(query, &document.embedding);
                let keyword_score =
                    keyword::score_tokens(&query_tokens, &keyword::tokenize(&document.text));
                HybridMatch {
                    score: semantic_score * options.semantic_weight
                        + keyword_score * options.keyword_weight,
                    semantic_score,
                    keyword_score,
                    document: document.clone(),
                }
            })
            .collect();

        results.sort_by(|a, b| descending(a.score, b.score));
        results.truncate(options.limit);

        tracing::debug!(
            "Hybrid search returned {} results (weights {:.2}/{:.2})",
            results.len(),
            options.semantic_weight,
            options.keyword_weight
        );

        results
    }

    pub fn stats(&self) -> StoreStats {
        let mut by_dialect = BTreeMap::new();
        for document in self.documents.values() {
            *by_dialect.entry(document.metadata.dialect).or_insert(0) += 1;
        }

        StoreStats {
            document_count: self.documents.len(),
            dimension: self.dimension,
            by_dialect,
        }
    }

    /// Copy the full contents into a snapshot.
    pub fn export(&self) -> StoreSnapshot {
        StoreSnapshot {
            dimension: self.dimension.unwrap_or(0),
            documents: self.documents.values().cloned().collect(),
        }
    }

    /// Replace the store's contents with a snapshot.
    ///
    /// The snapshot is validated first; an inconsistent snapshot leaves the
    /// store unchanged.
    pub fn import(&mut self, snapshot: StoreSnapshot) -> AppResult<()> {
        validate_snapshot(&snapshot)?;

        let count = snapshot.documents.len();
        self.documents = snapshot
            .documents
            .into_iter()
            .map(|document| (document.id.clone(), document))
            .collect();
        self.dimension = (snapshot.dimension > 0).then_some(snapshot.dimension);

        tracing::info!(
            "Imported {} documents (dimension {})",
            count,
            snapshot.dimension
        );
        Ok(())
    }

    pub fn export_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(&self.export())?)
    }

    pub fn import_json(&mut self, json: &str) -> AppResult<()> {
        let snapshot: StoreSnapshot = serde_json::from_str(json)
            .map_err(|e| AppError::Snapshot(format!("Malformed snapshot: {}", e)))?;
        self.import(snapshot)
    }

    /// Drop every document and forget the dimension.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.dimension = None;
    }

    fn check_dimension(&self, actual: usize) -> AppResult<()> {
        match self.dimension {
            Some(expected) if expected != actual => {
                tracing::error!(
                    "Embedding dimension mismatch: store expects {}, got {}",
                    expected,
                    actual
                );
                Err(AppError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    fn accepts_query(&self, query: &[f32]) -> bool {
        match self.dimension {
            Some(dimension) if dimension != query.len() => {
                tracing::warn!(
                    "Query vector has dimension {}, store has {}; no results",
                    query.len(),
                    dimension
                );
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    fn candidates<'a>(
        &'a self,
        filter: Option<&'a DocumentFilter>,
    ) -> impl Iterator<Item = &'a VectorDocument> + 'a {
        self.documents
            .values()
            .filter(move |document| filter.map_or(true, |f| f(*document)))
    }
}

fn empty_embedding(id: &str) -> AppError {
    tracing::error!("Rejecting document '{}': empty embedding", id);
    AppError::Embedding(format!("Document '{}' has an empty embedding", id))
}

fn descending(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn validate_snapshot(snapshot: &StoreSnapshot) -> AppResult<()> {
    if snapshot.dimension == 0 {
        if let Some(document) = snapshot.documents.first() {
            return Err(AppError::Snapshot(format!(
                "Snapshot has no dimension but contains document '{}'",
                document.id
            )));
        }
        return Ok(());
    }

    for document in &snapshot.documents {
        if document.embedding.len() != snapshot.dimension {
            return Err(AppError::Snapshot(format!(
                "Document '{}' has dimension {}, snapshot declares {}",
                document.id,
                document.embedding.len(),
                snapshot.dimension
            )));
        }
    }

    Ok(())
}
