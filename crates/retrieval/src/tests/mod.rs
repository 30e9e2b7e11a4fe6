//! Behavioural tests across the store, chunker, fallback and orchestrator.


use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingProvider;
use crate::fallback::KeywordRetrievalService;
use crate::service::RetrievalService;
use crate::types::{Dialect, ReferenceDoc};
use querywise_core::{AppError, AppResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Provider whose dimensions are fixed topic words: component `i` is 1.0
/// when the text mentions `axes[i]`. Availability and failures are
/// switchable at runtime.
#[derive(Debug)]
pub(crate) struct AxisProvider {
    axes: Vec<&'static str>,
    available: AtomicBool,
    failing: AtomicBool,
    batch_calls: AtomicUsize,
}

impl AxisProvider {
    pub(crate) fn new(axes: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            axes: axes.to_vec(),
            available: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            batch_calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn unavailable(axes: &[&'static str]) -> Arc<Self> {
        let provider = Self::new(axes);
        provider.set_available(false);
        provider
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn vector_for(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.axes
            .iter()
            .map(|axis| if lower.contains(axis) { 1.0 } else { 0.0 })
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for AxisProvider {
    fn provider_name(&self) -> &str {
        "axis"
    }

    fn model_name(&self) -> &str {
        "axis-test"
    }

    fn dimensions(&self) -> usize {
        self.axes.len()
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("connection reset by peer".to_string()));
        }
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

pub(crate) const AXES: &[&str] = &["index", "replication", "vacuum", "lock"];

pub(crate) fn service_with(
    provider: Arc<AxisProvider>,
    config: RetrievalConfig,
    fallback: Vec<ReferenceDoc>,
) -> RetrievalService {
    RetrievalService::new(config, provider, KeywordRetrievalService::new(fallback))
}

pub(crate) fn reference(title: &str, content: &str, dialect: Dialect) -> ReferenceDoc {
    ReferenceDoc::new(title, content, "test-corpus", dialect)
}

/// Small corpus with one document per dialect tag.
pub(crate) fn dialect_corpus() -> Vec<ReferenceDoc> {
    vec![
        reference(
            "MySQL index hints",
            "USE INDEX and FORCE INDEX steer the MySQL optimizer.",
            Dialect::Mysql,
        )
        .with_keywords(["index", "hint"]),
        reference(
            "MariaDB index statistics",
            "Engine-independent index statistics in MariaDB.",
            Dialect::Mariadb,
        )
        .with_keywords(["index", "statistics"]),
        reference(
            "Index design basics",
            "Index the columns used in selective predicates.",
            Dialect::General,
        )
        .with_keywords(["index", "design"]),
    ]
}
