//! Retrieval configuration management.

use crate::chunk::ChunkConfig;
use crate::embeddings::EmbeddingConfig;
use crate::vector_store::{DEFAULT_KEYWORD_WEIGHT, DEFAULT_SEMANTIC_WEIGHT};
use querywise_core::config::STATE_DIR;
use querywise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Retrieval settings, persisted at `.querywise/retrieval.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Try semantic search when the provider is available
    #[serde(default = "default_true")]
    pub semantic_enabled: bool,

    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Documents returned per query unless the caller asks otherwise
    #[serde(default = "default_max_docs")]
    pub max_docs: usize,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Chunker settings plus whether oversized documents are chunked at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(flatten)]
    pub chunk: ChunkConfig,

    #[serde(default = "default_true")]
    pub chunk_large_docs: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            chunk_large_docs: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_semantic_weight() -> f32 {
    DEFAULT_SEMANTIC_WEIGHT
}

fn default_keyword_weight() -> f32 {
    DEFAULT_KEYWORD_WEIGHT
}

fn default_max_docs() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            semantic_enabled: true,
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            max_docs: default_max_docs(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Weights need not sum to 1; they only have to be usable numbers.
    pub fn validate(&self) -> AppResult<()> {
        for (name, weight) in [
            ("semantic_weight", self.semantic_weight),
            ("keyword_weight", self.keyword_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        self.chunking.chunk.validate()?;
        self.embedding.validate()
    }
}

/// Load retrieval configuration, falling back to defaults when the file
/// does not exist.
pub fn load_config(workspace: &Path) -> AppResult<RetrievalConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("Using default retrieval config (no config file found)");
        return Ok(RetrievalConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: RetrievalConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;
    config.validate()?;

    tracing::debug!("Loaded retrieval config from {:?}", config_path);
    Ok(config)
}

pub fn save_config(workspace: &Path, config: &RetrievalConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved retrieval config to {:?}", config_path);
    Ok(())
}

pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("retrieval.yaml")
}

pub fn get_index_dir(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("index")
}

/// Persisted vector store snapshot.
pub fn get_snapshot_path(workspace: &Path) -> PathBuf {
    get_index_dir(workspace).join("vectors.json")
}

/// Reference documents indexed so far, for the keyword-only service.
pub fn get_corpus_path(workspace: &Path) -> PathBuf {
    get_index_dir(workspace).join("corpus.json")
}
