//! On-disk persistence of vector store snapshots and indexed corpora.
//!
//! Snapshots are written to a temporary sibling and renamed into place so a
//! crash mid-write never leaves a truncated file behind.

use crate::types::ReferenceDoc;
use crate::vector_store::StoreSnapshot;
use querywise_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write a store snapshot as JSON, creating parent directories.
pub fn save_snapshot(path: &Path, snapshot: &StoreSnapshot) -> AppResult<()> {
    write_json(path, snapshot)?;
    tracing::info!(
        "Saved snapshot of {} documents to {:?}",
        snapshot.documents.len(),
        path
    );
    Ok(())
}

/// Read a store snapshot. A missing file yields `None` (cold start); an
/// unreadable or malformed one is a `Snapshot` error.
pub fn load_snapshot(path: &Path) -> AppResult<Option<StoreSnapshot>> {
    read_json(path)
}

/// Persist the reference documents that were indexed.
pub fn save_corpus(path: &Path, documents: &[ReferenceDoc]) -> AppResult<()> {
    write_json(path, documents)?;
    tracing::debug!("Saved {} corpus documents to {:?}", documents.len(), path);
    Ok(())
}

pub fn load_corpus(path: &Path) -> AppResult<Vec<ReferenceDoc>> {
    Ok(read_json::<Vec<ReferenceDoc>>(path)?.unwrap_or_default())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| AppError::Snapshot(format!("Failed to write {:?}: {}", path, e)))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<Option<T>> {
    if !path.exists() {
        tracing::debug!("No file at {:?}, starting cold", path);
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Snapshot(format!("Failed to read {:?}: {}", path, e)))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| AppError::Snapshot(format!("Malformed file {:?}: {}", path, e)))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dialect, DocumentMetadata, VectorDocument};
    use tempfile::TempDir;

    fn sample_snapshot() -> StoreSnapshot {
        let reference = ReferenceDoc::new("Indexes", "B-tree indexes", "test", Dialect::Mysql);
        StoreSnapshot {
            dimension: 2,
            documents: vec![VectorDocument {
                id: reference.content_id(),
                text: reference.content.clone(),
                embedding: vec![0.25, -0.75],
                metadata: DocumentMetadata::from_reference(&reference),
            }],
        }
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index").join("vectors.json");

        save_snapshot(&path, &sample_snapshot()).unwrap();
        let loaded = load_snapshot(&path).unwrap().unwrap();

        assert_eq!(loaded, sample_snapshot());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_snapshot_is_cold_start() {
        let temp = TempDir::new().unwrap();
        assert!(load_snapshot(&temp.path().join("absent.json")).unwrap().is_none());
        assert!(load_corpus(&temp.path().join("absent.json")).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_snapshot_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vectors.json");
        fs::write(&path, "{\"dimension\": 2, \"documents\": [").unwrap();

        assert!(matches!(load_snapshot(&path), Err(AppError::Snapshot(_))));
    }

    #[test]
    fn test_corpus_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("corpus.json");
        let documents = vec![
            ReferenceDoc::new("Vacuum", "Autovacuum tuning", "pg", Dialect::Postgresql)
                .with_keywords(["vacuum", "bloat"]),
        ];

        save_corpus(&path, &documents).unwrap();
        assert_eq!(load_corpus(&path).unwrap(), documents);
    }
}
