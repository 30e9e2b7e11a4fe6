//! Retrieval type definitions.

use querywise_core::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Database dialect a document is most relevant to.
///
/// `General` is the wildcard: such documents apply regardless of dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Mysql,
    Mariadb,
    Postgresql,
    General,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Mysql,
        Dialect::Mariadb,
        Dialect::Postgresql,
        Dialect::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Mariadb => "mariadb",
            Dialect::Postgresql => "postgresql",
            Dialect::General => "general",
        }
    }

    /// Whether a document tagged `self` may be served for a query in `requested`.
    pub fn serves(&self, requested: Dialect) -> bool {
        *self == requested || *self == Dialect::General
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(Dialect::Mysql),
            "mariadb" => Ok(Dialect::Mariadb),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::Postgresql),
            "general" | "any" => Ok(Dialect::General),
            other => Err(AppError::Config(format!(
                "Unknown dialect: '{}'. Supported: mysql, mariadb, postgresql, general",
                other
            ))),
        }
    }
}

/// A source document before indexing: curated reference documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDoc {
    /// Human-readable title
    pub title: String,

    /// Full document text
    pub content: String,

    /// Where the document came from (URL, file path, corpus name)
    pub source: String,

    /// Dialect affinity
    pub dialect: Dialect,

    /// Curated keywords used by keyword-only retrieval
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ReferenceDoc {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        dialect: Dialect,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: source.into(),
            dialect,
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Stable, content-derived identity used to deduplicate indexing.
    pub fn content_id(&self) -> String {
        content_id(&self.title, &self.source)
    }
}

/// Hash of title and source, shortened to a readable id.
pub fn content_id(title: &str, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(source.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("doc_{}", &digest[..16])
}

/// Id of the `index`-th chunk of the document with id `parent`.
pub fn chunk_id(parent: &str, index: usize) -> String {
    format!("{}_chunk_{}", parent, index)
}

/// Non-owning reference from a chunk to the document it was cut from.
///
/// This is a lookup key only. The parent may never have been stored on its
/// own, or may have been removed; resolving it can yield nothing, and
/// removing the parent never removes its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentRef(String);

impl ParentRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Provenance of a chunk within its parent document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkLink {
    /// 0-based position of the chunk
    pub chunk_index: usize,

    /// Number of chunks the parent was split into
    pub total_chunks: usize,

    /// Weak reference to the parent document
    pub original_document_id: ParentRef,
}

/// Strongly-typed metadata carried by every indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,

    pub source: String,

    pub dialect: Dialect,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Present only when the document is a fragment of a larger source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkLink>,

    /// Open-ended string attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl DocumentMetadata {
    pub fn from_reference(doc: &ReferenceDoc) -> Self {
        Self {
            title: doc.title.clone(),
            source: doc.source.clone(),
            dialect: doc.dialect,
            keywords: doc.keywords.clone(),
            chunk: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn is_chunk(&self) -> bool {
        self.chunk.is_some()
    }
}

/// A unit stored in the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    /// Unique within one store; inserting an existing id overwrites it
    pub id: String,

    /// Text used for keyword scoring
    pub text: String,

    /// Embedding, stored exactly as given
    pub embedding: Vec<f32>,

    pub metadata: DocumentMetadata,
}

/// A document handed back to the caller of a relevance query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedDoc {
    pub title: String,

    pub content: String,

    pub source: String,

    pub dialect: Dialect,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkLink>,

    /// The score the ranking actually used
    pub relevance_score: f32,

    /// Cosine similarity, when semantic search produced this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_score: Option<f32>,

    /// Keyword half of the hybrid score, when semantic search produced this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_score: Option<f32>,
}

/// Outcome of an indexing call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    /// Documents handed to the call
    pub documents_seen: usize,

    /// Documents already present (same content id)
    pub duplicates_skipped: usize,

    /// Documents routed through the chunker
    pub documents_chunked: usize,

    /// Chunk documents produced by the chunker
    pub chunks_created: usize,

    /// Vector documents inserted into the store
    pub vectors_inserted: usize,

    /// The call did nothing because semantic search is unavailable
    pub skipped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_parse() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::Mysql);
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::Postgresql);
        assert_eq!("general".parse::<Dialect>().unwrap(), Dialect::General);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_dialect_serves() {
        assert!(Dialect::Mysql.serves(Dialect::Mysql));
        assert!(Dialect::General.serves(Dialect::Mysql));
        assert!(!Dialect::Mariadb.serves(Dialect::Mysql));
        assert!(!Dialect::Mysql.serves(Dialect::General));
    }

    #[test]
    fn test_content_id_is_stable() {
        let a = content_id("Indexes", "mysql-docs");
        let b = content_id("Indexes", "mysql-docs");
        let c = content_id("Indexes", "pg-docs");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("doc_"));
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn test_chunk_id() {
        assert_eq!(chunk_id("doc_abc", 2), "doc_abc_chunk_2");
    }

    #[test]
    fn test_metadata_serialization_shape() {
        let metadata = DocumentMetadata {
            title: "Covering indexes".to_string(),
            source: "mysql-docs".to_string(),
            dialect: Dialect::Mysql,
            keywords: vec![],
            chunk: Some(ChunkLink {
                chunk_index: 1,
                total_chunks: 3,
                original_document_id: ParentRef::new("doc_1234"),
            }),
            extra: BTreeMap::new(),
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["dialect"], "mysql");
        assert_eq!(json["chunk"]["chunkIndex"], 1);
        assert_eq!(json["chunk"]["originalDocumentId"], "doc_1234");
        assert!(json.get("keywords").is_none());
        assert!(metadata.is_chunk());
    }
}
