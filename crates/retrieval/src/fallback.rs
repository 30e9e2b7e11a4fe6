//! Keyword-only retrieval.
//!
//! A complete relevance engine that never needs embeddings. Documents are
//! ranked by how well their curated keyword lists match the keywords
//! extracted from a query.

use crate::types::{Dialect, ReferenceDoc, RetrievedDoc};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Points for a query keyword equal to a document keyword.
pub const EXACT_MATCH_SCORE: f32 = 10.0;

/// Points for a keyword contained in the other (either direction).
pub const CONTAINMENT_SCORE: f32 = 5.0;

/// Points for keywords equal once a trailing `s` is stripped.
pub const STEM_MATCH_SCORE: f32 = 3.0;

/// English filler plus SQL noise that says nothing about the topic.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "how", "what", "when", "where", "which", "who", "why",
    "with", "this", "that", "these", "those", "from", "into", "onto", "than", "then", "there",
    "their", "them", "they", "will", "would", "should", "could", "been", "being", "does", "did",
    "doing", "its", "it's", "about", "over", "under", "more", "most", "some", "such", "only",
    "very", "just", "also", "get", "use", "using", "make", "need", "want", "my", "is", "it",
    "in", "on", "at", "to", "of", "or", "an", "a", "be", "by", "as", "do", "if", "so", "we",
    // SQL noise
    "select", "from", "where", "table", "tables", "query", "queries", "sql", "database", "row",
    "rows", "column", "columns", "value", "values", "insert", "update", "delete", "set",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static STOP: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Lower-case, split on word boundaries, drop stop words and tokens of
/// length <= 2. Duplicates are kept once, in first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let stop = stop_words();
    let mut seen = HashSet::new();

    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 2 && !stop.contains(token))
        .filter(|token| seen.insert(token.to_string()))
        .map(str::to_string)
        .collect()
}

/// Score one query keyword against one document keyword.
fn pair_score(query_keyword: &str, doc_keyword: &str) -> f32 {
    if query_keyword == doc_keyword {
        EXACT_MATCH_SCORE
    } else if query_keyword.contains(doc_keyword) || doc_keyword.contains(query_keyword) {
        CONTAINMENT_SCORE
    } else if stem(query_keyword) == stem(doc_keyword) {
        STEM_MATCH_SCORE
    } else {
        0.0
    }
}

fn stem(word: &str) -> &str {
    word.strip_suffix('s').unwrap_or(word)
}

/// Sum of pair scores over all keyword pairs, divided by the square root
/// of the document's keyword count. A document without keywords scores 0.
pub fn score_keywords(query_keywords: &[String], doc_keywords: &[String]) -> f32 {
    if query_keywords.is_empty() || doc_keywords.is_empty() {
        return 0.0;
    }

    let total: f32 = query_keywords
        .iter()
        .flat_map(|q| doc_keywords.iter().map(move |d| pair_score(q, d)))
        .sum();

    total / (doc_keywords.len() as f32).sqrt()
}

/// A keyword-only hit.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub document: ReferenceDoc,
    pub score: f32,
}

impl From<KeywordMatch> for RetrievedDoc {
    fn from(hit: KeywordMatch) -> Self {
        let ReferenceDoc {
            title,
            content,
            source,
            dialect,
            keywords,
        } = hit.document;

        RetrievedDoc {
            title,
            content,
            source,
            dialect,
            keywords,
            chunk: None,
            relevance_score: hit.score,
            semantic_score: None,
            keyword_score: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    document: ReferenceDoc,
    /// Normalized keywords: the curated list, or keywords from the title
    keywords: Vec<String>,
}

impl Entry {
    fn new(document: ReferenceDoc) -> Self {
        let keywords = if document.keywords.is_empty() {
            extract_keywords(&document.title)
        } else {
            document
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self { document, keywords }
    }
}

/// Relevance engine over a curated reference corpus, no embeddings needed.
#[derive(Debug, Clone, Default)]
pub struct KeywordRetrievalService {
    entries: Vec<Entry>,
}

impl KeywordRetrievalService {
    pub fn new(documents: Vec<ReferenceDoc>) -> Self {
        let mut service = Self::default();
        service.add_documents(documents);
        service
    }

    pub fn document_count(&self) -> usize {
        self.entries.len()
    }

    pub fn add_documents(&mut self, documents: impl IntoIterator<Item = ReferenceDoc>) {
        self.entries.extend(documents.into_iter().map(Entry::new));
    }

    /// Score a document's keywords against a query.
    pub fn score_document(&self, query: &str, document: &ReferenceDoc) -> f32 {
        score_keywords(&extract_keywords(query), &Entry::new(document.clone()).keywords)
    }

    /// Documents with a positive score, best first, at most `max_docs`.
    ///
    /// Documents tagged with the requested dialect are ranked ahead of
    /// general documents on equal scores. Documents tagged with another
    /// dialect are never returned.
    pub fn retrieve(&self, query: &str, dialect: Dialect, max_docs: usize) -> Vec<KeywordMatch> {
        let query_keywords = extract_keywords(query);
        if query_keywords.is_empty() {
            tracing::debug!("No keywords extracted from query '{}'", query);
            return Vec::new();
        }

        let mut hits: Vec<KeywordMatch> = self
            .candidates(dialect)
            .filter_map(|entry| {
                let score = score_keywords(&query_keywords, &entry.keywords);
                (score > 0.0).then(|| KeywordMatch {
                    document: entry.document.clone(),
                    score,
                })
            })
            .collect();

        // Stable: candidate order breaks ties
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(max_docs);

        tracing::debug!(
            "Keyword retrieval: {} hits for {:?} ({})",
            hits.len(),
            query_keywords,
            dialect
        );

        hits
    }

    /// Dialect-specific entries first, then the general pool.
    fn candidates(&self, dialect: Dialect) -> impl Iterator<Item = &Entry> + '_ {
        let specific = self
            .entries
            .iter()
            .filter(move |e| dialect != Dialect::General && e.document.dialect == dialect);
        let general = self
            .entries
            .iter()
            .filter(|e| e.document.dialect == Dialect::General);
        specific.chain(general)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, dialect: Dialect, keywords: &[&str]) -> ReferenceDoc {
        ReferenceDoc::new(title, format!("{} content", title), "test", dialect)
            .with_keywords(keywords.iter().copied())
    }

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords("SELECT * FROM orders WHERE the index is missing on ID");
        assert_eq!(keywords, vec!["orders", "index", "missing"]);
    }

    #[test]
    fn test_extract_keywords_dedupes() {
        assert_eq!(extract_keywords("index INDEX Index"), vec!["index"]);
        assert!(extract_keywords("how to do it").is_empty());
    }

    #[test]
    fn test_extract_keywords_counts_characters() {
        assert_eq!(extract_keywords("索引 优化器"), vec!["优化器"]);
        assert_eq!(extract_keywords("çé índice"), vec!["índice"]);
    }

    #[test]
    fn test_pair_scores() {
        assert_eq!(pair_score("index", "index"), EXACT_MATCH_SCORE);
        assert_eq!(pair_score("index", "indexes"), CONTAINMENT_SCORE);
        assert_eq!(pair_score("covering", "cover"), CONTAINMENT_SCORE);
        assert_eq!(pair_score("joins", "join"), CONTAINMENT_SCORE);
        assert_eq!(pair_score("locks", "lock"), CONTAINMENT_SCORE);
        assert_eq!(pair_score("vacuum", "analyze"), 0.0);
    }

    #[test]
    fn test_stem_strips_one_trailing_s() {
        assert_eq!(stem("locks"), "lock");
        assert_eq!(stem("stats"), "stat");
        assert_eq!(stem("index"), "index");
    }

    #[test]
    fn test_normalization_favours_focused_documents() {
        let query = extract_keywords("index");
        let focused = vec!["index".to_string()];
        let diffuse: Vec<String> = ["index", "locking", "replication", "backup"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(score_keywords(&query, &focused), 10.0);
        assert_eq!(score_keywords(&query, &diffuse), 5.0);
    }

    #[test]
    fn test_index_scenario() {
        let service = KeywordRetrievalService::default();
        let document = doc("Indexing", Dialect::General, &["index", "performance"]);

        assert!(service.score_document("how to add an index", &document) > 0.0);
        assert_eq!(service.score_document("unrelated topic", &document), 0.0);
    }

    #[test]
    fn test_title_keywords_when_none_curated() {
        let service = KeywordRetrievalService::new(vec![ReferenceDoc::new(
            "Partition pruning",
            "body",
            "test",
            Dialect::Postgresql,
        )]);

        let hits = service.retrieve("partition pruning not happening", Dialect::Postgresql, 5);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_dialect_documents_rank_first_on_ties() {
        let service = KeywordRetrievalService::new(vec![
            doc("General indexes", Dialect::General, &["index"]),
            doc("MySQL indexes", Dialect::Mysql, &["index"]),
            doc("MariaDB indexes", Dialect::Mariadb, &["index"]),
        ]);

        let hits = service.retrieve("index", Dialect::Mysql, 10);
        let titles: Vec<&str> = hits.iter().map(|h| h.document.title.as_str()).collect();
        assert_eq!(titles, vec!["MySQL indexes", "General indexes"]);
    }

    #[test]
    fn test_general_dialect_uses_general_pool() {
        let service = KeywordRetrievalService::new(vec![
            doc("General indexes", Dialect::General, &["index"]),
            doc("MySQL indexes", Dialect::Mysql, &["index"]),
        ]);

        let hits = service.retrieve("index", Dialect::General, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.dialect, Dialect::General);
    }

    #[test]
    fn test_sorted_and_truncated() {
        let service = KeywordRetrievalService::new(vec![
            doc("Weak", Dialect::General, &["indexes", "locking", "backup", "replication"]),
            doc("Strong", Dialect::General, &["index"]),
            doc("Medium", Dialect::General, &["index", "btree"]),
        ]);

        let hits = service.retrieve("index", Dialect::Mysql, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.title, "Strong");
        assert_eq!(hits[1].document.title, "Medium");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_no_keywords_or_no_overlap_is_empty() {
        let service =
            KeywordRetrievalService::new(vec![doc("Indexing", Dialect::General, &["index"])]);

        assert!(service.retrieve("select * from the table", Dialect::Mysql, 5).is_empty());
        assert!(service.retrieve("replication lag", Dialect::Mysql, 5).is_empty());
        assert!(service.retrieve("", Dialect::Mysql, 5).is_empty());
    }

    #[test]
    fn test_into_retrieved_doc() {
        let hit = KeywordMatch {
            document: doc("Indexing", Dialect::Mysql, &["index"]),
            score: 7.5,
        };
        let retrieved = RetrievedDoc::from(hit);

        assert_eq!(retrieved.relevance_score, 7.5);
        assert!(retrieved.semantic_score.is_none());
        assert!(retrieved.keyword_score.is_none());
        assert!(retrieved.chunk.is_none());
    }
}
