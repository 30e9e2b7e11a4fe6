//! Reference corpora: the bundled notes and directory loading.

use crate::types::{Dialect, ReferenceDoc};
use querywise_core::{AppError, AppResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

const BUILTIN_SOURCE: &str = "querywise-builtin";

/// Curated optimisation notes shipped with the engine.
pub fn builtin_documents() -> Vec<ReferenceDoc> {
    let notes: &[(&str, Dialect, &str, &[&str])] = &[
        (
            "MySQL index selection and EXPLAIN",
            Dialect::Mysql,
            "InnoDB stores rows in a clustered index ordered by the primary key; secondary \
             indexes store the primary key value as the row pointer. Use EXPLAIN or EXPLAIN \
             ANALYZE to check the chosen access type: 'ALL' means a full scan, 'ref' and \
             'range' mean an index is used. A composite index serves queries that filter on a \
             leftmost prefix of its columns. Wrapping an indexed column in a function \
             prevents index use unless a functional index exists (MySQL 8.0.13+).",
            &["index", "explain", "innodb", "composite", "performance"],
        ),
        (
            "MySQL slow query log and performance_schema",
            Dialect::Mysql,
            "Enable slow_query_log with long_query_time to capture statements above a latency \
             threshold. log_queries_not_using_indexes surfaces scans. The sys schema views \
             statements_with_full_table_scans and statement_analysis summarise \
             performance_schema digests without parsing logs.",
            &["slow", "latency", "performance", "profiling", "digest"],
        ),
        (
            "MySQL join optimisation",
            Dialect::Mysql,
            "MySQL 8.0.18+ can execute equi-joins with hash join when no index applies; \
             otherwise nested-loop joins probe the inner table per outer row, so the join \
             column of the inner table needs an index. STRAIGHT_JOIN forces table order when \
             the optimizer misestimates cardinality. Keep join column types and collations \
             identical or the index is ignored.",
            &["join", "hash", "nested", "optimizer", "cardinality"],
        ),
        (
            "MariaDB optimizer switches and histograms",
            Dialect::Mariadb,
            "MariaDB collects engine-independent statistics with ANALYZE TABLE ... PERSISTENT \
             FOR ALL; histograms on non-indexed columns improve selectivity estimates for \
             range and join conditions. optimizer_switch flags such as \
             'condition_pushdown_for_derived' and 'split_materialized' change plan shapes; \
             ANALYZE FORMAT=JSON shows actual row counts per step.",
            &["optimizer", "histogram", "statistics", "selectivity", "analyze"],
        ),
        (
            "MariaDB thread pool and connection handling",
            Dialect::Mariadb,
            "The MariaDB thread pool (thread_handling=pool-of-threads) limits concurrently \
             executing statements and protects the server under many short connections. Tune \
             thread_pool_size to the number of CPU cores and watch \
             Threadpool_threads in status variables.",
            &["thread", "pool", "connection", "concurrency"],
        ),
        (
            "PostgreSQL EXPLAIN ANALYZE and planner statistics",
            Dialect::Postgresql,
            "EXPLAIN (ANALYZE, BUFFERS) executes the statement and reports actual rows, loops \
             and shared buffer hits per node. Large gaps between estimated and actual rows \
             point at stale or insufficient statistics: run ANALYZE, raise \
             default_statistics_target, or create extended statistics for correlated \
             columns.",
            &["explain", "planner", "statistics", "analyze", "estimate"],
        ),
        (
            "PostgreSQL index types",
            Dialect::Postgresql,
            "B-tree serves equality and range predicates and ORDER BY. GIN indexes \
             containment on jsonb, arrays and full-text search; GiST and SP-GiST handle \
             geometric and range types; BRIN suits very large, naturally ordered tables such \
             as append-only time series. Partial indexes (WHERE clause) and expression \
             indexes keep hot subsets small. CREATE INDEX CONCURRENTLY avoids blocking \
             writes.",
            &["index", "btree", "gin", "brin", "partial", "performance"],
        ),
        (
            "PostgreSQL vacuum and bloat",
            Dialect::Postgresql,
            "MVCC leaves dead tuples behind every UPDATE and DELETE. Autovacuum reclaims them \
             and refreshes visibility maps that enable index-only scans. Tables with heavy \
             churn need lower autovacuum_vacuum_scale_factor; long-running transactions hold \
             back the xmin horizon and stop cleanup entirely.",
            &["vacuum", "bloat", "mvcc", "autovacuum", "transaction"],
        ),
        (
            "Avoiding SELECT * and over-fetching",
            Dialect::General,
            "Selecting only needed columns reduces I/O and network transfer and lets covering \
             indexes answer a query without touching the base table. Paginate with keyset \
             pagination (WHERE id > last_seen ORDER BY id LIMIT n) instead of large OFFSET \
             values, which read and discard every skipped row.",
            &["covering", "pagination", "offset", "limit", "performance"],
        ),
        (
            "Sargable predicates",
            Dialect::General,
            "A predicate is sargable when the engine can use an index to satisfy it. Avoid \
             functions or arithmetic on the indexed side (WHERE DATE(created_at) = ...), \
             leading wildcards (LIKE '%term'), and implicit type conversions. Rewrite to \
             ranges such as created_at >= '2024-01-01' AND created_at < '2024-01-02'.",
            &["sargable", "predicate", "index", "wildcard", "function"],
        ),
        (
            "N+1 queries and batching",
            Dialect::General,
            "Issuing one statement per parent row multiplies round trips. Fetch children with \
             a single JOIN or an IN list, or batch lookups in the application layer. Prepared \
             statements cut parse overhead for statements that must repeat.",
            &["batching", "round", "trip", "join", "prepared"],
        ),
        (
            "Locking and long transactions",
            Dialect::General,
            "Long transactions hold row locks and old row versions, causing lock waits, \
             deadlocks and growing undo or bloat. Keep transactions short, touch rows in a \
             consistent order, and index the columns used to locate rows in UPDATE and \
             DELETE so fewer rows are locked.",
            &["locking", "deadlock", "transaction", "contention"],
        ),
    ];

    notes
        .iter()
        .map(|(title, dialect, content, keywords)| {
            ReferenceDoc::new(*title, *content, BUILTIN_SOURCE, *dialect)
                .with_keywords(keywords.iter().copied())
        })
        .collect()
}

/// Load `.md` and `.txt` files under `root` as reference documents.
///
/// The title is the first markdown heading, or the file stem. The dialect
/// comes from the nearest parent directory named after one, else general.
/// A line starting with `Keywords:` supplies comma-separated keywords and
/// is removed from the content.
pub fn load_corpus_dir(root: &Path) -> AppResult<Vec<ReferenceDoc>> {
    if !root.exists() {
        return Err(AppError::Config(format!(
            "Corpus path does not exist: {:?}",
            root
        )));
    }

    // A single file is its own corpus, relative to its directory
    let base = if root.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    };
    let mut documents = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !is_corpus_file(path) {
            continue;
        }

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping unreadable file {:?}: {}", path, e);
                continue;
            }
        };

        match parse_document(path, base, &raw) {
            Some(document) => documents.push(document),
            None => tracing::debug!("Skipping empty file {:?}", path),
        }
    }

    tracing::info!("Loaded {} documents from {:?}", documents.len(), root);
    Ok(documents)
}

fn is_corpus_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("markdown") | Some("txt")
    )
}

fn parse_document(path: &Path, base: &Path, raw: &str) -> Option<ReferenceDoc> {
    let mut keywords = Vec::new();
    let mut body = Vec::new();

    for line in raw.lines() {
        match line.trim().strip_prefix("Keywords:") {
            Some(list) if keywords.is_empty() => {
                keywords = list
                    .split(',')
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
            }
            _ => body.push(line),
        }
    }

    let content = body.join("\n").trim().to_string();
    if content.is_empty() {
        return None;
    }

    let title = content
        .lines()
        .find_map(|line| line.trim().strip_prefix("# "))
        .map(|heading| heading.trim().to_string())
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "Untitled".to_string());

    let source = path
        .strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned();

    Some(
        ReferenceDoc::new(title, content, source, dialect_of(path, base))
            .with_keywords(keywords),
    )
}

fn dialect_of(path: &Path, base: &Path) -> Dialect {
    path.ancestors()
        .skip(1)
        .take_while(|dir| dir.starts_with(base))
        .filter_map(|dir| dir.file_name()?.to_str()?.parse::<Dialect>().ok())
        .next()
        .unwrap_or(Dialect::General)
}
