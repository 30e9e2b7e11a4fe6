//! Index command handler.

use super::{open_service, print_json};
use clap::Args;
use querywise_core::{config::AppConfig, AppResult};
use querywise_retrieval::{config, corpus, snapshot, IndexOptions, ReferenceDoc};
use std::collections::HashSet;
use std::path::PathBuf;

/// Index reference documents (the bundled corpus when no path is given)
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Files or directories of .md/.txt documents
    pub paths: Vec<PathBuf>,

    /// Clear the existing index first
    #[arg(long)]
    pub reset: bool,

    /// Override the configured maximum chunk size
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// Index oversized documents whole instead of chunking them
    #[arg(long)]
    pub no_chunking: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, app: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command");

        let documents = if self.paths.is_empty() {
            corpus::builtin_documents()
        } else {
            let mut documents = Vec::new();
            for path in &self.paths {
                documents.extend(corpus::load_corpus_dir(path)?);
            }
            documents
        };

        let service = open_service(app).await?;
        let corpus_path = config::get_corpus_path(&app.workspace);
        let mut indexed = snapshot::load_corpus(&corpus_path)?;

        if self.reset {
            service.reset_index().await;
            indexed.clear();
        }

        let options = IndexOptions {
            chunk_large_docs: self.no_chunking.then_some(false),
            max_chunk_size: self.max_chunk_size,
        };
        let report = service.index_documents(&documents, &options).await?;

        service
            .persist(&config::get_snapshot_path(&app.workspace))
            .await?;
        // Bundled documents are always loaded for keyword retrieval.
        if !self.paths.is_empty() {
            merge_corpus(&mut indexed, documents);
        }
        snapshot::save_corpus(&corpus_path, &indexed)?;

        if self.json {
            print_json(&report)?;
        } else if report.skipped {
            println!(
                "Semantic search unavailable: {} documents recorded for keyword retrieval only",
                report.documents_seen
            );
        } else {
            println!(
                "Indexed {} documents: {} vectors ({} chunked into {} chunks), {} already indexed",
                report.documents_seen,
                report.vectors_inserted,
                report.documents_chunked,
                report.chunks_created,
                report.duplicates_skipped
            );
        }

        Ok(())
    }
}

/// Append documents whose content id is not yet recorded.
fn merge_corpus(indexed: &mut Vec<ReferenceDoc>, documents: Vec<ReferenceDoc>) {
    let mut seen: HashSet<String> = indexed.iter().map(ReferenceDoc::content_id).collect();
    indexed.extend(
        documents
            .into_iter()
            .filter(|d| seen.insert(d.content_id())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use querywise_retrieval::Dialect;

    #[test]
    fn test_merge_corpus_skips_known_documents() {
        let a = ReferenceDoc::new("A", "alpha", "src", Dialect::Mysql);
        let b = ReferenceDoc::new("B", "beta", "src", Dialect::General);

        let mut indexed = vec![a.clone()];
        merge_corpus(&mut indexed, vec![a, b.clone(), b]);

        assert_eq!(indexed.len(), 2);
        assert_eq!(indexed[1].title, "B");
    }
}
