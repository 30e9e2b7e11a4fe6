//! Retrieve command handler.

use super::{open_service, print_json};
use clap::Args;
use querywise_core::{config::AppConfig, AppResult};
use querywise_retrieval::{Dialect, RetrieveOptions};

/// Retrieve documents relevant to a query
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Query text (natural language or SQL)
    pub query: String,

    /// Database dialect (mysql, mariadb, postgresql, general)
    #[arg(short, long, default_value = "general")]
    pub dialect: Dialect,

    /// Number of documents to return (default from config)
    #[arg(short = 'k', long)]
    pub max_docs: Option<usize>,

    /// Skip semantic search for this query
    #[arg(long)]
    pub keyword_only: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, app: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command ({})", self.dialect);

        let service = open_service(app).await?;
        let max_docs = self.max_docs.unwrap_or(service.config().max_docs);
        let options = if self.keyword_only {
            RetrieveOptions::keyword_only()
        } else {
            RetrieveOptions::default()
        };

        let documents = service
            .retrieve_relevant_docs(&self.query, self.dialect, max_docs, &options)
            .await;

        if self.json {
            return print_json(&documents);
        }

        if documents.is_empty() {
            println!("No relevant documents found.");
            return Ok(());
        }

        for (i, doc) in documents.iter().enumerate() {
            let breakdown = match (doc.semantic_score, doc.keyword_score) {
                (Some(semantic), Some(keyword)) => {
                    format!(" (semantic {:.3}, keyword {:.3})", semantic, keyword)
                }
                _ => " (keyword-only)".to_string(),
            };
            println!(
                "{}. [{:.3}] {} [{}]{}",
                i + 1,
                doc.relevance_score,
                doc.title,
                doc.dialect,
                breakdown
            );
            println!("   {}", doc.source);
        }

        Ok(())
    }
}
