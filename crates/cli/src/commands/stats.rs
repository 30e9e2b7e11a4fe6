//! Stats command handler.

use super::{open_service, print_json};
use clap::Args;
use querywise_core::{config::AppConfig, AppResult};

/// Show index and retrieval statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, app: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = open_service(app).await?.stats().await;

        if self.json {
            return print_json(&stats);
        }

        println!("Mode:        {}", stats.mode);
        println!("Provider:    {} ({})", stats.provider, stats.model);
        println!("Vectors:     {}", stats.store.document_count);
        match stats.store.dimension {
            Some(dimension) => println!("Dimension:   {}", dimension),
            None => println!("Dimension:   (not set)"),
        }
        for (dialect, count) in &stats.store.by_dialect {
            println!("  {:<11} {}", dialect.as_str(), count);
        }
        println!("Keyword docs: {}", stats.fallback_documents);
        match stats.last_indexed_at {
            Some(at) => println!("Last indexed: {}", at.to_rfc3339()),
            None => println!("Last indexed: never (this session)"),
        }

        Ok(())
    }
}
