//! Command handlers for the Querywise CLI.

pub mod index;
pub mod retrieve;
pub mod stats;

pub use index::IndexCommand;
pub use retrieve::RetrieveCommand;
pub use stats::StatsCommand;

use querywise_core::{config::AppConfig, AppResult};
use querywise_retrieval::{
    config, corpus, create_provider, snapshot, KeywordRetrievalService, RetrievalService,
};

/// Build the service for a workspace: configured provider, bundled plus
/// indexed corpus for keyword retrieval, and the persisted snapshot.
pub(crate) async fn open_service(app: &AppConfig) -> AppResult<RetrievalService> {
    let retrieval_config = config::load_config(&app.workspace)?;
    let provider = create_provider(&retrieval_config.embedding)?;

    let mut documents = corpus::builtin_documents();
    documents.extend(snapshot::load_corpus(&config::get_corpus_path(&app.workspace))?);
    let fallback = KeywordRetrievalService::new(documents);

    let service = RetrievalService::new(retrieval_config, provider, fallback);
    service.initialize().await;

    let snapshot_path = config::get_snapshot_path(&app.workspace);
    if service.warm_from(&snapshot_path).await? {
        tracing::debug!("Warmed vector store from {:?}", snapshot_path);
    }

    Ok(service)
}

pub(crate) fn print_json(value: &impl serde::Serialize) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
