use std::sync::Arc;

use ctcae_bedrock::client::build_client;
use ctcae_bedrock::converse::ConverseCompleter;
use ctcae_bedrock::embed::TitanEmbedder;
use ctcae_core::service::{Completer, Embedder};
use ctcae_search::build::Indexer;
use ctcae_search::index::VectorIndex;

use crate::config::MatcherConfig;

/// Bedrock-backed embedder and completer for the configured models.
pub async fn bedrock_services(config: &MatcherConfig) -> (Arc<dyn Embedder>, Arc<dyn Completer>) {
    let client = build_client(&config.region).await;
    let embedder = TitanEmbedder::new(client.clone(), config.embedding_model());
    let completer = ConverseCompleter::new(client, &config.completion.model_id);
    (Arc::new(embedder), Arc::new(completer))
}

/// Indexer writing into `index` with the configured embedding concurrency.
pub fn indexer(
    config: &MatcherConfig,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
) -> Indexer {
    Indexer::new(index, embedder).with_concurrency(config.embed_concurrency)
}
