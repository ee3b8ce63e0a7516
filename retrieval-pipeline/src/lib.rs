pub mod answer_retrieval;
pub mod config;
pub mod corpus;
pub mod scoring;

use common::{
    storage::types::knowledge_entry::KnowledgeEntry,
    utils::embedding::{embed_or_unavailable, EmbeddingService},
};
use tracing::{debug, info, instrument};

pub use answer_retrieval::{ChatCompletionService, GenerationSettings, ResponseGenerator};
pub use config::RetrievalConfig;
pub use corpus::{CorpusCache, CorpusIndex, CorpusState};

/// Primary orchestrator for finding the knowledge entries most related to `query`.
///
/// Requires an initialized corpus: when the cache was never initialized or
/// holds no usable embeddings, no query embedding is requested and the result
/// is empty. An unavailable query embedding also yields an empty result.
#[instrument(skip_all, fields(top_k = config.top_k))]
pub async fn retrieve_context(
    corpus: &CorpusCache,
    embedder: &dyn EmbeddingService,
    query: &str,
    config: &RetrievalConfig,
) -> Vec<KnowledgeEntry> {
    let Some(index) = corpus.index() else {
        debug!("Corpus not ready; skipping retrieval");
        return Vec::new();
    };

    let Some(query_embedding) = embed_or_unavailable(embedder, vec![query.to_string()])
        .await
        .and_then(|vectors| vectors.into_iter().next())
    else {
        return Vec::new();
    };

    let entries: Vec<KnowledgeEntry> = scoring::top_k_indices(
        &query_embedding,
        index.embeddings(),
        config.top_k,
        config.similarity_threshold,
    )
    .into_iter()
    .filter_map(|position| index.entries().get(position).cloned())
    .collect();

    info!(retrieved = entries.len(), "Retrieved relevant entries for query");
    entries
}
