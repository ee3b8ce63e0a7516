use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use common::{
    storage::knowledge_store::KnowledgeStore,
    utils::{
        config::AppConfig,
        embedding::{EmbeddingProvider, EmbeddingService},
    },
};
use retrieval_pipeline::{
    ChatCompletionService, CorpusCache, GenerationSettings, ResponseGenerator, RetrievalConfig,
};

/// Everything a warm handler process keeps between invocations.
pub struct HandlerState {
    pub knowledge: KnowledgeStore,
    pub corpus: CorpusCache,
    pub embedder: Arc<dyn EmbeddingService>,
    pub generator: ResponseGenerator,
    pub retrieval: RetrievalConfig,
    pub max_message_chars: usize,
}

impl HandlerState {
    pub fn new(config: &AppConfig) -> Self {
        let openai_client = Arc::new(Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));
        let embedder = Arc::new(EmbeddingProvider::from_config(
            config,
            Arc::clone(&openai_client),
        ));

        Self::with_services(
            KnowledgeStore::from_path(&config.knowledge_path),
            embedder,
            openai_client,
            config,
        )
    }

    pub fn with_services(
        knowledge: KnowledgeStore,
        embedder: Arc<dyn EmbeddingService>,
        completion: Arc<dyn ChatCompletionService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            knowledge,
            corpus: CorpusCache::new(),
            embedder,
            generator: ResponseGenerator::new(completion, GenerationSettings::from(config)),
            retrieval: RetrievalConfig::from(config),
            max_message_chars: config.max_message_chars,
        }
    }
}
