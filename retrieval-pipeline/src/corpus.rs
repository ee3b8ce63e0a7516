use std::sync::Arc;

use common::{
    storage::{knowledge_store::KnowledgeStore, types::knowledge_entry::KnowledgeEntry},
    utils::embedding::{embed_or_unavailable, EmbeddingService},
};
use tokio::sync::OnceCell;
use tracing::{error, info, instrument, warn};

/// Knowledge entries with their embeddings, aligned by position.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    entries: Arc<[KnowledgeEntry]>,
    embeddings: Vec<Vec<f32>>,
}

impl CorpusIndex {
    /// Returns `None` unless both collections are non-empty and of equal length.
    pub fn new(entries: Arc<[KnowledgeEntry]>, embeddings: Vec<Vec<f32>>) -> Option<Self> {
        if entries.is_empty() || entries.len() != embeddings.len() {
            return None;
        }
        Some(Self {
            entries,
            embeddings,
        })
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum CorpusState {
    Ready(CorpusIndex),
    /// Initialization ran but produced nothing usable. Never retried.
    Unavailable,
}

/// Corpus embeddings computed at most once per cache.
///
/// An unset cell is the uninitialized state. Concurrent callers of
/// [`CorpusCache::ensure_initialized`] wait on the same initialization.
#[derive(Debug, Default)]
pub struct CorpusCache {
    state: OnceCell<CorpusState>,
}

impl CorpusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&CorpusState> {
        self.state.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    /// The ready index, if initialization succeeded.
    pub fn index(&self) -> Option<&CorpusIndex> {
        match self.state.get() {
            Some(CorpusState::Ready(index)) => Some(index),
            Some(CorpusState::Unavailable) | None => None,
        }
    }

    #[instrument(skip_all)]
    pub async fn ensure_initialized(
        &self,
        store: &KnowledgeStore,
        embedder: &dyn EmbeddingService,
    ) -> &CorpusState {
        self.state
            .get_or_init(|| build_state(store, embedder))
            .await
    }
}

async fn build_state(store: &KnowledgeStore, embedder: &dyn EmbeddingService) -> CorpusState {
    let entries = store.load().await;
    if entries.is_empty() {
        warn!("Knowledge base is empty; retrieval disabled");
        return CorpusState::Unavailable;
    }

    let texts = entries.iter().map(KnowledgeEntry::embedding_text).collect();
    let Some(embeddings) = embed_or_unavailable(embedder, texts).await else {
        error!("Failed to create corpus embeddings");
        return CorpusState::Unavailable;
    };

    match CorpusIndex::new(entries, embeddings) {
        Some(index) => {
            info!(entries = index.len(), "Corpus embeddings initialized");
            CorpusState::Ready(index)
        }
        None => {
            error!("Corpus embeddings are not aligned with knowledge entries");
            CorpusState::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingService for CountingEmbedder {
        async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::InternalError("embedding service down".into()));
            }
            Ok(texts.iter().map(|text| vec![text.len() as f32, 1.0]).collect())
        }
    }

    fn store() -> KnowledgeStore {
        KnowledgeStore::from_entries(vec![
            KnowledgeEntry::new("Role", "Product manager"),
            KnowledgeEntry::new("Skills", "SQL"),
        ])
    }

    #[tokio::test]
    async fn starts_uninitialized() {
        let cache = CorpusCache::new();
        assert!(!cache.is_initialized());
        assert!(cache.state().is_none());
        assert!(cache.index().is_none());
    }

    #[tokio::test]
    async fn initializes_once_and_reuses_embeddings() {
        let cache = CorpusCache::new();
        let embedder = CountingEmbedder::new(false);
        let store = store();

        cache.ensure_initialized(&store, &embedder).await;
        cache.ensure_initialized(&store, &embedder).await;

        assert_eq!(embedder.calls(), 1);
        let index = cache.index().expect("corpus should be ready");
        assert_eq!(index.len(), 2);
        assert_eq!(index.embeddings().len(), index.entries().len());
    }

    #[tokio::test]
    async fn concurrent_initialization_embeds_once() {
        let cache = CorpusCache::new();
        let embedder = CountingEmbedder::new(false);
        let store = store();

        tokio::join!(
            cache.ensure_initialized(&store, &embedder),
            cache.ensure_initialized(&store, &embedder)
        );

        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn failed_embedding_is_not_retried() {
        let cache = CorpusCache::new();
        let embedder = CountingEmbedder::new(true);
        let store = store();

        let state = cache.ensure_initialized(&store, &embedder).await;
        assert!(matches!(state, CorpusState::Unavailable));

        cache.ensure_initialized(&store, &embedder).await;
        assert_eq!(embedder.calls(), 1);
        assert!(cache.is_initialized());
        assert!(cache.index().is_none());
    }

    #[tokio::test]
    async fn empty_knowledge_base_skips_embedding() {
        let cache = CorpusCache::new();
        let embedder = CountingEmbedder::new(false);
        let store = KnowledgeStore::from_entries(Vec::new());

        let state = cache.ensure_initialized(&store, &embedder).await;

        assert!(matches!(state, CorpusState::Unavailable));
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn index_rejects_misaligned_collections() {
        let entries: Arc<[KnowledgeEntry]> = vec![
            KnowledgeEntry::new("Role", "Product manager"),
            KnowledgeEntry::new("Skills", "SQL"),
        ]
        .into();

        assert!(CorpusIndex::new(Arc::clone(&entries), vec![vec![1.0]]).is_none());
        assert!(CorpusIndex::new(Arc::from(Vec::new()), Vec::new()).is_none());
        assert!(CorpusIndex::new(entries, vec![vec![1.0], vec![2.0]]).is_some());
    }
}
