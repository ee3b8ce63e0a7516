use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use async_openai::{
    types::{CreateEmbeddingRequestArgs, Embedding},
    Client,
};
use async_trait::async_trait;
use tracing::{debug, error};

use crate::{
    error::AppError,
    utils::config::{AppConfig, EmbeddingBackend},
};

const DEFAULT_HASHED_DIMENSION: usize = 256;

/// Remote (or local) capability turning text into vectors.
///
/// Implementations return exactly one vector per input text, in input order,
/// or an error. Callers that must never fail go through
/// [`embed_or_unavailable`].
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError>;
}

#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: EmbeddingInner,
}

#[derive(Clone)]
enum EmbeddingInner {
    OpenAI {
        client: Arc<Client<async_openai::config::OpenAIConfig>>,
        model: String,
        dimensions: Option<u32>,
    },
    Hashed {
        dimension: usize,
    },
}

impl EmbeddingProvider {
    pub fn backend_label(&self) -> &'static str {
        match self.inner {
            EmbeddingInner::Hashed { .. } => "hashed",
            EmbeddingInner::OpenAI { .. } => "openai",
        }
    }

    pub fn model_code(&self) -> Option<String> {
        match &self.inner {
            EmbeddingInner::OpenAI { model, .. } => Some(model.clone()),
            EmbeddingInner::Hashed { .. } => None,
        }
    }

    pub fn new_openai(
        client: Arc<Client<async_openai::config::OpenAIConfig>>,
        model: String,
        dimensions: Option<u32>,
    ) -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            },
        }
    }

    pub fn new_hashed(dimension: usize) -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::Hashed {
                dimension: dimension.max(1),
            },
        }
    }

    pub fn from_config(
        config: &AppConfig,
        client: Arc<Client<async_openai::config::OpenAIConfig>>,
    ) -> Self {
        match config.embedding_backend {
            EmbeddingBackend::OpenAI => Self::new_openai(
                client,
                config.embedding_model.clone(),
                config.embedding_dimensions,
            ),
            EmbeddingBackend::Hashed => Self::new_hashed(
                config
                    .embedding_dimensions
                    .map_or(DEFAULT_HASHED_DIMENSION, |dims| dims as usize),
            ),
        }
    }
}

#[async_trait]
impl EmbeddingService for EmbeddingProvider {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => Ok(texts
                .iter()
                .map(|text| hashed_embedding(text, *dimension))
                .collect()),
            EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            } => {
                if texts.is_empty() {
                    return Ok(Vec::new());
                }

                let mut args = CreateEmbeddingRequestArgs::default();
                args.model(model.clone()).input(texts);
                if let Some(dimensions) = dimensions {
                    args.dimensions(*dimensions);
                }
                let request = args.build()?;

                let response = client.embeddings().create(request).await?;

                Ok(order_by_index(response.data))
            }
        }
    }
}

/// Embeds `texts`, collapsing every failure into `None`.
///
/// `None` means "embeddings unavailable": the remote call failed, or it
/// answered with a different number of vectors than texts sent.
pub async fn embed_or_unavailable(
    service: &dyn EmbeddingService,
    texts: Vec<String>,
) -> Option<Vec<Vec<f32>>> {
    let expected = texts.len();
    match service.embed_batch(texts).await {
        Ok(vectors) if vectors.len() == expected => {
            debug!(
                count = vectors.len(),
                dimension = vectors.first().map_or(0, Vec::len),
                "Embeddings created"
            );
            Some(vectors)
        }
        Ok(vectors) => {
            error!(
                expected,
                received = vectors.len(),
                "Embedding service returned a mismatched number of vectors"
            );
            None
        }
        Err(err) => {
            error!(error = %err, "Error getting embeddings");
            None
        }
    }
}

// The API tags every vector with the position of its input.
fn order_by_index(mut data: Vec<Embedding>) -> Vec<Vec<f32>> {
    data.sort_by_key(|item| item.index);
    data.into_iter().map(|item| item.embedding).collect()
}

// Helper functions for hashed embeddings
fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dim = dimension.max(1);
    let mut vector = vec![0.0f32; dim];
    if text.is_empty() {
        return vector;
    }

    for token in tokens(text) {
        if let Some(slot) = vector.get_mut(bucket(&token, dim)) {
            *slot += 1.0;
        }
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimension
}
