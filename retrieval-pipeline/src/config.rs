use common::utils::config::AppConfig;
use serde::{Deserialize, Serialize};

/// Tunable parameters for context retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Minimum cosine similarity for an entry to be injected. Disabled when unset.
    pub similarity_threshold: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            similarity_threshold: None,
        }
    }
}

impl RetrievalConfig {
    pub const fn with_top_k(top_k: usize) -> Self {
        Self {
            top_k,
            similarity_threshold: None,
        }
    }
}

impl From<&AppConfig> for RetrievalConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            top_k: config.top_k,
            similarity_threshold: config.similarity_threshold,
        }
    }
}
