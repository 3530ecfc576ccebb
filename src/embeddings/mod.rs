//! Embeddings generation module
//!
//! This module turns text into fixed-dimension vectors through a remote
//! embedding service:
//! - OpenAI-compatible `/embeddings` (text-embedding-3-small and friends)
//! - Ollama (local models)
//!
//! Consumers depend on the [`Embedder`] trait so tests and alternative
//! backends can be injected.
//!
//! # Examples
//!
//! ```rust,no_run
//! use guardianly::config::AppConfig;
//! use guardianly::embeddings::Embedder;
//! use guardianly::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed("Road closure detour procedure").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod service;
pub mod text_preprocessing;

use async_trait::async_trait;
pub use cache::CachedEmbedder;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use service::EmbeddingService;
pub use text_preprocessing::preprocess_text_for_embedding;

use crate::errors::GuardianlyError;
use crate::errors::Result;

/// Default embedding dimension for OpenAI text-embedding-3-small
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Converts text into a fixed-dimension vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text; fails with `EmbeddingError` on quota, timeout or bad input
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;
}

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Self> {
        let embeddings = &config.embeddings;
        let provider: EmbeddingProvider = embeddings.provider.parse()?;

        let api_key = Some(embeddings.api_key.trim().to_string()).filter(|key| !key.is_empty());
        if provider == EmbeddingProvider::OpenAI && api_key.is_none() {
            return Err(GuardianlyError::ConfigError(
                "embeddings.api_key (or OPENAI_API_KEY) is required for the openai provider"
                    .to_string(),
            ));
        }

        Ok(Self {
            provider,
            model: embeddings.model.clone(),
            dimension: embeddings.dimension,
            endpoint: embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs: embeddings.timeout_secs,
        })
    }
}

/// Check a returned vector against the expected dimension
pub(crate) fn ensure_dimension(embedding: &[f32], expected: usize) -> Result<()> {
    if embedding.len() == expected {
        Ok(())
    } else {
        Err(GuardianlyError::EmbeddingError(format!(
            "expected {expected}-dimensional embedding, got {}",
            embedding.len()
        )))
    }
}
