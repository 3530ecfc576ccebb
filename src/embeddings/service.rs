//! Embedding service: preprocessing, provider call and dimension check

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::ensure_dimension;
use super::preprocess_text_for_embedding;
use super::Embedder;
use super::EmbeddingConfig;
use crate::errors::Result;

/// Remote-backed [`Embedder`]
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config)?)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let processed = preprocess_text_for_embedding(text)?;
        let embedding = self.client.generate(&processed).await?;
        ensure_dimension(&embedding, self.config.dimension)?;
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
