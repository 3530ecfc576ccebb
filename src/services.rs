//! Construction of the injectable clients from configuration
//!
//! Remote clients are built once at startup and handed to the loader,
//! retriever and generator; nothing in the core reaches for globals.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::AppConfig;
use crate::config::GenerationStrategy;
use crate::embeddings::CachedEmbedder;
use crate::embeddings::Embedder;
use crate::embeddings::EmbeddingService;
use crate::errors::GuardianlyError;
use crate::errors::Result;
use crate::ingest::PlaybookLoader;
use crate::llm::LlmService;
use crate::rag::DeterministicGenerator;
use crate::rag::ModelBackedGenerator;
use crate::rag::RecommendationGenerator;
use crate::rag::RecommendationService;
use crate::rag::Retriever;
use crate::vector_index::InMemoryIndex;
use crate::vector_index::IndexSpec;
use crate::vector_index::PineconeIndex;
use crate::vector_index::VectorIndex;

/// Fully wired application services
#[derive(Clone)]
pub struct AppServices {
    pub recommendations: Arc<RecommendationService>,
    pub loader: Arc<PlaybookLoader>,
}

impl AppServices {
    /// Build every client named by the configuration
    ///
    /// # Errors
    /// - Unknown provider or backend names
    /// - Missing API keys for remote providers
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let embedder = create_embedder(config)?;
        let index = create_index(config)?;
        let generator = create_generator(config)?;
        Ok(Self::from_parts(config, embedder, index, generator))
    }

    /// Wire services around caller-supplied clients
    pub fn from_parts(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn RecommendationGenerator>,
    ) -> Self {
        let query_embedder: Arc<dyn Embedder> = match config.retrieval.embedding_cache_ttl_secs {
            0 => embedder.clone(),
            ttl => Arc::new(CachedEmbedder::new(
                embedder.clone(),
                Duration::from_secs(ttl),
            )),
        };

        let retriever = Retriever::new(
            query_embedder,
            index.clone(),
            config.top_k(),
            Duration::from_secs(config.retrieval.timeout_secs),
        );
        let loader = PlaybookLoader::new(
            embedder,
            index,
            IndexSpec::cosine(config.index_name(), config.embedding_dimension()),
            config.ingest.concurrency,
        );

        Self {
            recommendations: Arc::new(RecommendationService::new(retriever, generator)),
            loader: Arc::new(loader),
        }
    }
}

pub fn create_embedder(config: &AppConfig) -> Result<Arc<dyn Embedder>> {
    let service = EmbeddingService::new(config)?;
    info!(
        "Embeddings: {:?} {} ({} dims)",
        service.provider(),
        service.model(),
        service.dimension()
    );
    Ok(Arc::new(service))
}

pub fn create_index(config: &AppConfig) -> Result<Arc<dyn VectorIndex>> {
    let backend = config.vector_index.backend.trim().to_lowercase();
    info!("Vector index: {} ({})", config.index_name(), backend);
    match backend.as_str() {
        "pinecone" => Ok(Arc::new(PineconeIndex::new(&config.vector_index)?)),
        "memory" => Ok(Arc::new(InMemoryIndex::new())),
        other => Err(GuardianlyError::ConfigError(format!(
            "unknown vector index backend '{other}' (expected pinecone or memory)"
        ))),
    }
}

pub fn create_generator(config: &AppConfig) -> Result<Arc<dyn RecommendationGenerator>> {
    info!("Generation strategy: {:?}", config.generation_strategy());
    match config.generation_strategy() {
        GenerationStrategy::Deterministic => Ok(Arc::new(DeterministicGenerator)),
        GenerationStrategy::Model => {
            let llm = LlmService::new(config)?;
            Ok(Arc::new(ModelBackedGenerator::new(
                Arc::new(llm),
                config.llm.temperature,
                config.llm.max_tokens,
                Duration::from_secs(config.llm.timeout_secs),
            )))
        }
    }
}
