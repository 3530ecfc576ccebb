//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use guardianly::config::AppConfig;
use guardianly::config::GenerationStrategy;
use guardianly::embeddings::Embedder;
use guardianly::llm::CompletionRequest;
use guardianly::llm::TextGenerator;
use guardianly::models::IndexMatch;
use guardianly::models::VectorMetadata;
use guardianly::models::VectorRecord;
use guardianly::rag::DeterministicGenerator;
use guardianly::rag::ModelBackedGenerator;
use guardianly::rag::RecommendationGenerator;
use guardianly::vector_index::IndexSpec;
use guardianly::vector_index::VectorIndex;
use guardianly::AppServices;
use guardianly::GuardianlyError;
use guardianly::Result;

pub const DIM: usize = 4;

/// Config for in-process runs: memory index, small vectors, no keys
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.embeddings.provider = "ollama".to_string();
    config.embeddings.endpoint = "http://127.0.0.1:11434".to_string();
    config.embeddings.dimension = DIM;
    config.vector_index.backend = "memory".to_string();
    config.retrieval.timeout_secs = 5;
    config
}

/// Deterministic embedder; fails for texts containing `fail_marker`
#[derive(Default)]
pub struct FixedEmbedder {
    pub calls: AtomicUsize,
    pub fail_marker: Option<String>,
}

impl FixedEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(marker: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_marker: Some(marker.to_string()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(GuardianlyError::EmbeddingError("quota exceeded".to_string()));
            }
        }
        let bytes = text.as_bytes();
        Ok(vec![
            1.0,
            (bytes.len() % 11) as f32,
            f32::from(bytes.first().copied().unwrap_or(0) % 13),
            0.5,
        ])
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Embedder that always fails
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(GuardianlyError::EmbeddingError("service unavailable".to_string()))
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Embedder that sleeps before answering like [`FixedEmbedder`]
pub struct SlowEmbedder {
    pub delay: std::time::Duration,
    pub inner: Arc<FixedEmbedder>,
}

impl SlowEmbedder {
    pub fn new(delay: std::time::Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            inner: FixedEmbedder::new(),
        })
    }
}

#[async_trait]
impl Embedder for SlowEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed(text).await
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Index whose every call fails
pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn ensure_index(&self, _spec: &IndexSpec) -> Result<bool> {
        Err(GuardianlyError::IndexError("index unavailable".to_string()))
    }

    async fn upsert(&self, _records: &[VectorRecord]) -> Result<()> {
        Err(GuardianlyError::IndexError("index unavailable".to_string()))
    }

    async fn query(&self, _v: &[f32], _k: usize, _m: bool) -> Result<Vec<IndexMatch>> {
        Err(GuardianlyError::IndexError("index unavailable".to_string()))
    }
}

/// Index returning canned matches and recording query arguments
#[derive(Default)]
pub struct StubIndex {
    pub matches: Vec<IndexMatch>,
    pub queries: Mutex<Vec<(usize, bool)>>,
}

impl StubIndex {
    pub fn with_texts(texts: &[&str]) -> Arc<Self> {
        let matches = texts
            .iter()
            .enumerate()
            .map(|(idx, text)| IndexMatch {
                id: format!("playbook-{idx}"),
                score: 0.9 - idx as f32 * 0.1,
                metadata: Some(VectorMetadata {
                    text: (*text).to_string(),
                    hazard: "road_closure".to_string(),
                    source: format!("playbook-{idx}"),
                }),
            })
            .collect();
        Arc::new(Self {
            matches,
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn ensure_index(&self, _spec: &IndexSpec) -> Result<bool> {
        Ok(false)
    }

    async fn upsert(&self, _records: &[VectorRecord]) -> Result<()> {
        Ok(())
    }

    async fn query(&self, _v: &[f32], top_k: usize, include_metadata: bool) -> Result<Vec<IndexMatch>> {
        self.queries.lock().unwrap().push((top_k, include_metadata));
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}

/// Text generator replaying one fixed output
pub struct ScriptedGenerator {
    pub output: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn replying(output: &str) -> Arc<Self> {
        Arc::new(Self {
            output: Some(output.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            output: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.output
            .clone()
            .ok_or_else(|| GuardianlyError::GenerationError("model unavailable".to_string()))
    }
}

pub fn deterministic() -> Arc<dyn RecommendationGenerator> {
    Arc::new(DeterministicGenerator)
}

pub fn model_backed(generator: Arc<ScriptedGenerator>) -> Arc<dyn RecommendationGenerator> {
    Arc::new(ModelBackedGenerator::new(
        generator,
        0.2,
        400,
        std::time::Duration::from_secs(5),
    ))
}

pub fn services(
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn RecommendationGenerator>,
) -> AppServices {
    let mut config = test_config();
    config.generation.strategy = generator.strategy();
    AppServices::from_parts(&config, embedder, index, generator)
}

pub fn strategy_is(services: &AppServices, strategy: GenerationStrategy) -> bool {
    services.recommendations.generator().strategy() == strategy
}
