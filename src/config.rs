use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::GuardianlyError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// `openai` or `ollama`
    #[serde(default = "default_openai_provider")]
    pub provider: String,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    /// `pinecone` or `memory`
    #[serde(default = "default_index_backend")]
    pub backend: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_control_plane_url")]
    pub control_plane_url: String,
    /// Data-plane host; resolved from the control plane when absent
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_cloud")]
    pub cloud: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `openai` or `ollama`
    #[serde(default = "default_openai_provider")]
    pub provider: String,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Matches joined into the context; the service contract is 2, larger
    /// values are an operator extension
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_retrieval_timeout_secs")]
    pub timeout_secs: u64,
    /// Query-embedding cache lifetime; 0 disables the cache
    #[serde(default)]
    pub embedding_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// Canned recommendation per hazard, no remote call
    Deterministic,
    /// Remote model constrained to JSON output, validated, with fallback
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_strategy")]
    pub strategy: GenerationStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_playbook_pattern")]
    pub playbook_pattern: String,
    #[serde(default = "default_ingest_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors: bool,
    /// Upper bound on a whole HTTP request, including ingestion
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_openai_provider() -> String {
    "openai".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

pub(crate) fn default_embedding_dimension() -> usize {
    crate::embeddings::DEFAULT_EMBEDDING_DIM
}

fn default_remote_timeout_secs() -> u64 {
    30
}

fn default_index_backend() -> String {
    "pinecone".to_string()
}

fn default_index_name() -> String {
    "guardianly-playbooks".to_string()
}

fn default_control_plane_url() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

pub(crate) fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> usize {
    400
}

fn default_llm_timeout_secs() -> u64 {
    20
}

pub(crate) fn default_top_k() -> usize {
    2
}

fn default_retrieval_timeout_secs() -> u64 {
    10
}

fn default_strategy() -> GenerationStrategy {
    GenerationStrategy::Deterministic
}

pub(crate) fn default_playbook_pattern() -> String {
    "mock_playbook_*.txt".to_string()
}

fn default_ingest_concurrency() -> usize {
    4
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub vector_index: VectorIndexConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default config file path
    pub fn load() -> crate::Result<Self> {
        // Try config.toml first, then config.example.toml, then built-in defaults
        let mut config = if Path::new("config.toml").exists() {
            Self::from_file("config.toml")?
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")?
        } else {
            tracing::warn!("No config file found, using built-in defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, then apply env overrides and validate
    pub fn load_from<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Fill secrets left empty in the file from the environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if self.embeddings.api_key.is_empty() {
            if let Some(key) = non_empty("OPENAI_API_KEY") {
                self.embeddings.api_key = key;
            }
        }
        if self.llm.api_key.is_empty() {
            if let Some(key) = non_empty("GUARDIANLY_LLM_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
                self.llm.api_key = key;
            }
        }
        if self.vector_index.api_key.is_empty() {
            if let Some(key) = non_empty("PINECONE_API_KEY") {
                self.vector_index.api_key = key;
            }
        }
        if let Some(level) = non_empty("GUARDIANLY_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.embeddings.dimension == 0 {
            return Err(GuardianlyError::ConfigError(
                "embeddings.dimension must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(GuardianlyError::ConfigError(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(GuardianlyError::ConfigError(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }
        if self.ingest.concurrency == 0 {
            return Err(GuardianlyError::ConfigError(
                "ingest.concurrency must be greater than zero".to_string(),
            ));
        }

        validate_http_url("embeddings.endpoint", &self.embeddings.endpoint)?;
        validate_http_url("llm.endpoint", &self.llm.endpoint)?;
        if self.vector_index.backend == "pinecone" {
            validate_http_url(
                "vector_index.control_plane_url",
                &self.vector_index.control_plane_url,
            )?;
        }

        Ok(())
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get vector index name
    pub fn index_name(&self) -> &str {
        &self.vector_index.index_name
    }

    /// Get retrieval top-k
    pub fn top_k(&self) -> usize {
        self.retrieval.top_k
    }

    /// Get configured generation strategy
    pub fn generation_strategy(&self) -> GenerationStrategy {
        self.generation.strategy
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.model
    }
}

fn validate_http_url(field: &str, value: &str) -> crate::Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| GuardianlyError::ConfigError(format!("{field} is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(GuardianlyError::ConfigError(format!(
            "{field} must use http or https, got {other}"
        ))),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
            embeddings: EmbeddingsConfig {
                provider: default_openai_provider(),
                endpoint: default_openai_endpoint(),
                api_key: String::new(),
                model: default_embedding_model(),
                dimension: default_embedding_dimension(),
                timeout_secs: default_remote_timeout_secs(),
            },
            vector_index: VectorIndexConfig {
                backend: default_index_backend(),
                index_name: default_index_name(),
                api_key: String::new(),
                control_plane_url: default_control_plane_url(),
                host: None,
                cloud: default_cloud(),
                region: default_region(),
                timeout_secs: default_remote_timeout_secs(),
            },
            llm: LlmConfig {
                provider: default_openai_provider(),
                endpoint: default_openai_endpoint(),
                api_key: String::new(),
                model: default_llm_model(),
                temperature: default_temperature(),
                max_tokens: default_max_tokens(),
                timeout_secs: default_llm_timeout_secs(),
            },
            retrieval: RetrievalConfig {
                top_k: default_top_k(),
                timeout_secs: default_retrieval_timeout_secs(),
                embedding_cache_ttl_secs: 0,
            },
            generation: GenerationConfig {
                strategy: default_strategy(),
            },
            ingest: IngestConfig {
                playbook_pattern: default_playbook_pattern(),
                concurrency: default_ingest_concurrency(),
            },
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                cors: false,
                request_timeout_secs: default_request_timeout_secs(),
            },
        }
    }
}
